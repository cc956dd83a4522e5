//! Render targets and markup helpers.

use core::fmt::Write as _;

/// An owned render target.
///
/// Holds the markup an engine wrote for one adapter. Each adapter owns its
/// element for its whole lifetime; engines only ever see it mutably for the
/// duration of a render call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    markup: String,
}

impl Element {
    /// Creates an empty element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current markup.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
    }

    /// Replaces the content with trusted markup.
    pub fn set_markup(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
    }

    /// Appends trusted markup.
    pub fn push_markup(&mut self, markup: &str) {
        self.markup.push_str(markup);
    }

    /// Replaces the content with escaped text.
    pub fn set_text(&mut self, text: &str) {
        self.markup.clear();
        escape_into(&mut self.markup, text);
    }

    /// Removes all content.
    pub fn clear(&mut self) {
        self.markup.clear();
    }
}

/// Escapes `text` for use in HTML content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Writes `<tag class="class">escaped text</tag>` into `out`.
pub(crate) fn write_text_element(out: &mut String, tag: &str, class: &str, text: &str) {
    let _ = write!(out, "<{tag} class=\"{class}\">");
    escape_into(out, text);
    let _ = write!(out, "</{tag}>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn set_text_replaces_content() {
        let mut element = Element::new();
        element.set_markup("<b>old</b>");
        element.set_text("x < y");
        assert_eq!(element.markup(), "x &lt; y");
    }

    #[test]
    fn text_element_is_escaped() {
        let mut out = String::new();
        write_text_element(&mut out, "span", "math-error", "missing }");
        assert_eq!(out, "<span class=\"math-error\">missing }</span>");
    }
}
