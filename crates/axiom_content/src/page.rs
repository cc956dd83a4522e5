//! Static content of a technique page.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One worked example on a technique page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedExample {
    /// Example heading.
    pub title: String,
    /// Prose introducing the example.
    pub description: String,
    /// The proof, as a math expression rendered in display mode.
    pub proof: String,
}

/// An illustrative image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// Image locator.
    pub src: String,
    /// Alternative text.
    #[serde(default)]
    pub alt: String,
}

/// A page presenting one proof technique.
///
/// # Example
///
/// ```
/// use axiom_content::TechniquePage;
///
/// let page = TechniquePage::from_json_str(r#"{
///     "title": "Proof by Contrapositive",
///     "description": "Prove not-Q implies not-P.",
///     "steps": ["Negate the conclusion", "Derive the negated hypothesis"],
///     "examples": [],
///     "diagram": "graph TD; NotQ-->NotP"
/// }"#)?;
/// assert_eq!(page.steps.len(), 2);
/// assert!(page.image.is_none());
/// # Ok::<(), axiom_content::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniquePage {
    /// Page heading.
    pub title: String,
    /// Introductory prose.
    pub description: String,
    /// Ordered steps of the technique.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Worked examples.
    #[serde(default)]
    pub examples: Vec<WorkedExample>,
    /// Flow diagram source.
    #[serde(default)]
    pub diagram: Option<String>,
    /// Illustrative image.
    #[serde(default)]
    pub image: Option<PageImage>,
}

impl TechniquePage {
    /// Parses one page from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the text is not a valid page.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a list of pages from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the text is not a valid page list.
    pub fn list_from_json_str(json: &str) -> Result<Vec<Self>, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a list of pages from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it is not a valid page list.
    pub fn list_from_path(path: impl AsRef<Path>) -> Result<Vec<Self>, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::list_from_json_str(&json)
    }

    /// Returns the diagram source if it is present and not blank.
    #[must_use]
    pub fn diagram_source(&self) -> Option<&str> {
        self.diagram
            .as_deref()
            .filter(|source| !source.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_sections_default_to_empty() {
        let page =
            TechniquePage::from_json_str(r#"{ "title": "Direct Proof", "description": "" }"#)
                .unwrap();
        assert!(page.steps.is_empty());
        assert!(page.examples.is_empty());
        assert!(page.diagram_source().is_none());
    }

    #[test]
    fn blank_diagram_is_treated_as_absent() {
        let page = TechniquePage::from_json_str(
            r#"{ "title": "Cases", "description": "", "diagram": "  \n" }"#,
        )
        .unwrap();
        assert!(page.diagram.is_some());
        assert!(page.diagram_source().is_none());
    }

    #[test]
    fn list_parses_examples_and_image() {
        let pages = TechniquePage::list_from_json_str(
            r#"[{
                "title": "Induction",
                "description": "Base case and step.",
                "examples": [{ "title": "Sum", "description": "Gauss", "proof": "\\sum_{i=1}^n i = \\frac{n(n+1)}{2}" }],
                "image": { "src": "/img/dominoes.png", "alt": "Falling dominoes" }
            }]"#,
        )
        .unwrap();
        assert_eq!(pages[0].examples[0].title, "Sum");
        assert_eq!(pages[0].image.as_ref().unwrap().alt, "Falling dominoes");
    }
}
