//! Native stand-ins for the math and diagram engines.

use async_trait::async_trait;
use axiom_render::{
    DiagramConfig, DiagramEngine, DiagramError, Element, JobId, MathEngine, MathError,
    MathOptions, RenderedDiagram, escape_html,
};
use core::fmt::Write as _;
use std::sync::OnceLock;

const SYMBOLS: &[(&str, &str)] = &[
    ("\\Rightarrow", "⇒"),
    ("\\rightarrow", "→"),
    ("\\Leftrightarrow", "⇔"),
    ("\\leftrightarrow", "↔"),
    ("\\forall", "∀"),
    ("\\exists", "∃"),
    ("\\neg", "¬"),
    ("\\land", "∧"),
    ("\\lor", "∨"),
    ("\\leq", "≤"),
    ("\\geq", "≥"),
    ("\\neq", "≠"),
    ("\\in", "∈"),
    ("\\infty", "∞"),
    ("\\cdot", "·"),
    ("\\sqrt", "√"),
    ("\\sum", "∑"),
];

/// Arguments of `\mathbb`.
const BLACKBOARD: &[(&str, &str)] = &[("{N}", "ℕ"), ("{Z}", "ℤ"), ("{Q}", "ℚ"), ("{R}", "ℝ")];

/// Writes expressions with common TeX commands replaced by Unicode symbols.
#[derive(Debug, Default)]
pub struct PlainMathEngine;

impl PlainMathEngine {
    fn check(expression: &str) -> Result<(), MathError> {
        let mut depth = 0usize;
        for ch in expression.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| MathError::Parse("unmatched '}'".into()))?;
                }
                _ => {}
            }
        }
        if depth > 0 {
            return Err(MathError::Parse("expected '}' before end of input".into()));
        }
        Ok(())
    }

    /// Replaces whole commands only, so `\in` leaves `\int` alone.
    fn symbolize(expression: &str) -> String {
        let mut out = String::with_capacity(expression.len());
        let mut rest = expression;
        while let Some(at) = rest.find('\\') {
            out.push_str(&rest[..at]);
            let tail = &rest[at..];
            let name_len = tail[1..]
                .find(|ch: char| !ch.is_ascii_alphabetic())
                .unwrap_or(tail.len() - 1);
            let command = &tail[..=name_len];
            let after = &tail[command.len()..];

            if command == "\\mathbb"
                && let Some((arg, symbol)) =
                    BLACKBOARD.iter().find(|(arg, _)| after.starts_with(arg))
            {
                out.push_str(symbol);
                rest = &after[arg.len()..];
                continue;
            }
            match SYMBOLS.iter().find(|(known, _)| *known == command) {
                Some((_, symbol)) => out.push_str(symbol),
                None => out.push_str(command),
            }
            rest = after;
        }
        out.push_str(rest);
        out
    }
}

impl MathEngine for PlainMathEngine {
    fn render(
        &self,
        expression: &str,
        target: &mut Element,
        options: &MathOptions,
    ) -> Result<(), MathError> {
        if let Err(err) = Self::check(expression) {
            if options.throw_on_error {
                return Err(err);
            }
            target.set_markup(format!(
                "<code class=\"math-parse-error\" title=\"{}\">{}</code>",
                escape_html(&err.to_string()),
                escape_html(expression)
            ));
            return Ok(());
        }

        let tag = if options.display_mode { "div" } else { "span" };
        let mode = if options.display_mode { "display" } else { "inline" };
        target.set_markup(format!(
            "<{tag} class=\"math math-{mode}\">{}</{tag}>",
            escape_html(&Self::symbolize(expression))
        ));
        Ok(())
    }
}

/// Lays out `graph`/`flowchart` edge lists as a vertical chain of boxes.
#[derive(Debug, Default)]
pub struct FlowchartEngine {
    config: OnceLock<DiagramConfig>,
}

impl FlowchartEngine {
    /// Creates the engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn nodes(source: &str) -> Result<Vec<String>, DiagramError> {
        let mut statements = source
            .split([';', '\n'])
            .map(str::trim)
            .filter(|statement| !statement.is_empty());

        let header = statements.next().unwrap_or_default();
        if !(header.starts_with("graph") || header.starts_with("flowchart")) {
            return Err(DiagramError::Syntax(format!(
                "expected 'graph' or 'flowchart', found '{header}'"
            )));
        }

        let mut nodes: Vec<String> = Vec::new();
        for statement in statements {
            for node in statement.split("-->").map(str::trim) {
                if node.is_empty() {
                    return Err(DiagramError::Syntax(format!(
                        "dangling edge in '{statement}'"
                    )));
                }
                if !nodes.iter().any(|known| known == node) {
                    nodes.push(node.to_string());
                }
            }
        }
        Ok(nodes)
    }
}

#[async_trait]
impl DiagramEngine for FlowchartEngine {
    fn initialize(&self, config: &DiagramConfig) {
        let _ = self.config.set(config.clone());
    }

    async fn render(&self, job: &JobId, source: &str) -> Result<RenderedDiagram, DiagramError> {
        let nodes = Self::nodes(source)?;
        let theme = self
            .config
            .get()
            .map_or("default", |config| config.theme.as_str());

        let height = nodes.len().max(1) * 60;
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg id=\"{job}\" class=\"flowchart theme-{}\" xmlns=\"http://www.w3.org/2000/svg\" width=\"220\" height=\"{height}\">",
            escape_html(theme)
        );
        for (index, node) in nodes.iter().enumerate() {
            let y = index * 60 + 10;
            if index > 0 {
                let _ = write!(
                    svg,
                    "<line x1=\"110\" y1=\"{}\" x2=\"110\" y2=\"{y}\" stroke=\"currentColor\"/>",
                    y - 20
                );
            }
            let _ = write!(
                svg,
                "<rect x=\"10\" y=\"{y}\" width=\"200\" height=\"40\" rx=\"6\" fill=\"none\" stroke=\"currentColor\"/><text x=\"110\" y=\"{}\" text-anchor=\"middle\">{}</text>",
                y + 25,
                escape_html(node)
            );
        }
        svg.push_str("</svg>");
        Ok(RenderedDiagram { svg })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(display_mode: bool) -> MathOptions {
        MathOptions {
            display_mode,
            throw_on_error: false,
        }
    }

    #[test]
    fn inline_expression_uses_symbols() {
        let mut target = Element::new();
        PlainMathEngine
            .render("P(x) \\rightarrow Q(x)", &mut target, &options(false))
            .unwrap();
        assert_eq!(
            target.markup(),
            "<span class=\"math math-inline\">P(x) → Q(x)</span>"
        );
    }

    #[test]
    fn symbols_match_whole_commands() {
        assert_eq!(
            PlainMathEngine::symbolize("n \\in \\mathbb{N}, \\int_0^\\infty f"),
            "n ∈ ℕ, \\int_0^∞ f"
        );
        assert_eq!(PlainMathEngine::symbolize("\\inf S \\leq x"), "\\inf S ≤ x");
        assert_eq!(PlainMathEngine::symbolize("a \\, b \\"), "a \\, b \\");
    }

    #[test]
    fn malformed_expression_renders_in_band() {
        let mut target = Element::new();
        PlainMathEngine
            .render("\\frac{1", &mut target, &options(true))
            .unwrap();
        assert!(target.markup().contains("math-parse-error"));
    }

    #[tokio::test]
    async fn flowchart_lists_nodes_once() {
        let engine = FlowchartEngine::new();
        let job = JobId::next();
        let diagram = engine
            .render(&job, "graph TD; A-->B; B-->C; A-->C")
            .await
            .unwrap();
        assert_eq!(diagram.svg.matches("<rect").count(), 3);
        assert!(diagram.svg.contains(job.as_str()));
    }

    #[tokio::test]
    async fn flowchart_rejects_missing_header() {
        let engine = FlowchartEngine::new();
        let err = engine.render(&JobId::next(), "A-->B").await.unwrap_err();
        assert!(matches!(err, DiagramError::Syntax(_)));
    }
}
