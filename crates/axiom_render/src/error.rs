//! Error types for engine installation and rendering.

/// Errors raised by a math engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    /// The expression could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The engine failed for another reason.
    #[error("math engine error: {0}")]
    Engine(String),
}

/// Errors raised by a diagram engine or the diagram adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    /// The diagram source could not be parsed.
    #[error("syntax error in diagram: {0}")]
    Syntax(String),

    /// The engine failed for another reason.
    #[error("diagram engine error: {0}")]
    Engine(String),

    /// A render was requested outside a Tokio runtime.
    #[error("diagram rendering requires a Tokio runtime")]
    NoRuntime,
}

/// Errors raised when installing a shared engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The slot already holds an engine. Engines are configured exactly once.
    #[error("{engine} engine is already installed")]
    AlreadyInstalled {
        /// Name of the slot.
        engine: &'static str,
    },
}
