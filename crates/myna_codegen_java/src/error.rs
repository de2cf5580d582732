use myna_ast::Span;
use thiserror::Error;

/// Error variants produced while rendering a resolved tree as Java source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodeGenError {
    /// The resolved tree contains a construct with no defined rewrite.
    /// Fatal to the current unit; other units are unaffected.
    #[error("Unsupported construct: {construct}")]
    UnsupportedConstruct {
        construct: String,
        span: Option<Span>,
    },

    /// The resolver/generator contract was violated: a reference resolved to
    /// an unexpected kind, or a required child is absent.
    #[error("Internal consistency error: {message}")]
    InternalInconsistency {
        message: String,
        span: Option<Span>,
    },

    #[error("Type generation error: {message}")]
    TypeGenerationError { message: String },
}

/// Non-fatal note recorded when generation falls back to the dynamic
/// property/binding protocol instead of a direct member access.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionCaveat {
    pub message: String,
    pub span: Option<Span>,
}
