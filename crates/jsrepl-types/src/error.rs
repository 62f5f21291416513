use crate::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fragment text could not be parsed.
///
/// Carries every diagnostic the parser produced, in source order. The
/// console shows these verbatim; they are never recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("SyntaxError: {}", .messages.join("; "))]
pub struct ParseError {
    pub messages: Vec<String>,
}

impl ParseError {
    /// Create a parse error from parser diagnostics.
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

/// Errors produced while turning one fragment into executable code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformError {
    /// The fragment is not valid module syntax.
    #[error(transparent)]
    Parse(ParseError),

    /// Valid module syntax that has no meaning in a console fragment.
    #[error("{span}: {construct} is not supported in the console")]
    Unsupported { construct: String, span: Span },

    /// A pipeline stage broke one of its own guarantees.
    #[error("internal transform error: {message}")]
    Invariant { message: String },
}

impl TransformError {
    /// Create an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Re-classify a failure reported by a stage that consumed generated text.
    ///
    /// A later stage only ever parses what an earlier stage produced, so a
    /// parse failure there is a defect in the earlier stage rather than bad
    /// user input.
    pub fn at_stage(self, stage: &str) -> Self {
        match self {
            Self::Parse(err) => Self::invariant(format!(
                "{stage} received unparsable code: {}",
                err.messages.join("; ")
            )),
            other => other,
        }
    }
}

impl From<ParseError> for TransformError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}
