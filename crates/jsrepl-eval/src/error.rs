//! Evaluator error types.

use boa_engine::{Context, JsError, JsValue};
use jsrepl_types::TransformError;
use thiserror::Error;

/// Errors that can occur while evaluating a console fragment.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The fragment was rejected before anything ran.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The fragment threw, or its promise rejected.
    #[error("Uncaught {message}")]
    Evaluation {
        /// The thrown value, unmodified.
        value: JsValue,
        message: String,
    },

    /// A pending completion can never settle: the job queue is empty.
    #[error("fragment never settled: its promise is pending with no jobs left to run")]
    Stalled,

    /// The engine context could not be built.
    #[error("failed to set up the engine: {0}")]
    Setup(String),

    /// The engine handed back something the evaluator did not produce.
    #[error("internal evaluator error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Wrap an engine exception, keeping the thrown value.
    pub(crate) fn thrown(err: JsError, context: &mut Context) -> Self {
        let value = err.to_opaque(context);
        Self::rejected(value)
    }

    /// Wrap a thrown or rejected value.
    pub(crate) fn rejected(value: JsValue) -> Self {
        let message = value.display().to_string();
        Self::Evaluation { value, message }
    }

    /// The thrown value, for evaluation failures.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Self::Evaluation { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Evaluator result type alias.
pub type EvalResult<T> = Result<T, EvalError>;
