//! Runs transformed fragments in the engine.

use std::path::Path;

use boa_engine::builtins::promise::PromiseState;
use boa_engine::object::builtins::JsPromise;
use boa_engine::{Context, JsValue, Source};
use jsrepl_transform::Transformed;

use crate::error::{EvalError, EvalResult};
use crate::store::Store;

/// The immediate result of running a fragment.
#[derive(Debug, Clone)]
pub enum Completion {
    /// A synchronous fragment's completion value.
    Ready(JsValue),
    /// An async fragment's completion, once its promise settles.
    Pending(JsPromise),
}

impl Completion {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Compile `transformed` into a function over the scope parameter and call
/// it with the store object.
///
/// `referrer` is the script path dynamic imports resolve relative
/// specifiers against.
pub(crate) fn execute(
    transformed: &Transformed,
    store: &Store,
    referrer: &Path,
    context: &mut Context,
) -> EvalResult<Completion> {
    let source = format!(
        "(function ({}) {{{}\n}})",
        transformed.scope_name, transformed.code
    );
    let function = context
        .eval(Source::from_bytes(source.as_bytes()).with_path(referrer))
        .map_err(|e| EvalError::thrown(e, context))?;
    let function = function
        .as_callable()
        .ok_or_else(|| EvalError::Internal("fragment wrapper is not callable".into()))?
        .clone();

    let scope = JsValue::from(store.object().clone());
    let result = function
        .call(&JsValue::undefined(), &[scope], context)
        .map_err(|e| EvalError::thrown(e, context))?;

    if !transformed.is_async {
        return Ok(Completion::Ready(result));
    }
    let promise = result
        .as_object()
        .cloned()
        .ok_or_else(|| EvalError::Internal("async fragment returned no promise".into()))
        .and_then(|object| {
            JsPromise::from_object(object).map_err(|e| EvalError::thrown(e, context))
        })?;
    Ok(Completion::Pending(promise))
}

/// Drive the job queue until `completion` has a value.
pub(crate) fn settle(completion: Completion, context: &mut Context) -> EvalResult<JsValue> {
    let promise = match completion {
        Completion::Ready(value) => return Ok(value),
        Completion::Pending(promise) => promise,
    };
    context.run_jobs();
    match promise.state() {
        PromiseState::Fulfilled(value) => Ok(value),
        PromiseState::Rejected(reason) => Err(EvalError::rejected(reason)),
        PromiseState::Pending => {
            log::warn!("fragment promise still pending after the job queue drained");
            Err(EvalError::Stalled)
        }
    }
}
