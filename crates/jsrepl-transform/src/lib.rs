//! jsrepl fragment transform: console input text to an executable function body.
//!
//! # Pipeline
//!
//! ```text
//! fragment → lower → hoist → redirect → function body over the scope object
//! ```
//!
//! 1. [`lower`] rewrites static imports into dynamic ones and top-level
//!    classes into `let` bindings, and decides whether the fragment is async.
//! 2. [`hoist`] turns top-level declarations (and `var` anywhere outside
//!    functions) into assignments, reporting the declared names.
//! 3. [`redirect`] routes free references to persistent names through the
//!    scope parameter and captures the completion value.
//!
//! Each stage parses its input with oxc, analyses the tree, and emits its
//! output by splicing span-anchored edits into the input text. Only the
//! first stage sees user text: a parse failure anywhere later is reported as
//! an internal error, never as a syntax error.
//!
//! The produced body is meant to be wrapped as
//! `(function (<scope_name>) { <code> })` and called with the binding store.

mod hoist;
mod lower;
mod names;
mod parse;
mod patch;
mod redirect;
mod scope;

use std::collections::BTreeSet;

use jsrepl_types::{Span, TransformError, TransformResult};
use serde::{Deserialize, Serialize};

pub use hoist::{hoist, Hoisted};
pub use lower::{lower, Lowered, FRAGMENT_PREFIX};
pub use redirect::{redirect, Redirected};

// ══════════════════════════════════════════════════════════════════════════════
// Pipeline
// ══════════════════════════════════════════════════════════════════════════════

/// A fragment ready to execute against the binding store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformed {
    /// Function body taking the binding store as its only parameter.
    pub code: String,
    /// Name of that parameter.
    pub scope_name: String,
    /// Name of the local holding the completion value.
    pub completion_name: String,
    /// The body returns a promise of the completion value.
    pub is_async: bool,
    /// Names the fragment declares; they must exist in the store before the
    /// body runs.
    pub declared: Vec<String>,
    /// Imports whose attributes are forwarded as the `import()` options
    /// argument. Hosts without that argument must reject the fragment.
    pub attributed_imports: Vec<Span>,
}

/// Transform one console fragment.
///
/// `persistent` holds the names already in the binding store. References to
/// those names, and to everything the fragment itself declares, are routed
/// through the store.
pub fn transform(source: &str, persistent: &BTreeSet<String>) -> TransformResult<Transformed> {
    let lowered = lower(source)?;
    let hoisted = hoist(&lowered.code).map_err(|e| e.at_stage("hoist"))?;

    let mut keys = persistent.clone();
    keys.extend(hoisted.declared.iter().cloned());
    let redirected = redirect(&hoisted.code, &keys, &hoisted.discarded, lowered.is_async)
        .map_err(|e| e.at_stage("redirect"))?;

    log::debug!(
        "transformed fragment: {} declared, async: {}, scope `{}`",
        hoisted.declared.len(),
        lowered.is_async,
        redirected.scope_name
    );
    log::trace!("transformed body:\n{}", redirected.code);

    Ok(Transformed {
        code: redirected.code,
        scope_name: redirected.scope_name,
        completion_name: redirected.completion_name,
        is_async: lowered.is_async,
        declared: hoisted.declared,
        attributed_imports: lowered.attributed_imports,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Structured result
// ══════════════════════════════════════════════════════════════════════════════

/// Serializable outcome of [`transform`], for hosts that talk JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformReport {
    pub success: bool,
    pub transformed: Option<Transformed>,
    pub error: Option<TransformError>,
    /// Human-readable form of `error`.
    pub message: Option<String>,
}

/// Run [`transform`] and capture the outcome as a [`TransformReport`].
pub fn transform_to_report(source: &str, persistent: &BTreeSet<String>) -> TransformReport {
    match transform(source, persistent) {
        Ok(transformed) => TransformReport {
            success: true,
            transformed: Some(transformed),
            error: None,
            message: None,
        },
        Err(err) => TransformReport {
            success: false,
            transformed: None,
            message: Some(err.to_string()),
            error: Some(err),
        },
    }
}
