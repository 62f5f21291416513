//! jsrepl fragment transform as a WASM module for browser environments.
//!
//! The browser keeps the binding store itself and runs the generated body
//! with its own `Function` constructor; this crate only rewrites fragments.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { transform } from 'jsrepl-wasm';
//!
//! await init();
//!
//! const store = Object.create(null);
//! const report = JSON.parse(transform("let a = 1; a + 1", JSON.stringify(Object.keys(store))));
//! if (report.success) {
//!   const { code, scopeName, declared } = report.transformed;
//!   for (const name of declared) if (!(name in store)) store[name] = undefined;
//!   const result = new Function(scopeName, code)(store);
//! }
//! ```

use std::collections::BTreeSet;

use jsrepl_transform::{transform_to_report, TransformReport};
use wasm_bindgen::prelude::*;

/// Transform a console fragment against the names already in the store.
///
/// `keys_json` is a JSON array of store names. Returns a JSON string
/// containing a `TransformReport`:
/// ```json
/// {
///   "success": true,
///   "transformed": { "code": "...", "scopeName": "_scope", "completionName": "_completion",
///                    "isAsync": false, "declared": ["a"], "attributedImports": [] },
///   "error": null,
///   "message": null
/// }
/// ```
///
/// On failure, `success` is `false`, `transformed` is `null`, and `error`
/// holds the structured error.
#[wasm_bindgen]
pub fn transform(source: &str, keys_json: &str) -> String {
    let report = match serde_json::from_str::<BTreeSet<String>>(keys_json) {
        Ok(keys) => transform_to_report(source, &keys),
        Err(e) => TransformReport {
            success: false,
            transformed: None,
            error: None,
            message: Some(format!("invalid store keys: {e}")),
        },
    };
    serde_json::to_string(&report).unwrap_or_else(|e| {
        format!(
            r#"{{"success":false,"transformed":null,"error":null,"message":"Serialization error: {}"}}"#,
            e
        )
    })
}

/// Return the transform version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
