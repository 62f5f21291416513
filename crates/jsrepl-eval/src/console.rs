//! Console capture.
//!
//! The session replaces `globalThis.console` with an object whose methods
//! push `[method, args]` pairs into a buffer inside the engine. After each
//! fragment the session drains the buffer into log entries.

use boa_engine::object::builtins::JsArray;
use boa_engine::{Context, JsObject, JsValue, Source};
use jsrepl_types::LogKind;

use crate::entry::LogEntry;
use crate::error::{EvalError, EvalResult};

/// Installs the capturing console and evaluates to its drain function.
const INSTALL_CONSOLE: &str = r#"(() => {
  const buffer = [];
  const record = (method) => (...args) => { buffer.push([method, args]); };
  globalThis.console = {
    log: record("log"),
    info: record("info"),
    warn: record("warn"),
    error: record("error"),
    debug: record("debug"),
    dir: record("dir"),
    trace: record("trace"),
    assert: (condition, ...args) => {
      if (!condition) buffer.push(["assert", ["Assertion failed:", ...args]]);
    },
    clear: () => {},
  };
  return () => buffer.splice(0);
})()"#;

/// Handle on the installed console's buffer.
#[derive(Debug, Clone)]
pub(crate) struct Console {
    drain: JsObject,
}

impl Console {
    pub fn install(context: &mut Context) -> EvalResult<Self> {
        let drain = context
            .eval(Source::from_bytes(INSTALL_CONSOLE.as_bytes()))
            .map_err(|e| EvalError::Setup(format!("console capture: {e}")))?;
        let drain = drain
            .as_callable()
            .cloned()
            .ok_or_else(|| EvalError::Setup("console capture returned no drain function".into()))?;
        log::debug!("installed console capture");
        Ok(Self { drain })
    }

    /// Take every message recorded since the last drain.
    pub fn drain(&self, context: &mut Context) -> EvalResult<Vec<LogEntry>> {
        let drained = self
            .drain
            .call(&JsValue::undefined(), &[], context)
            .map_err(|e| EvalError::thrown(e, context))?;

        let mut entries = Vec::new();
        for message in elements(&drained, context)? {
            let parts = elements(&message, context)?;
            let [method, args] = parts.as_slice() else {
                return Err(EvalError::Internal("malformed console record".into()));
            };
            let method = method
                .as_string()
                .map(|name| name.to_std_string_escaped())
                .unwrap_or_default();
            let Some(kind) = LogKind::from_console_method(&method) else {
                continue;
            };
            entries.push(LogEntry::console(kind, elements(args, context)?));
        }
        Ok(entries)
    }
}

/// The elements of an engine array.
fn elements(value: &JsValue, context: &mut Context) -> EvalResult<Vec<JsValue>> {
    let object = value
        .as_object()
        .cloned()
        .ok_or_else(|| EvalError::Internal("expected an array from the console buffer".into()))?;
    let array = JsArray::from_object(object).map_err(|e| EvalError::thrown(e, context))?;
    let length = array
        .length(context)
        .map_err(|e| EvalError::thrown(e, context))?;
    let mut out = Vec::with_capacity(length as usize);
    for index in 0..length {
        let element = array
            .at(index as i64, context)
            .map_err(|e| EvalError::thrown(e, context))?;
        out.push(element);
    }
    Ok(out)
}
