use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a console log entry.
///
/// `Input`, `Output` and `Error` are produced by the evaluator for each
/// submitted fragment; the remaining kinds mirror the `console` methods the
/// session captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Echo of the submitted fragment text.
    Input,
    /// Completion value of a fragment.
    Output,
    /// Thrown value of a failed fragment, or `console.error`.
    Error,
    Log,
    Info,
    Warn,
    Debug,
}

impl LogKind {
    /// Map a captured `console` method name to its entry kind.
    ///
    /// Returns `None` for names the console does not record.
    pub fn from_console_method(name: &str) -> Option<Self> {
        match name {
            "log" | "dir" | "trace" => Some(Self::Log),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" | "assert" => Some(Self::Error),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Error => "error",
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Debug => "debug",
        };
        f.write_str(name)
    }
}
