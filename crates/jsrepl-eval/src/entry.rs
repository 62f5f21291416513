//! Log entries recorded by a session.

use boa_engine::JsValue;
use jsrepl_types::LogKind;

/// One line of console history.
///
/// `values` keeps the engine values behind the entry so they can be bound
/// into the store later; `text` is their plain rendering.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
    pub values: Vec<JsValue>,
}

impl LogEntry {
    /// Echo of submitted source text.
    pub fn input(source: &str) -> Self {
        Self {
            kind: LogKind::Input,
            text: source.to_string(),
            values: Vec::new(),
        }
    }

    /// A fragment's completion value.
    pub fn output(value: JsValue) -> Self {
        Self {
            kind: LogKind::Output,
            text: value.display().to_string(),
            values: vec![value],
        }
    }

    /// A failure: the thrown value, or the error message for failures
    /// that never reached the engine.
    pub fn error(text: String, value: JsValue) -> Self {
        Self {
            kind: LogKind::Error,
            text,
            values: vec![value],
        }
    }

    /// A message written through the captured `console`.
    pub fn console(kind: LogKind, values: Vec<JsValue>) -> Self {
        let text = values.iter().map(render).collect::<Vec<_>>().join(" ");
        Self { kind, text, values }
    }
}

/// Render a value the way `console.log` prints an argument: strings bare,
/// everything else in display form.
pub fn render(value: &JsValue) -> String {
    match value.as_string() {
        Some(string) => string.to_std_string_escaped(),
        None => value.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_engine::js_string;

    #[test]
    fn test_console_text_joins_arguments() {
        let entry = LogEntry::console(
            LogKind::Log,
            vec![JsValue::from(js_string!("total:")), JsValue::from(3)],
        );
        assert_eq!(entry.text, "total: 3");
        assert_eq!(entry.values.len(), 2);
    }

    #[test]
    fn test_input_has_no_values() {
        let entry = LogEntry::input("1 + 1");
        assert_eq!(entry.kind, LogKind::Input);
        assert_eq!(entry.text, "1 + 1");
        assert!(entry.values.is_empty());
    }

    #[test]
    fn test_output_renders_strings_quoted() {
        let entry = LogEntry::output(JsValue::from(js_string!("hi")));
        assert_eq!(entry.text, "\"hi\"");
    }
}
