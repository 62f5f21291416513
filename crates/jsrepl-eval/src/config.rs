//! Session configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for one [`Session`](crate::Session).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Directory that `import()` specifiers resolve against. `None` means the
    /// current directory.
    pub module_root: Option<PathBuf>,
    /// Capacity of the in-memory log; the oldest entries are dropped first.
    pub max_log_entries: usize,
    /// Install a `console` object whose output is recorded in the log.
    pub capture_console: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            module_root: None,
            max_log_entries: 1000,
            capture_console: true,
        }
    }
}

impl ReplConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The module root, defaulting to the current directory.
    pub fn module_root(&self) -> PathBuf {
        self.module_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReplConfig::default();
        assert_eq!(config.max_log_entries, 1000);
        assert!(config.capture_console);
        assert_eq!(config.module_root(), PathBuf::from("."));
    }

    #[test]
    fn test_partial_json() {
        let config = ReplConfig::from_json(r#"{ "max_log_entries": 5 }"#).unwrap();
        assert_eq!(config.max_log_entries, 5);
        assert!(config.capture_console);
        assert!(config.module_root.is_none());
    }

    #[test]
    fn test_full_json() {
        let config = ReplConfig::from_json(
            r#"{ "module_root": "/srv/modules", "max_log_entries": 10, "capture_console": false }"#,
        )
        .unwrap();
        assert_eq!(config.module_root(), PathBuf::from("/srv/modules"));
        assert!(!config.capture_console);
    }

    #[test]
    fn test_invalid_json() {
        assert!(ReplConfig::from_json(r#"{ "max_log_entries": "many" }"#).is_err());
    }
}
