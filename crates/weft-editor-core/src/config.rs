//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

pub const DEFAULT_HISTORY_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether edits are recorded for undo/redo.
    pub history_enabled: bool,
    /// Maximum number of undo entries kept.
    pub history_size: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_enabled: true,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.history_enabled && self.history_size == 0 {
            return Err(EditorError::configuration(
                "history_size must be positive while history is enabled",
            ));
        }
        Ok(())
    }

    pub fn without_history() -> Self {
        Self {
            history_enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = EditorConfig::default();
        assert!(config.history_enabled);
        assert_eq!(config.history_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_only_rejected_when_enabled() {
        let config = EditorConfig {
            history_enabled: true,
            history_size: 0,
        };
        assert!(matches!(
            config.validate(),
            Err(EditorError::Configuration { .. })
        ));

        let config = EditorConfig {
            history_enabled: false,
            history_size: 0,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"history_size": 3}"#).unwrap();
        assert_eq!(
            config,
            EditorConfig {
                history_enabled: true,
                history_size: 3
            }
        );
    }
}
