//! Persisted user settings, stored next to the topics in the same blob

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TopicError};
use crate::host::{merge_save, BlobStore};

/// Top-level blob key holding the settings object
pub const SETTINGS_KEY: &str = "settings";

/// Default quiescence window before a modified document is reconciled
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Debounce window for change reconciliation, in milliseconds
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Settings {
    /// Read settings from the blob, falling back to defaults
    pub fn load<B: BlobStore>(blob: &B) -> Self {
        let value = match blob.load() {
            Ok(Some(value)) => value,
            Ok(None) => return Self::default(),
            Err(e) => {
                log::warn!("could not read settings, using defaults: {}", e);
                return Self::default();
            }
        };

        match value.get(SETTINGS_KEY) {
            Some(settings) => serde_json::from_value(settings.clone()).unwrap_or_else(|e| {
                log::warn!("invalid settings, using defaults: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn save<B: BlobStore>(&self, blob: &mut B) -> Result<()> {
        merge_save(blob, vec![(SETTINGS_KEY, serde_json::to_value(self)?)])
    }

    /// Set a setting by its command-line name
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "debounce-ms" | "debounceMs" => {
                self.debounce_ms = value.parse().map_err(|_| TopicError::InvalidSetting {
                    name: name.to_string(),
                    value: value.to_string(),
                })?;
                Ok(())
            }
            _ => Err(TopicError::InvalidSetting {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// `(name, value)` pairs for display
    pub fn entries(&self) -> Vec<(&'static str, serde_json::Value)> {
        vec![("debounce-ms", serde_json::json!(self.debounce_ms))]
    }
}
