use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiet period before a change is emitted, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Tag of the editable container
    #[serde(default = "default_root_tag")]
    pub root_tag: String,

    /// URL schemes accepted for links and images
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    /// Upper bound for table rows and columns
    #[serde(default = "default_max_table_size")]
    pub max_table_size: usize,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_root_tag() -> String {
    "div".to_string()
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string(), "mailto".to_string()]
}

fn default_max_table_size() -> usize {
    20
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            root_tag: default_root_tag(),
            allowed_schemes: default_allowed_schemes(),
            max_table_size: default_max_table_size(),
        }
    }
}
