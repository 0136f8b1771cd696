//! Configuration for the lifecycle engine.

use serde::{Deserialize, Serialize};

/// Default auto-note template. `{from}` and `{to}` expand to status names.
pub const DEFAULT_AUTO_NOTE_TEMPLATE: &str = "Status changed from {from} to {to}";

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Template for the auto-generated note when a transition carries none
    pub auto_note_template: String,
    /// How many times a conflicted commit is retried before surfacing
    pub conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_note_template: DEFAULT_AUTO_NOTE_TEMPLATE.to_string(),
            conflict_retries: 1,
        }
    }
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Render the auto-note for a transition.
    pub fn render_auto_note(&self, from: &str, to: &str) -> String {
        self.auto_note_template
            .replace("{from}", from)
            .replace("{to}", to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.conflict_retries, 1);
        assert_eq!(
            config.render_auto_note("new", "callback"),
            "Status changed from new to callback"
        );
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = EngineConfig {
            auto_note_template: "moved {from} -> {to}".to_string(),
            conflict_retries: 2,
        };
        let yaml = config.to_yaml().unwrap();
        let reloaded = EngineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(reloaded.conflict_retries, 2);
        assert_eq!(reloaded.render_auto_note("a", "b"), "moved a -> b");
    }
}
