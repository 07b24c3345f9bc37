use crate::error::ViewerError;
use serde::{Deserialize, Serialize};

/// Viewer settings; every field has a default, so "{}" is valid
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Prefix for persisted keys
    pub storage_namespace: String,
    /// Added to a result's score when its heading contains a query term
    pub heading_bonus: f32,
    /// Result count used when the caller passes a limit of 0
    pub default_search_limit: usize,
    /// Scrollspy hysteresis band as a fraction of the document length
    pub hysteresis_ratio: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            storage_namespace: "study-viewer".to_string(),
            heading_bonus: 10.0,
            default_search_limit: 20,
            hysteresis_ratio: 0.01,
        }
    }
}

impl ViewerConfig {
    /// Parse config JSON; an empty string yields the defaults
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        if json.trim().is_empty() {
            return Ok(ViewerConfig::default());
        }
        let config: ViewerConfig = serde_json::from_str(json)?;
        if !(0.0..1.0).contains(&config.hysteresis_ratio) {
            return Err(ViewerError::InvalidConfig(format!(
                "hysteresisRatio must be in [0, 1), got {}",
                config.hysteresis_ratio
            )));
        }
        Ok(config)
    }

    pub fn progress_key(&self) -> String {
        format!("{}:progress", self.storage_namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config.storage_namespace, "study-viewer");
        assert_eq!(config.default_search_limit, 20);
        assert_eq!(config.progress_key(), "study-viewer:progress");
    }

    #[test]
    fn test_partial_override() {
        let config =
            ViewerConfig::from_json(r#"{"storageNamespace": "rust-notes", "headingBonus": 3}"#)
                .unwrap();
        assert_eq!(config.progress_key(), "rust-notes:progress");
        assert_eq!(config.heading_bonus, 3.0);
        assert_eq!(config.hysteresis_ratio, 0.01);
    }

    #[test]
    fn test_rejects_bad_hysteresis() {
        assert!(ViewerConfig::from_json(r#"{"hysteresisRatio": 1.5}"#).is_err());
        assert!(ViewerConfig::from_json("not json").is_err());
    }
}
