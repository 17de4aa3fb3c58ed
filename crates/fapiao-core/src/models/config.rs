//! Configuration structures for the aggregation pipeline.

use serde::{Deserialize, Serialize};

use crate::vision::PromptVariant;

/// Main configuration for the fapiao pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// Vision service configuration.
    pub vision: VisionConfig,

    /// Image preparation configuration.
    pub image: ImageConfig,

    /// Batch upload limits.
    pub limits: BatchLimits,

    /// Which extraction prompt to use.
    pub prompt: PromptVariant,
}

/// External vision service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Base URL of the chat-completions endpoint.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Token budget for the extraction response.
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
            max_tokens: 2000,
        }
    }
}

/// Image preparation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum dimension (longer side) before sending.
    pub max_dimension: u32,

    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            jpeg_quality: 85,
        }
    }
}

/// Hard preconditions checked before any file is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchLimits {
    /// Maximum number of files per batch.
    pub max_files: usize,

    /// Maximum total upload size in bytes.
    pub max_total_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_total_bytes: 20 * 1024 * 1024,
        }
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FapiaoConfig::default();
        assert_eq!(config.limits.max_files, 10);
        assert_eq!(config.limits.max_total_bytes, 20 * 1024 * 1024);
        assert_eq!(config.image.max_dimension, 1920);
        assert_eq!(config.image.jpeg_quality, 85);
        assert_eq!(config.vision.timeout_secs, 120);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: FapiaoConfig =
            serde_json::from_str(r#"{"limits":{"max_files":3}}"#).unwrap();
        assert_eq!(config.limits.max_files, 3);
        assert_eq!(config.limits.max_total_bytes, 20 * 1024 * 1024);
        assert_eq!(config.vision.model, "gpt-4o");
    }
}
