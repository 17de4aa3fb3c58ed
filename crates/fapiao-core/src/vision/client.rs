//! HTTP client for an OpenAI-style chat-completions vision endpoint.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{FapiaoError, VisionError};
use crate::models::config::VisionConfig;

use super::{parse_response_text, PromptVariant, Result, VisionClient};

/// Vision client backed by a chat-completions HTTP API.
///
/// The image travels as a base64 JPEG data URL inside the user
/// message. Each call is synchronous and bounded by the configured
/// per-call timeout.
pub struct HttpVisionClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl HttpVisionClient {
    /// Build a client from config, reading the API key from the
    /// environment variable named in `config.api_key_env`.
    pub fn new(config: &VisionConfig) -> std::result::Result<Self, FapiaoError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            FapiaoError::Config(format!("{} is not set", config.api_key_env))
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Build a client from config with an explicit API key.
    pub fn with_api_key(
        config: &VisionConfig,
        api_key: String,
    ) -> std::result::Result<Self, FapiaoError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FapiaoError::Config(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }
}

impl VisionClient for HttpVisionClient {
    fn extract(&self, image: &[u8], prompt: PromptVariant) -> Result<serde_json::Value> {
        let encoded = BASE64.encode(image);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt.text()},
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:image/jpeg;base64,{}", encoded)
                        }
                    }
                ]
            }],
            "max_tokens": self.max_tokens,
        });

        debug!("sending {} image bytes to {}", image.len(), self.endpoint);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    VisionError::Network("request timed out".to_string())
                } else {
                    VisionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = response
            .json()
            .map_err(|e| VisionError::MalformedJson(e.to_string()))?;

        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or(VisionError::MissingContent)?;

        parse_response_text(content)
    }
}
