//! Extraction client for the external vision service.
//!
//! The service is a multimodal model behind an HTTP API: it receives
//! one invoice image plus a task prompt and answers with loosely
//! structured text that is usually, but not always, parseable JSON.

mod client;
mod prepare;

pub use client::HttpVisionClient;
pub use prepare::ImagePreparer;

use serde::{Deserialize, Serialize};

use crate::error::VisionError;

/// Result type for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;

/// Trait for vision extraction clients.
///
/// Implementations issue one fresh call per invocation; there is no
/// caching even for identical bytes within a batch.
pub trait VisionClient {
    /// Extract structured invoice content from prepared image bytes.
    ///
    /// On success returns the parsed JSON value of the service's
    /// response text. All failure modes are non-fatal to a batch.
    fn extract(&self, image: &[u8], prompt: PromptVariant) -> Result<serde_json::Value>;
}

/// Which output shape the service is asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptVariant {
    /// Flat item list with a date field.
    #[default]
    FlatItems,
    /// Free-form row table preserving the invoice layout.
    RawRows,
}

impl PromptVariant {
    /// The task prompt text sent alongside the image.
    pub fn text(&self) -> &'static str {
        match self {
            PromptVariant::FlatItems => {
                r#"Extract ALL line items from this invoice/receipt and flatten them into a simple list.

Return JSON in this EXACT format:
{
  "date": "采购时间：2020.10.1",
  "items": [
    {"品名": "海带丝", "数量": "1", "单价": "5.00", "金额": "5.00"},
    {"品名": "大头菜(颗)", "数量": "2.1", "单价": "1.70", "金额": "3.57"}
  ]
}

RULES:
- Extract EVERY product/item from the invoice
- If invoice has multiple columns, extract ALL items from ALL columns into one flat list
- Keep exact Chinese text for product names (品名)
- 数量 = quantity
- 单价 = unit price
- 金额 = total amount
- Return ONLY valid JSON, no markdown, no explanation, no code blocks"#
            }
            PromptVariant::RawRows => {
                r#"Extract ALL text from this invoice exactly as it appears. Keep all original Chinese characters.

Return as a JSON with this structure:
{
  "rows": [
    ["col1", "col2", "col3", ...],
    ["col1", "col2", "col3", ...]
  ]
}

- Preserve the table structure exactly
- Keep all Chinese text as-is
- Each row should be an array of cell values
- Return ONLY the JSON, no markdown"#
            }
        }
    }
}

/// Strip a markdown code fence (and optional `json` language tag)
/// wrapping the response text, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parse the service's response text into JSON after fence stripping.
pub fn parse_response_text(text: &str) -> Result<serde_json::Value> {
    let cleaned = strip_code_fence(text);
    serde_json::from_str(cleaned).map_err(|e| VisionError::MalformedJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_fence_with_language_tag() {
        let text = "```json\n{\"rows\": []}\n```";
        assert_eq!(strip_code_fence(text), "{\"rows\": []}");
    }

    #[test]
    fn test_strip_fence_without_language_tag() {
        let text = "```\n{\"items\": []}\n```";
        assert_eq!(strip_code_fence(text), "{\"items\": []}");
    }

    #[test]
    fn test_strip_fence_passthrough() {
        let text = "{\"date\": \"2020.10.1\"}";
        assert_eq!(strip_code_fence(text), text);
    }

    #[test]
    fn test_parse_response_text_fenced() {
        let value = parse_response_text("```json\n{\"date\":\"x\",\"items\":[]}\n```").unwrap();
        assert_eq!(value["date"], "x");
    }

    #[test]
    fn test_parse_response_text_malformed() {
        let err = parse_response_text("I could not read this invoice.").unwrap_err();
        assert!(matches!(err, VisionError::MalformedJson(_)));
    }
}
