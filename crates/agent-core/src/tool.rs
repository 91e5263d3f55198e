//! Tool Provider
//!
//! The agent never runs tools itself. A separate worker process advertises
//! tools and executes calls; this module defines the seam the executor talks
//! through and the content shapes it returns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Arguments passed to a tool, opaque to the agent
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// A tool advertised by the provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool identifier
    pub name: String,

    /// JSON Schema describing the tool's arguments
    #[serde(default = "empty_schema")]
    pub input_schema: serde_json::Value,

    /// Human-readable description (shown to the LLM)
    #[serde(default)]
    pub description: String,
}

fn empty_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object" })
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            input_schema,
            description: description.into(),
        }
    }
}

/// One typed part of a tool result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    /// Textual part
    Text(TextPart),

    /// Anything else (images, resources, ...) kept as raw JSON
    Opaque(serde_json::Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Text,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextPart {
            kind: TextKind::Text,
            text: text.into(),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(part) => Some(&part.text),
            Self::Opaque(_) => None,
        }
    }
}

/// Result of a single tool call as returned by the provider
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    #[serde(default)]
    pub content: Vec<ContentPart>,

    /// Provider flagged the call as failed (error envelope)
    #[serde(default)]
    pub is_error: bool,

    /// Any other result fields (`structuredContent`, `_meta`, ...), kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::text(text)],
            is_error: false,
            extra: serde_json::Map::new(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::text(text)],
            is_error: true,
            extra: serde_json::Map::new(),
        }
    }

    /// Collapse the content into a single text blob.
    ///
    /// Text parts are joined with newlines. With no text part at all the
    /// whole result, unknown fields included, is rendered as JSON instead.
    pub fn to_text(&self) -> String {
        let texts: Vec<&str> = self.content.iter().filter_map(ContentPart::as_text).collect();
        if texts.is_empty() {
            serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
        } else {
            texts.join("\n")
        }
    }
}

/// Strategy trait for tool providers
///
/// Implementations own the channel to the worker. Errors are expected to be
/// `AgentError::ToolCallFailed` for a single failed call and
/// `AgentError::ChannelFailure` when the channel itself is gone.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// List the tools currently advertised
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Execute one tool call
    async fn call_tool(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput>;

    /// Close the channel, abandoning anything in flight
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_parts_joined_with_newlines() {
        let output = ToolOutput {
            content: vec![
                ContentPart::text("Weather in Paris: 18°C"),
                ContentPart::Opaque(json!({"type": "image", "data": "..."})),
                ContentPart::text("clear sky"),
            ],
            ..ToolOutput::default()
        };
        assert_eq!(output.to_text(), "Weather in Paris: 18°C\nclear sky");
    }

    #[test]
    fn test_no_text_falls_back_to_raw_rendering() {
        let output = ToolOutput {
            content: vec![ContentPart::Opaque(json!({"type": "image", "mimeType": "image/png"}))],
            ..ToolOutput::default()
        };
        let text = output.to_text();
        assert!(text.contains("image/png"));
        assert!(text.contains("content"));
    }

    #[test]
    fn test_raw_rendering_keeps_structured_content() {
        let output: ToolOutput = serde_json::from_value(json!({
            "content": [],
            "structuredContent": {"temp": 18}
        }))
        .unwrap();

        assert!(!output.is_error);
        assert_eq!(output.extra["structuredContent"]["temp"], 18);

        let rendered: serde_json::Value = serde_json::from_str(&output.to_text()).unwrap();
        assert_eq!(rendered["structuredContent"], json!({"temp": 18}));
        assert_eq!(rendered["content"], json!([]));
    }

    #[test]
    fn test_content_part_deserializes_both_variants() {
        let parts: Vec<ContentPart> = serde_json::from_value(json!([
            {"type": "text", "text": "hello"},
            {"type": "resource", "uri": "file:///tmp/x.pdf"}
        ]))
        .unwrap();
        assert_eq!(parts[0].as_text(), Some("hello"));
        assert!(matches!(parts[1], ContentPart::Opaque(_)));
    }

    #[test]
    fn test_descriptor_uses_wire_field_names() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "name": "get_weather",
            "description": "Get weather details for a city",
            "inputSchema": {"type": "object", "properties": {"city": {"type": "string"}}}
        }))
        .unwrap();
        assert_eq!(tool.name, "get_weather");
        assert_eq!(tool.input_schema["properties"]["city"]["type"], "string");
    }
}
