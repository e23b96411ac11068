//! Model request and reply wire types
//!
//! The request mirrors the provider's messages API. The reply is decoded
//! into an explicit typed envelope in one fallible step, so any deviation
//! from `output.message.content[0].text` becomes a single
//! [`Error::ModelResponseShape`].

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request payload sent to the model provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    #[serde(rename = "inferenceConfig")]
    pub inference_config: InferenceConfig,
    pub messages: Vec<Message>,
}

/// Generation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Provider wire name is `max_new_tokens`
    pub max_new_tokens: u32,
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// Text content block, shared by requests and replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub text: String,
}

impl ModelRequest {
    /// Single user turn carrying `text`
    pub fn user_text(text: impl Into<String>, max_new_tokens: u32) -> Self {
        Self {
            inference_config: InferenceConfig { max_new_tokens },
            messages: vec![Message {
                role: MessageRole::User,
                content: vec![ContentBlock { text: text.into() }],
            }],
        }
    }

    /// Serialize to the request body
    pub fn to_body(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Expected reply envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ModelReply {
    pub output: ReplyOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyOutput {
    pub message: ReplyMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyMessage {
    pub content: Vec<ContentBlock>,
}

impl ModelReply {
    /// Text of the first content block
    pub fn into_text(self) -> Result<String> {
        self.output
            .message
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| Error::ModelResponseShape {
                message: "output.message.content is empty".to_string(),
                source: None,
            })
    }
}

/// Decode a raw reply body and extract its text
pub fn decode_reply(body: &[u8]) -> Result<String> {
    let reply: ModelReply = serde_json::from_slice(body).map_err(|e| Error::ModelResponseShape {
        message: format!("reply does not match output.message.content[0].text: {}", e),
        source: Some(e),
    })?;
    reply.into_text()
}

/// Remote model collaborator
///
/// Implementations are built once at startup and shared read-only between
/// requests.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Send a serialized [`ModelRequest`] and return the raw reply body
    async fn invoke(&self, body: Vec<u8>) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_reply() {
        let body = json!({
            "output": {"message": {"role": "assistant", "content": [{"text": "Language: French"}]}},
            "stopReason": "end_turn",
            "usage": {"inputTokens": 10, "outputTokens": 20}
        });
        let text = decode_reply(body.to_string().as_bytes()).unwrap();
        assert_eq!(text, "Language: French");
    }

    #[test]
    fn test_decode_reply_shape_errors() {
        let cases = [
            "not json".to_string(),
            json!({}).to_string(),
            json!({"output": {"message": {"content": []}}}).to_string(),
            json!({"output": {"message": {"content": [{"image": "x"}]}}}).to_string(),
            json!({"output": {"message": {"content": [{"text": 42}]}}}).to_string(),
        ];
        for body in cases {
            let err = decode_reply(body.as_bytes()).unwrap_err();
            assert!(
                matches!(err, Error::ModelResponseShape { .. }),
                "expected shape error for {}",
                body
            );
            assert_eq!(err.status_code(), 500);
        }
    }

    #[test]
    fn test_request_serialization() {
        let request = ModelRequest::user_text("hi", 1000);
        let value: serde_json::Value = serde_json::from_slice(&request.to_body().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "inferenceConfig": {"max_new_tokens": 1000},
                "messages": [{"role": "user", "content": [{"text": "hi"}]}]
            })
        );
    }
}
