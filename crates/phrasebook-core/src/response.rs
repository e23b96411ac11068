//! Response envelope assembly
//!
//! The envelope is the only caller-visible artifact. Its `message` is binary:
//! [`SUCCESS_MESSAGE`] when every block parsed, [`FAILURE_MESSAGE`] otherwise,
//! while the sentences that did parse are returned either way.

use crate::error::{Error, Result};
use crate::parser::{ParseOutcome, SentenceRecord};
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Success";
pub const FAILURE_MESSAGE: &str = "Failed to generate examples";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Body served when even the error envelope cannot be serialized
const INTERNAL_ERROR_BODY: &str = r#"{"message":"Internal server error","language":"","sentences":[]}"#;

/// Static headers attached to every response
pub const RESPONSE_HEADERS: &[(&str, &str)] = &[
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "x-api-key"),
    ("X-Content-Type-Options", "nosniff"),
    ("Strict-Transport-Security", "max-age=31536000; includeSubDomains"),
    ("X-XSS-Protection", "1; mode=block"),
    ("Content-Security-Policy", "default-src 'none'"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "no-referrer"),
    ("Cache-Control", "no-store, max-age=0"),
];

/// Top-level result returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub message: String,
    pub language: String,
    pub sentences: Vec<SentenceRecord>,
}

impl ResponseEnvelope {
    /// Envelope for a failed request; carries no language or sentences
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            language: String::new(),
            sentences: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.message == SUCCESS_MESSAGE
    }
}

/// Combine parser output into the envelope; per-entry errors stay out of it
pub fn assemble(outcome: ParseOutcome) -> ResponseEnvelope {
    let message = if outcome.errors.is_empty() {
        SUCCESS_MESSAGE
    } else {
        FAILURE_MESSAGE
    };

    ResponseEnvelope {
        message: message.to_string(),
        language: outcome.language,
        sentences: outcome.sentences,
    }
}

/// HTTP-style response handed back to the hosting collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    /// Kept in insertion order, serialized as a JSON object
    #[serde(with = "header_map")]
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Serialize an envelope with the given status
    pub fn json(status_code: u16, envelope: &ResponseEnvelope) -> Result<Self> {
        Ok(Self {
            status_code,
            headers: default_headers(),
            body: serde_json::to_string(envelope)?,
        })
    }

    /// 200 response for an assembled envelope
    pub fn ok(envelope: &ResponseEnvelope) -> Self {
        Self::json(200, envelope).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Error marshalling success response");
            Self::internal_error()
        })
    }

    /// Response for a pipeline error
    ///
    /// Validation failures echo their reason with status 400. Everything
    /// else collapses to a generic 500 body.
    pub fn from_error(error: &Error) -> Self {
        if !error.is_user_facing() {
            return Self::internal_error();
        }
        let envelope = ResponseEnvelope::error(error.to_string());
        Self::json(error.status_code(), &envelope).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Error marshalling error response");
            Self::internal_error()
        })
    }

    /// Fixed 500 response
    pub fn internal_error() -> Self {
        Self {
            status_code: 500,
            headers: default_headers(),
            body: INTERNAL_ERROR_BODY.to_string(),
        }
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn default_headers() -> Vec<(String, String)> {
    RESPONSE_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Headers as an object (`{"Content-Type": "..."}`) like an API Gateway proxy response
mod header_map {
    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(headers: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(headers.iter().map(|(name, value)| (name, value)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HeaderVisitor;

        impl<'de> Visitor<'de> for HeaderVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of header names to values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut headers = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    headers.push(entry);
                }
                Ok(headers)
            }
        }

        deserializer.deserialize_map(HeaderVisitor)
    }
}
