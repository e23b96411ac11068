//! HTTP model client for the Bedrock runtime `InvokeModel` API
//!
//! The client is built once from [`ModelConfig`] and shared by reference.
//! Construction is fallible so the host decides how to report a bad
//! configuration. Requests are sent once; there is no retry.

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::model::ModelInvoker;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Header carrying the AWS error type on failed calls
const ERROR_TYPE_HEADER: &str = "x-amzn-ErrorType";

/// Bedrock runtime client bound to a single model
#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: ReqwestClient,
    invoke_url: Url,
    model_id: String,
}

impl BedrockClient {
    /// Build a client from configuration
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let endpoint = match (&config.endpoint, &config.region) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(region)) => format!("https://bedrock-runtime.{}.amazonaws.com", region),
            (None, None) => {
                return Err(Error::configuration(
                    "model region not configured. Set AWS_REGION or model.endpoint",
                ))
            }
        };

        let api_key = config.api_key.as_deref().ok_or_else(|| {
            Error::configuration("model API key not found. Set AWS_BEARER_TOKEN_BEDROCK")
        })?;

        if config.model_id.trim().is_empty() {
            return Err(Error::configuration("model id must not be empty"));
        }

        let invoke_url = invoke_url(&endpoint, &config.model_id)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
            Error::Configuration {
                message: "model API key contains characters not allowed in a header".to_string(),
                source: Some(anyhow::anyhow!(e)),
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(anyhow::anyhow!(e)),
            })?;

        Ok(Self {
            client,
            invoke_url,
            model_id: config.model_id.clone(),
        })
    }

    /// Fully qualified `InvokeModel` URL
    pub fn invoke_url(&self) -> &Url {
        &self.invoke_url
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl ModelInvoker for BedrockClient {
    async fn invoke(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        tracing::debug!(url = %self.invoke_url, bytes = body.len(), "Invoking model");

        let response = self
            .client
            .post(self.invoke_url.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| Error::ModelInvocation {
                message: if e.is_timeout() {
                    format!("request to {} timed out", self.model_id)
                } else {
                    format!("request to {} failed: {}", self.model_id, e)
                },
                status_code: None,
                source: Some(anyhow::anyhow!(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_type = response
                .headers()
                .get(ERROR_TYPE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.split(':').next().unwrap_or(s).to_string());
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_type, &body));
        }

        let bytes = response.bytes().await.map_err(|e| Error::ModelInvocation {
            message: format!("failed to read model reply: {}", e),
            status_code: Some(status.as_u16()),
            source: Some(anyhow::anyhow!(e)),
        })?;

        Ok(bytes.to_vec())
    }
}

fn invoke_url(endpoint: &str, model_id: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| Error::Configuration {
        message: format!("invalid model endpoint {:?}: {}", endpoint, e),
        source: Some(anyhow::anyhow!(e)),
    })?;

    url.path_segments_mut()
        .map_err(|_| Error::configuration(format!("model endpoint {:?} cannot be a base URL", endpoint)))?
        .pop_if_empty()
        .extend(["model", model_id, "invoke"]);

    Ok(url)
}

/// Build an invocation error from a non-success reply
fn status_error(status: StatusCode, error_type: Option<String>, body: &str) -> Error {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("Message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());

    let message = match error_type {
        Some(kind) => format!("{} ({}): {}", kind, status.as_u16(), detail),
        None => format!("status {}: {}", status.as_u16(), detail),
    };

    Error::ModelInvocation {
        message,
        status_code: Some(status.as_u16()),
        source: None,
    }
}
