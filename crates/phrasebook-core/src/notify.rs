//! Best-effort operational notifications
//!
//! Delivery runs on a detached task. Failures are logged and never reach
//! the request that triggered them.

use crate::config::NotificationConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::sync::Arc;
use std::time::Duration;

/// Sink for operational notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Telegram Bot API notifier
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: ReqwestClient,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Build from configuration; `None` when token or chat id is unset
    pub fn from_config(config: &NotificationConfig) -> Result<Option<Self>> {
        let (Some(bot_token), Some(chat_id)) = (&config.bot_token, &config.chat_id) else {
            tracing::warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set, notifications disabled");
            return Ok(None);
        };

        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create notification client: {}", e),
                source: Some(anyhow::anyhow!(e)),
            })?;

        Ok(Some(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.clone(),
            chat_id: chat_id.clone(),
        }))
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.send_message_url())
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            // reqwest includes the URL (and so the bot token) in its message
            .map_err(|e| Error::Internal {
                message: "error sending telegram notification".to_string(),
                source: anyhow::anyhow!(e.without_url()),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Internal {
                message: format!("Telegram API returned non-200 status code: {}", status.as_u16()),
                source: anyhow::anyhow!("status {}", status),
            });
        }

        Ok(())
    }
}

/// Notification text for a served word
pub fn request_notification(word: &str, source_ip: &str) -> String {
    format!("Requested word: {} --- User IP: {}", word, source_ip)
}

/// Deliver `text` on a detached task; errors are logged and dropped
///
/// Outside a Tokio runtime the notification is skipped.
pub fn spawn_notification(notifier: Arc<dyn Notifier>, text: String) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::warn!("No async runtime available, notification skipped");
        return;
    };
    handle.spawn(async move {
        if let Err(e) = notifier.send(&text).await {
            tracing::warn!(error = %e, "Notification delivery failed");
        }
    });
}
