//! Request pipeline
//!
//! `WordService` wires the stages together:
//! validate → render prompt → notify (detached) → invoke model → decode →
//! parse → assemble. Validation and model faults abort the request; malformed
//! entries only flip the envelope message.

use crate::bedrock::BedrockClient;
use crate::config::{ServiceConfig, WordLimits};
use crate::error::Result;
use crate::model::{decode_reply, ModelInvoker};
use crate::notify::{request_notification, spawn_notification, Notifier, TelegramNotifier};
use crate::parser::{self, ParseOutcome};
use crate::prompt::PromptBuilder;
use crate::response::{assemble, HttpResponse, ResponseEnvelope};
use crate::validator::WordValidator;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Inbound request as handed over by the host
#[derive(Debug, Clone, Default)]
pub struct WordRequest {
    /// Raw, possibly percent-encoded word
    pub word: String,
    /// Caller address, used for logs and notifications only
    pub source_ip: String,
}

impl WordRequest {
    pub fn new(word: impl Into<String>, source_ip: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            source_ip: source_ip.into(),
        }
    }
}

/// The word example service
///
/// Holds only read-only collaborators, so one instance can serve concurrent
/// requests behind an `Arc`.
pub struct WordService {
    validator: WordValidator,
    prompts: PromptBuilder,
    model: Arc<dyn ModelInvoker>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl WordService {
    pub fn new(limits: WordLimits, prompts: PromptBuilder, model: Arc<dyn ModelInvoker>) -> Self {
        Self {
            validator: WordValidator::new(limits),
            prompts,
            model,
            notifier: None,
        }
    }

    /// Attach a notification sink
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the service and its collaborators from configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.limits.validate()?;
        let model = BedrockClient::from_config(&config.model)?;
        let prompts = PromptBuilder::new(config.model.max_new_tokens);

        let mut service = Self::new(config.limits, prompts, Arc::new(model));
        if let Some(notifier) = TelegramNotifier::from_config(&config.notifications)? {
            service = service.with_notifier(Arc::new(notifier));
        }
        Ok(service)
    }

    pub fn validator(&self) -> &WordValidator {
        &self.validator
    }

    /// Run the pipeline and return the envelope or the aborting error
    pub async fn process(&self, request: &WordRequest) -> Result<ResponseEnvelope> {
        info!(source_ip = %request.source_ip, "User IP");

        let word = self.validator.validate(&request.word).map_err(|e| {
            warn!(error = %e, "Invalid word");
            e
        })?;
        info!(word = %word, "Word queried");

        let body = self.prompts.build_request(&word).to_body().map_err(|e| {
            error!(error = %e, "Error marshalling payload");
            e
        })?;

        if let Some(notifier) = &self.notifier {
            spawn_notification(
                Arc::clone(notifier),
                request_notification(word.as_str(), &request.source_ip),
            );
        }

        let reply = self.model.invoke(body).await.map_err(|e| {
            error!(error = %e, "Error invoking model");
            e
        })?;
        debug!(output = %String::from_utf8_lossy(&reply), "Model output");

        let text = decode_reply(&reply).map_err(|e| {
            error!(error = %e, "Error decoding model output");
            e
        })?;

        let outcome = parser::parse(&text);
        log_parse_errors(&outcome);

        Ok(assemble(outcome))
    }

    /// Run the pipeline and render the HTTP-style response
    pub async fn handle(&self, request: &WordRequest) -> HttpResponse {
        let span = tracing::info_span!(
            "request",
            request_id = %generate_request_id(),
            source_ip = %request.source_ip,
        );

        async {
            match self.process(request).await {
                Ok(envelope) => HttpResponse::ok(&envelope),
                Err(e) => HttpResponse::from_error(&e),
            }
        }
        .instrument(span)
        .await
    }
}

/// Generate a unique id for one request
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

fn log_parse_errors(outcome: &ParseOutcome) {
    for entry_error in &outcome.errors {
        warn!(entry = entry_error.index, error = %entry_error, "Skipping malformed entry");
    }
    if !outcome.errors.is_empty() {
        info!(
            parsed = outcome.sentences.len(),
            failed = outcome.errors.len(),
            "Model reply partially parsed"
        );
    }
}
