//! Phrasebook Core - word validation and example generation pipeline
//!
//! This crate turns a raw word into five example sentences by asking a
//! generative model, and keeps the two risky transformations safe:
//! sanitizing the inbound word and parsing the model's free-text reply.
//!
//! # Main Components
//!
//! - **Validator**: decodes and accepts or rejects a raw word
//! - **PromptBuilder**: renders a validated word into a model request
//! - **Parser**: extracts sentence records from the reply, tolerating bad entries
//! - **Response**: builds the envelope and the HTTP-style response
//! - **WordService**: the request pipeline over injected collaborators
//!
//! # Example
//!
//! ```
//! use phrasebook_core::{parse, assemble, validate};
//!
//! let word = validate("Bonjour").unwrap();
//! assert_eq!(word.as_str(), "Bonjour");
//!
//! let outcome = parse("Language: French\n\nT: Bonjour\nE: Hello\nP: bohn-ZHOOR");
//! let envelope = assemble(outcome);
//! assert_eq!(envelope.message, "Success");
//! assert_eq!(envelope.language, "French");
//! ```

pub mod bedrock;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod response;
pub mod validator;

// Re-export main types for convenience
pub use bedrock::BedrockClient;
pub use config::{ModelConfig, NotificationConfig, ServiceConfig, WordLimits};
pub use error::{
    EntryDefect, EntryParseError, Error, Result, ValidationError, ValidationErrorKind,
};
pub use model::{decode_reply, ModelInvoker, ModelReply, ModelRequest};
pub use notify::{Notifier, TelegramNotifier};
pub use parser::{parse, ParseOutcome, SentenceRecord};
pub use pipeline::{WordRequest, WordService};
pub use prompt::PromptBuilder;
pub use response::{
    assemble, HttpResponse, ResponseEnvelope, FAILURE_MESSAGE, RESPONSE_HEADERS, SUCCESS_MESSAGE,
};
pub use validator::{validate, ValidatedWord, WordValidator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
