//! Error types for the Phrasebook core library
//!
//! This module defines the error taxonomy of the request pipeline, using
//! thiserror for the error definitions and anyhow for boxed sources.
//!
//! Validation failures are user-facing and map to status 400. Model,
//! serialization and configuration faults are server-side and map to 500.
//! Per-entry parse failures never surface as a top-level error; they are
//! collected by the parser instead (see [`EntryParseError`]).

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Main error type for Phrasebook operations
#[derive(Error, Debug)]
pub enum Error {
    /// The inbound word was rejected by the validator
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The model provider could not be reached or answered with a failure status
    #[error("Model invocation failed: {message}")]
    ModelInvocation {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The model reply did not have the expected `output.message.content[0].text` shape
    #[error("Unexpected model response shape: {message}")]
    ModelResponseShape {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// JSON serialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP-style status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Whether the error message may be shown to the caller verbatim
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Rule of the validator that rejected a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    EmptyInput,
    Encoding,
    Length,
    Injection,
    Charset,
    Repetition,
}

/// Rejection reasons produced by [`crate::validator::WordValidator`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("word cannot be empty")]
    EmptyInput,

    #[error("invalid URL encoding: {reason}")]
    Encoding { reason: String },

    #[error("{word:?} must be at least {min} character(s)")]
    TooShort { word: String, min: usize },

    #[error("{word:?} must not exceed {max} characters")]
    TooLong { word: String, max: usize },

    #[error("{word:?} contains invalid patterns")]
    Injection { word: String },

    #[error("{word:?} contains invalid characters (only letters, spaces, and basic punctuation are allowed)")]
    Charset { word: String },

    #[error("{word:?} contains too many consecutive special characters")]
    Repetition { word: String },
}

impl ValidationError {
    /// The rule that produced this error
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::EmptyInput => ValidationErrorKind::EmptyInput,
            ValidationError::Encoding { .. } => ValidationErrorKind::Encoding,
            ValidationError::TooShort { .. } | ValidationError::TooLong { .. } => {
                ValidationErrorKind::Length
            }
            ValidationError::Injection { .. } => ValidationErrorKind::Injection,
            ValidationError::Charset { .. } => ValidationErrorKind::Charset,
            ValidationError::Repetition { .. } => ValidationErrorKind::Repetition,
        }
    }
}

/// What was wrong with a single entry block of a model reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryDefect {
    /// The block did not have exactly three lines
    LineCount { got: usize },
    /// One of the `T: `, `E: `, `P: ` prefixes was missing or duplicated
    MissingPrefix { prefix: String },
}

/// Non-fatal failure to parse one entry block; `index` is 1-based
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("entry {index}: {defect}")]
pub struct EntryParseError {
    pub index: usize,
    pub defect: EntryDefect,
}

impl fmt::Display for EntryDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDefect::LineCount { got } => {
                write!(f, "invalid entry format: expected 3 lines, got {}", got)
            }
            EntryDefect::MissingPrefix { prefix } => {
                write!(f, "missing expected line with prefix '{}'", prefix)
            }
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::EmptyInput => write!(f, "empty_input"),
            ValidationErrorKind::Encoding => write!(f, "encoding"),
            ValidationErrorKind::Length => write!(f, "length"),
            ValidationErrorKind::Injection => write!(f, "injection"),
            ValidationErrorKind::Charset => write!(f, "charset"),
            ValidationErrorKind::Repetition => write!(f, "repetition"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
