//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from phrasebook-core library
    #[error("{0}")]
    Core(#[from] phrasebook_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The service answered with a non-200 status
    #[error("Request failed with status {status}")]
    RequestFailed { status: u16 },

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(phrasebook_core::Error::Validation(_)) => 2,
            Self::Core(phrasebook_core::Error::Configuration { .. }) => 5,
            Self::Core(_) => 3,
            Self::FileNotFound { .. } => 4,
            Self::InvalidFormat { .. } => 6,
            Self::Config(_) => 5,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::RequestFailed { status } if *status < 500 => 2,
            Self::RequestFailed { .. } => 3,
            Self::Other { .. } => 99,
        }
    }
}

impl From<phrasebook_core::ValidationError> for Error {
    fn from(err: phrasebook_core::ValidationError) -> Self {
        Self::Core(err.into())
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}
