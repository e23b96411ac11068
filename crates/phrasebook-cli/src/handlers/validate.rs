//! Validate command handler

use super::configured_validator;
use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use phrasebook_core::{ValidationError, ValidationErrorKind};
use serde::Serialize;
use tracing::{debug, instrument};

/// Outcome of checking one word
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub input: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<ValidationErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationReport {
    fn rejected(input: &str, error: &ValidationError) -> Self {
        Self {
            input: input.to_string(),
            valid: false,
            word: None,
            characters: None,
            rule: Some(error.kind()),
            error: Some(error.to_string()),
        }
    }
}

/// Handle the validate command
///
/// Rejections are reported and then returned as errors so the exit code
/// reflects them.
#[instrument(skip_all)]
pub async fn handle_validate(
    args: ValidateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let validator = configured_validator(config)?;
    let limits = validator.limits();
    debug!(min = limits.min_length, max = limits.max_length, "Validating word");

    match validator.validate(&args.word) {
        Ok(word) => {
            let report = ValidationReport {
                input: args.word.clone(),
                valid: true,
                word: Some(word.as_str().to_string()),
                characters: Some(word.char_count()),
                rule: None,
                error: None,
            };
            if output.format() == OutputFormat::Human {
                output.success(&format!("✓ {:?} is valid", word.as_str()))?;
                output.info(&format!(
                    "{} character(s), allowed {}..={}",
                    word.char_count(),
                    limits.min_length,
                    limits.max_length
                ))?;
                Ok(())
            } else {
                output.data(&report)
            }
        }
        Err(e) => {
            let report = ValidationReport::rejected(&args.word, &e);
            if output.format() == OutputFormat::Human {
                output.error(&format!("✗ Rejected by the {} rule", e.kind()))?;
            } else {
                output.data(&report)?;
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_report_serialization() {
        let error = ValidationError::Injection {
            word: "a--b".to_string(),
        };
        let report = ValidationReport::rejected("a--b", &error);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["valid"], false);
        assert_eq!(value["rule"], "injection");
        assert!(value.get("word").is_none());
        assert_eq!(value["error"], "\"a--b\" contains invalid patterns");
    }
}
