//! Inbound word sanitization
//!
//! The validator is the only producer of [`ValidatedWord`]. Rules run in a
//! fixed order and the first failing rule decides the error:
//!
//! 1. trim surrounding whitespace, reject if empty
//! 2. percent-decode (query style, `+` is a space), reject malformed escapes
//! 3. enforce the configured code point length bounds
//! 4. reject markup brackets and SQL-looking substrings
//! 5. allow only letters, marks, whitespace, `-`, `'` and `"`
//! 6. reject runs of three hyphens or three spaces

use crate::config::WordLimits;
use crate::error::ValidationError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Substrings rejected case-insensitively
const BLOCKED_PATTERNS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "UNION", "--", ";"];

/// Runs that count as excessive repetition
const BLOCKED_RUNS: &[&str] = &["---", "   "];

static ALLOWED_CHARS: OnceLock<Regex> = OnceLock::new();

fn allowed_chars() -> &'static Regex {
    ALLOWED_CHARS.get_or_init(|| {
        Regex::new(r#"^[\p{L}\p{M}\s'"-]*$"#).expect("allowed character pattern is valid")
    })
}

/// A decoded word that passed every validation rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ValidatedWord(String);

impl ValidatedWord {
    /// Borrow the decoded word
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in Unicode code points
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// Take ownership of the decoded word
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ValidatedWord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Word validator holding the configured length bounds
#[derive(Debug, Clone, Copy, Default)]
pub struct WordValidator {
    limits: WordLimits,
}

impl WordValidator {
    /// Create a validator for the given bounds
    pub fn new(limits: WordLimits) -> Self {
        Self { limits }
    }

    /// The bounds this validator enforces
    pub fn limits(&self) -> WordLimits {
        self.limits
    }

    /// Validate a raw, possibly percent-encoded word
    pub fn validate(&self, raw: &str) -> Result<ValidatedWord, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let decoded = percent_decode(trimmed)?;

        let length = decoded.chars().count();
        if length < self.limits.min_length {
            return Err(ValidationError::TooShort {
                word: decoded,
                min: self.limits.min_length,
            });
        }
        if length > self.limits.max_length {
            return Err(ValidationError::TooLong {
                word: decoded,
                max: self.limits.max_length,
            });
        }

        if contains_injection(&decoded) {
            return Err(ValidationError::Injection { word: decoded });
        }

        if !allowed_chars().is_match(&decoded) {
            return Err(ValidationError::Charset { word: decoded });
        }

        if BLOCKED_RUNS.iter().any(|run| decoded.contains(run)) {
            return Err(ValidationError::Repetition { word: decoded });
        }

        Ok(ValidatedWord(decoded))
    }
}

/// Validate with the default bounds
pub fn validate(raw: &str) -> Result<ValidatedWord, ValidationError> {
    WordValidator::default().validate(raw)
}

fn contains_injection(word: &str) -> bool {
    if word.contains('<') || word.contains('>') {
        return true;
    }
    let upper = word.to_uppercase();
    BLOCKED_PATTERNS.iter().any(|pattern| upper.contains(pattern))
}

/// Query-style percent decoding: `+` is a space, every `%` must start a two digit hex escape
fn percent_decode(input: &str) -> Result<String, ValidationError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            let well_formed = escape.map_or(false, |hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                let end = (i + 3).min(bytes.len());
                return Err(ValidationError::Encoding {
                    reason: format!(
                        "invalid URL escape {:?}",
                        String::from_utf8_lossy(&bytes[i..end])
                    ),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = input.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ValidationError::Encoding {
            reason: format!("decoded bytes are not valid UTF-8: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;

    fn kind_of(raw: &str) -> ValidationErrorKind {
        validate(raw).unwrap_err().kind()
    }

    #[test]
    fn test_accepts_plain_words() {
        assert_eq!(validate("hello").unwrap().as_str(), "hello");
        assert_eq!(validate("  Bonjour  ").unwrap().as_str(), "Bonjour");
        assert_eq!(validate("rock-and-roll").unwrap().as_str(), "rock-and-roll");
        assert_eq!(validate("l'amour").unwrap().as_str(), "l'amour");
    }

    #[test]
    fn test_accepts_multiple_scripts() {
        for word in ["日本語", "ひらがな", "カタカナ", "한국어", "Привет", "مرحبا", "नमस्ते", "café"] {
            assert_eq!(validate(word).unwrap().as_str(), word, "{} should validate", word);
        }
    }

    #[test]
    fn test_decodes_percent_encoding() {
        assert_eq!(validate("%E6%97%A5%E6%9C%AC").unwrap().as_str(), "日本");
        assert_eq!(validate("good+morning").unwrap().as_str(), "good morning");
        assert_eq!(validate("good%20morning").unwrap().as_str(), "good morning");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(validate(""), Err(ValidationError::EmptyInput));
        assert_eq!(validate(" "), Err(ValidationError::EmptyInput));
        assert_eq!(validate("\t\n "), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn test_malformed_encoding() {
        assert_eq!(kind_of("abc%"), ValidationErrorKind::Encoding);
        assert_eq!(kind_of("abc%2"), ValidationErrorKind::Encoding);
        assert_eq!(kind_of("%zzword"), ValidationErrorKind::Encoding);
        assert_eq!(kind_of("%FF%FE"), ValidationErrorKind::Encoding);
    }

    #[test]
    fn test_length_bounds_use_code_points() {
        let validator = WordValidator::new(WordLimits::new(1, 30).unwrap());
        assert!(validator.validate(&"a".repeat(30)).is_ok());
        assert_eq!(
            validator.validate(&"a".repeat(31)).unwrap_err().kind(),
            ValidationErrorKind::Length
        );
        // 10 code points, 30 bytes
        assert!(validator.validate(&"語".repeat(10)).is_ok());
    }

    #[test]
    fn test_minimum_length() {
        let validator = WordValidator::new(WordLimits::new(3, 10).unwrap());
        assert_eq!(
            validator.validate("ab"),
            Err(ValidationError::TooShort { word: "ab".to_string(), min: 3 })
        );
    }

    #[test]
    fn test_injection_patterns() {
        assert_eq!(kind_of("SELECT * FROM x"), ValidationErrorKind::Injection);
        assert_eq!(kind_of("<script>"), ValidationErrorKind::Injection);
        assert_eq!(kind_of("dropdown"), ValidationErrorKind::Injection);
        assert_eq!(kind_of("word;"), ValidationErrorKind::Injection);
        assert_eq!(kind_of("a--b"), ValidationErrorKind::Injection);
        assert_eq!(kind_of("%3Cb%3E"), ValidationErrorKind::Injection);
    }

    #[test]
    fn test_charset() {
        assert_eq!(kind_of("hello1"), ValidationErrorKind::Charset);
        assert_eq!(kind_of("a_b"), ValidationErrorKind::Charset);
        assert_eq!(kind_of("hi!"), ValidationErrorKind::Charset);
        assert_eq!(kind_of("🙂"), ValidationErrorKind::Charset);
    }

    #[test]
    fn test_repetition() {
        assert_eq!(kind_of("a   b"), ValidationErrorKind::Repetition);
        assert!(validate("a  b").is_ok());
    }

    #[test]
    fn test_rule_order() {
        // Empty wins over everything else
        assert_eq!(kind_of("   "), ValidationErrorKind::EmptyInput);
        // Encoding is checked before length
        assert_eq!(kind_of(&format!("{}%G1", "a".repeat(40))), ValidationErrorKind::Encoding);
        // Length is checked before injection and charset
        assert_eq!(kind_of(&format!("SELECT{}1", "a".repeat(40))), ValidationErrorKind::Length);
        // Injection is checked before charset
        assert_eq!(kind_of("<1>"), ValidationErrorKind::Injection);
        // Charset is checked before repetition
        assert_eq!(kind_of("1   1"), ValidationErrorKind::Charset);
    }
}
