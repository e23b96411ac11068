//! Tolerant parser for model replies
//!
//! A reply is an optional `Language:` header line followed by entry blocks
//! separated by blank lines. Every block must hold exactly one `T: `, one
//! `E: ` and one `P: ` line, in any order. A malformed block is recorded in
//! [`ParseOutcome::errors`] and parsing continues with the next one.

use crate::error::{EntryDefect, EntryParseError};
use serde::{Deserialize, Serialize};

/// Prefix of the optional language header line
pub const LANGUAGE_PREFIX: &str = "Language:";

pub const TARGET_PREFIX: &str = "T: ";
pub const ENGLISH_PREFIX: &str = "E: ";
pub const PRONUNCIATION_PREFIX: &str = "P: ";

const ENTRY_PREFIXES: [&str; 3] = [TARGET_PREFIX, ENGLISH_PREFIX, PRONUNCIATION_PREFIX];
const LINES_PER_ENTRY: usize = 3;

/// One usage example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub target: String,
    pub english: String,
    pub pronunciation: String,
}

/// Result of parsing a reply: parsed records and per-entry failures, both in block order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// Language named by the header, empty if there was none
    pub language: String,
    pub sentences: Vec<SentenceRecord>,
    pub errors: Vec<EntryParseError>,
}

impl ParseOutcome {
    /// True when no block failed
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of blocks seen
    pub fn block_count(&self) -> usize {
        self.sentences.len() + self.errors.len()
    }
}

/// Parse a raw model reply
pub fn parse(raw: &str) -> ParseOutcome {
    let normalized = raw.replace("\r\n", "\n");
    let (language, body) = split_language_header(&normalized);

    let mut outcome = ParseOutcome {
        language,
        ..ParseOutcome::default()
    };

    for (i, block) in split_blocks(body).iter().enumerate() {
        match parse_entry(block) {
            Ok(sentence) => outcome.sentences.push(sentence),
            Err(defect) => outcome.errors.push(EntryParseError {
                index: i + 1,
                defect,
            }),
        }
    }

    outcome
}

/// Split off the header if the first line starts with `Language:`
fn split_language_header(text: &str) -> (String, &str) {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    match first.strip_prefix(LANGUAGE_PREFIX) {
        Some(language) => (language.trim().to_string(), rest),
        None => (String::new(), text),
    }
}

/// Group maximal runs of non-blank lines; whitespace-only lines separate blocks
fn split_blocks(body: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Trim the block as a whole; inner line edges are kept so `P: ` with an
/// empty value still carries its prefix
fn trim_block<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut trimmed = lines.to_vec();
    if let Some(first) = trimmed.first_mut() {
        *first = (*first).trim_start();
    }
    if let Some(last) = trimmed.last_mut() {
        *last = (*last).trim_end();
    }
    trimmed
}

fn parse_entry(block: &[&str]) -> Result<SentenceRecord, EntryDefect> {
    let lines = trim_block(block);
    if lines.len() != LINES_PER_ENTRY {
        return Err(EntryDefect::LineCount { got: lines.len() });
    }

    let mut values: [Option<&str>; 3] = [None; 3];
    for line in &lines {
        if let Some((slot, rest)) = ENTRY_PREFIXES
            .iter()
            .enumerate()
            .find_map(|(slot, prefix)| line.strip_prefix(prefix).map(|rest| (slot, rest)))
        {
            values[slot] = Some(rest);
        }
    }

    // With exactly three lines a duplicated prefix always leaves another one absent
    let missing = |slot: usize| EntryDefect::MissingPrefix {
        prefix: ENTRY_PREFIXES[slot].to_string(),
    };
    let target = values[0].ok_or_else(|| missing(0))?;
    let english = values[1].ok_or_else(|| missing(1))?;
    let pronunciation = values[2].ok_or_else(|| missing(2))?;

    Ok(SentenceRecord {
        target: target.to_string(),
        english: english.to_string(),
        pronunciation: pronunciation.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> String {
        format!("T: target {n}\nE: english {n}\nP: pron {n}")
    }

    fn reply(blocks: &[String]) -> String {
        format!("Language: Spanish\n\n{}", blocks.join("\n\n"))
    }

    #[test]
    fn test_single_entry_with_language() {
        let outcome = parse("Language: French\n\nT: Bonjour\nE: Hello\nP: bohn-ZHOOR");
        assert_eq!(outcome.language, "French");
        assert_eq!(
            outcome.sentences,
            vec![SentenceRecord {
                target: "Bonjour".to_string(),
                english: "Hello".to_string(),
                pronunciation: "bohn-ZHOOR".to_string(),
            }]
        );
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_five_well_formed_entries() {
        let blocks: Vec<String> = (1..=5).map(entry).collect();
        let outcome = parse(&reply(&blocks));
        assert_eq!(outcome.sentences.len(), 5);
        assert!(outcome.is_complete());
        assert_eq!(outcome.sentences[0].target, "target 1");
        assert_eq!(outcome.sentences[4].pronunciation, "pron 5");
    }

    #[test]
    fn test_short_block_is_isolated() {
        let mut blocks: Vec<String> = (1..=5).map(entry).collect();
        blocks[2] = "T: target 3\nE: english 3".to_string();
        let outcome = parse(&reply(&blocks));

        let targets: Vec<&str> = outcome.sentences.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, ["target 1", "target 2", "target 4", "target 5"]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            outcome.errors[0].to_string(),
            "entry 3: invalid entry format: expected 3 lines, got 2"
        );
    }

    #[test]
    fn test_duplicate_target_reports_missing_english() {
        let outcome = parse("T: uno\nT: dos\nP: OO-noh");
        assert!(outcome.sentences.is_empty());
        assert_eq!(
            outcome.errors[0].defect,
            EntryDefect::MissingPrefix { prefix: "E: ".to_string() }
        );
        assert_eq!(
            outcome.errors[0].to_string(),
            "entry 1: missing expected line with prefix 'E: '"
        );
    }

    #[test]
    fn test_empty_value_on_inner_line_is_kept() {
        let outcome = parse("T: hola\nP: \nE: hello");
        assert!(outcome.is_complete());
        assert_eq!(outcome.sentences[0].pronunciation, "");
        assert_eq!(outcome.sentences[0].english, "hello");
    }

    #[test]
    fn test_only_block_edges_are_trimmed() {
        let outcome = parse("  T: hola\nE: hello\nP: OH-lah  \n");
        assert_eq!(outcome.sentences[0].target, "hola");
        assert_eq!(outcome.sentences[0].pronunciation, "OH-lah");

        // An indented inner line no longer starts with its prefix
        let outcome = parse("T: hola\n  E: hello\nP: OH-lah");
        assert_eq!(
            outcome.errors[0].defect,
            EntryDefect::MissingPrefix { prefix: "E: ".to_string() }
        );
    }

    #[test]
    fn test_prefixes_in_any_order() {
        let outcome = parse("P: ah-ree-GAH-toh\nT: Arigato\nE: Thank you");
        assert_eq!(outcome.language, "");
        assert_eq!(outcome.sentences[0].english, "Thank you");
        assert_eq!(outcome.sentences[0].pronunciation, "ah-ree-GAH-toh");
    }

    #[test]
    fn test_unprefixed_line_counts_toward_line_total() {
        let outcome = parse("T: hola\nE: hello\nnote: informal");
        assert_eq!(
            outcome.errors[0].defect,
            EntryDefect::MissingPrefix { prefix: "P: ".to_string() }
        );

        let outcome = parse("T: hola\nE: hello\nP: OH-lah\nnote: informal");
        assert_eq!(outcome.errors[0].defect, EntryDefect::LineCount { got: 4 });
    }

    #[test]
    fn test_empty_and_header_only_replies() {
        assert_eq!(parse(""), ParseOutcome::default());

        let outcome = parse("Language: German");
        assert_eq!(outcome.language, "German");
        assert_eq!(outcome.block_count(), 0);

        let outcome = parse("Language: German\n\n\n");
        assert_eq!(outcome.block_count(), 0);
    }

    #[test]
    fn test_extra_blank_lines_do_not_create_blocks() {
        let text = format!("\n\n{}\n\n\n\n{}\n\n", entry(1), entry(2));
        let outcome = parse(&text);
        assert_eq!(outcome.sentences.len(), 2);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_crlf_line_endings() {
        let outcome = parse("Language: Italian\r\n\r\nT: Ciao\r\nE: Hi\r\nP: CHOW\r\n");
        assert_eq!(outcome.language, "Italian");
        assert_eq!(outcome.sentences[0].pronunciation, "CHOW");
    }

    #[test]
    fn test_header_must_be_first_line() {
        let outcome = parse("T: Hallo\nE: Hello\nP: HAH-loh\n\nLanguage: German");
        assert_eq!(outcome.language, "");
        assert_eq!(outcome.sentences.len(), 1);
        assert_eq!(outcome.errors[0].index, 2);
    }

    #[test]
    fn test_errors_keep_block_order() {
        let blocks = vec![
            "T: a".to_string(),
            entry(2),
            "E: b\nE: c\nP: d".to_string(),
            entry(4),
        ];
        let outcome = parse(&reply(&blocks));
        let indices: Vec<usize> = outcome.errors.iter().map(|e| e.index).collect();
        assert_eq!(indices, [1, 3]);
        assert_eq!(outcome.sentences.len(), 2);
    }
}
