//! Output formatting and writing utilities
//!
//! Formats envelopes, parse outcomes and plain data as JSON, YAML or
//! human-readable text, plus the spinner shown while the model works.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use phrasebook_core::{ParseOutcome, ResponseEnvelope, SentenceRecord};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::trace;

/// Trait for formatting output with specialized support for pipeline types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a response envelope
    fn format_envelope(&self, envelope: &ResponseEnvelope, use_color: bool) -> Result<String>;

    /// Format a parse outcome including per-entry errors
    fn format_parse_outcome(&self, outcome: &ParseOutcome, use_color: bool) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => {
                Ok(serde_json::to_string_pretty(value)?)
            }
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_envelope(&self, envelope: &ResponseEnvelope, use_color: bool) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_envelope_human(envelope, use_color)),
            _ => self.format(envelope),
        }
    }

    fn format_parse_outcome(&self, outcome: &ParseOutcome, use_color: bool) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_parse_outcome_human(outcome, use_color)),
            _ => self.format(outcome),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && format == OutputFormat::Human && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message (human format only)
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message (human format only)
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message (human format only)
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message (human format only)
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header (human format only)
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut value_json = serde_json::to_value(value)?;
            redaction::redact_json_value(&mut value_json);
            trace!(data = %value_json, "Outputting data");
        }

        let formatted = self.format.format(value)?;
        self.emit(&formatted)
    }

    /// Write a response envelope
    pub fn envelope(&mut self, envelope: &ResponseEnvelope) -> Result<()> {
        let formatted = self.format.format_envelope(envelope, self.use_color)?;
        self.emit(&formatted)
    }

    /// Write a parse outcome
    pub fn parse_outcome(&mut self, outcome: &ParseOutcome) -> Result<()> {
        let formatted = self.format.format_parse_outcome(outcome, self.use_color)?;
        self.emit(&formatted)
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    // YAML already ends with a newline
    fn emit(&mut self, formatted: &str) -> Result<()> {
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }
}

/// Spinner style used while waiting on the model
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

fn format_envelope_human(envelope: &ResponseEnvelope, use_color: bool) -> String {
    let mut out = String::new();

    let message = if !use_color {
        envelope.message.clone()
    } else if envelope.is_success() {
        envelope.message.green().bold().to_string()
    } else {
        envelope.message.yellow().bold().to_string()
    };
    out.push_str(&message);
    out.push('\n');

    if !envelope.language.is_empty() {
        out.push_str(&format!("Language: {}\n", envelope.language));
    }
    push_sentences(&mut out, &envelope.sentences, use_color);

    out.trim_end().to_string()
}

fn format_parse_outcome_human(outcome: &ParseOutcome, use_color: bool) -> String {
    let mut out = String::new();

    let language = if outcome.language.is_empty() {
        "(none)"
    } else {
        outcome.language.as_str()
    };
    out.push_str(&format!("Language: {}\n", language));
    out.push_str(&format!(
        "Entries: {} parsed, {} failed\n",
        outcome.sentences.len(),
        outcome.errors.len()
    ));
    push_sentences(&mut out, &outcome.sentences, use_color);

    if !outcome.errors.is_empty() {
        out.push('\n');
        for error in &outcome.errors {
            let line = format!("✗ {}", error);
            if use_color {
                out.push_str(&line.red().to_string());
            } else {
                out.push_str(&line);
            }
            out.push('\n');
        }
    }

    out.trim_end().to_string()
}

fn push_sentences(out: &mut String, sentences: &[SentenceRecord], use_color: bool) {
    for (i, sentence) in sentences.iter().enumerate() {
        out.push('\n');
        let target = if use_color {
            sentence.target.bold().to_string()
        } else {
            sentence.target.clone()
        };
        out.push_str(&format!("{}. {}\n", i + 1, target));
        out.push_str(&format!("   {}\n", sentence.english));
        let pronunciation = format!("   /{}/", sentence.pronunciation);
        if use_color {
            out.push_str(&pronunciation.dimmed().to_string());
        } else {
            out.push_str(&pronunciation);
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrasebook_core::{assemble, parse};
    use std::sync::{Arc, Mutex};

    /// Writer that keeps everything in memory for inspection
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    const REPLY: &str = "Language: Spanish\n\nT: Gracias.\nE: Thank you.\nP: GRAH-syahs\n\nT: only one line";

    #[test]
    fn test_human_envelope() {
        let envelope = assemble(parse(REPLY));
        let text = OutputFormat::Human.format_envelope(&envelope, false).unwrap();

        assert!(text.starts_with("Failed to generate examples\nLanguage: Spanish"));
        assert!(text.contains("1. Gracias.\n   Thank you.\n   /GRAH-syahs/"));
    }

    #[test]
    fn test_human_parse_outcome_lists_errors() {
        let text = OutputFormat::Human
            .format_parse_outcome(&parse(REPLY), false)
            .unwrap();

        assert!(text.contains("Entries: 1 parsed, 1 failed"));
        assert!(text.contains("✗ entry 2: invalid entry format: expected 3 lines, got 1"));
    }

    #[test]
    fn test_machine_formats_serialize_envelope() {
        let envelope = assemble(parse(REPLY));

        let json = OutputFormat::Json.format_envelope(&envelope, true).unwrap();
        let back: ResponseEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);

        let yaml = OutputFormat::Yaml.format_envelope(&envelope, true).unwrap();
        assert!(yaml.contains("language: Spanish"));
    }

    #[test]
    fn test_writer_suppresses_chatter_for_machine_formats() {
        let buffer = SharedBuffer::default();
        let mut output =
            OutputWriter::with_writer(OutputFormat::Json, false, false, Box::new(buffer.clone()));

        output.info("working").unwrap();
        output.success("done").unwrap();
        output.data(&serde_json::json!({"valid": true})).unwrap();

        assert_eq!(buffer.contents(), "{\"valid\":true}\n");
        assert!(output.spinner("waiting").is_none());
    }

    #[test]
    fn test_quiet_writer_still_prints_results() {
        let buffer = SharedBuffer::default();
        let mut output =
            OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(buffer.clone()));

        output.info("hidden").unwrap();
        output.envelope(&ResponseEnvelope::error("word cannot be empty")).unwrap();

        assert_eq!(buffer.contents(), "word cannot be empty\n");
    }
}
