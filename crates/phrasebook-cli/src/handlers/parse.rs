//! Parse command handler

use crate::cli::ParseArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use phrasebook_core::{decode_reply, parse, ParseOutcome};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Handle the parse command
///
/// Reads a saved reply from a file or stdin and prints what the parser
/// makes of it, including the per-entry errors the service only logs.
pub async fn handle_parse(
    args: ParseArgs,
    _config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let source = args
        .file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdin".to_string());
    let timer = Timer::with_details("parse_reply", &source);

    let raw = read_input(args.file.as_deref())?;
    debug!(bytes = raw.len(), envelope = args.envelope, "Read model reply");

    let outcome = parse_input(&raw, args.envelope)?;
    info!(
        language = %outcome.language,
        parsed = outcome.sentences.len(),
        failed = outcome.errors.len(),
        "Reply parsed"
    );
    timer.finish();

    output.parse_outcome(&outcome)
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Ok(std::fs::read(path)?)
        }
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Decode the provider envelope if asked to, then parse the text
fn parse_input(raw: &[u8], envelope: bool) -> Result<ParseOutcome> {
    let text = if envelope {
        decode_reply(raw)?
    } else {
        String::from_utf8(raw.to_vec())
            .map_err(|e| Error::other(format!("Reply is not valid UTF-8: {}", e)))?
    };
    Ok(parse(&text))
}
