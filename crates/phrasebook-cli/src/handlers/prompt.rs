//! Prompt command handler

use super::configured_validator;
use crate::cli::{OutputFormat, PromptArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use phrasebook_core::PromptBuilder;

/// Handle the prompt command
///
/// Shows exactly what would be sent to the model, without sending it.
pub async fn handle_prompt(
    args: PromptArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let word = configured_validator(config)?.validate(&args.word)?;
    let prompts = PromptBuilder::new(config.model.max_new_tokens);

    if args.payload {
        let request = prompts.build_request(&word);
        return match output.format() {
            // The human view of a payload is the exact bytes on the wire
            OutputFormat::Human => {
                let body = request.to_body()?;
                output.writeln(&String::from_utf8_lossy(&body))
            }
            _ => output.data(&request),
        };
    }

    let prompt = prompts.build_prompt(&word);
    match output.format() {
        OutputFormat::Human => {
            output.section(&format!("Prompt for {:?}", word.as_str()))?;
            output.writeln(&prompt)
        }
        _ => output.data(&serde_json::json!({
            "word": word.as_str(),
            "prompt": prompt,
        })),
    }
}
