//! Command handlers for CLI subcommands
//!
//! Each subcommand lives in its own module; this module re-exports the
//! entry points used by `main`.

mod completions;
mod config;
mod parse;
mod prompt;
mod run;
mod validate;

pub use completions::handle_completions;
pub use config::handle_config;
pub use parse::handle_parse;
pub use prompt::handle_prompt;
pub use run::handle_run;
pub use validate::handle_validate;

use crate::config::Config;
use phrasebook_core::WordValidator;

/// Validator honouring the configured length bounds
fn configured_validator(config: &Config) -> crate::error::Result<WordValidator> {
    config.limits.validate()?;
    Ok(WordValidator::new(config.limits))
}
