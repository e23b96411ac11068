//! Phrasebook CLI - example sentences for any word
//!
//! This is the main entry point for the Phrasebook CLI application, providing
//! commands for validating words, previewing prompts, parsing model replies,
//! and running the full generation pipeline.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{redaction, timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Set up colored output
    control::set_override(cli.use_color());

    // Configuration feeds logging, so load it before any subscriber exists
    let config = Config::load_with_file(cli.config.as_deref());

    if let Err(e) = init_logging(&cli, config.as_ref().ok()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            let message = error::format_error(&e, control::SHOULD_COLORIZE.should_colorize());
            eprintln!("{}", redaction::redact_sensitive(&message));
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(
        verbosity = cli.verbosity_level(),
        format = ?cli.output,
        "Executing command"
    );

    match cli.command {
        Commands::Validate(args) => handlers::handle_validate(args, &config, &mut output).await,
        Commands::Prompt(args) => handlers::handle_prompt(args, &config, &mut output).await,
        Commands::Parse(args) => handlers::handle_parse(args, &config, &mut output).await,
        Commands::Run(args) => handlers::handle_run(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<()> {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);

    if let Some(config) = config {
        logging_config.apply_settings(&config.logging, verbosity);
    }

    // Apply environment overrides
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(&logging_config)
}
