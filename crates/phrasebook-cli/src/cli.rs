//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Phrasebook CLI - Example sentences for any word, from a generative model
///
/// Validates a word, asks the configured model which language it belongs to
/// and for five usage examples, and prints the parsed result.
#[derive(Parser, Debug)]
#[command(
    name = "phrasebook",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PHRASEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a word against the input rules
    Validate(ValidateArgs),

    /// Show the prompt or request payload that would be sent for a word
    Prompt(PromptArgs),

    /// Parse a saved model reply into sentence records
    Parse(ParseArgs),

    /// Generate examples for a word using the configured model
    Run(RunArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// The word to check (may be percent-encoded)
    #[arg(value_name = "WORD")]
    pub word: String,
}

/// Arguments for the prompt command
#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// The word to render (may be percent-encoded)
    #[arg(value_name = "WORD")]
    pub word: String,

    /// Print the full JSON request payload instead of the prompt text
    #[arg(long)]
    pub payload: bool,
}

/// Arguments for the parse command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// File holding the model reply text; reads stdin when omitted
    #[arg(value_name = "REPLY_FILE")]
    pub file: Option<PathBuf>,

    /// Treat the input as the provider's JSON reply envelope
    #[arg(long)]
    pub envelope: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// The word to generate examples for (may be percent-encoded)
    #[arg(value_name = "WORD")]
    pub word: String,

    /// Caller address recorded in logs and notifications
    #[arg(long, default_value = "127.0.0.1")]
    pub source_ip: String,

    /// Print the full HTTP-style response (status, headers, body)
    #[arg(long)]
    pub raw: bool,

    /// Save the response envelope to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
