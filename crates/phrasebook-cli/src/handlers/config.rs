//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigInitArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::redaction;
use crate::output::OutputWriter;

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output).await,
        ConfigAction::Show => handle_config_show(config, output).await,
    }
}

/// Handle config init subcommand
async fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Secrets are best kept in the environment or a .env file.")?;

    Ok(())
}

/// Handle config show subcommand
///
/// Shows the effective configuration after file and environment merging,
/// with secrets masked.
async fn handle_config_show(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let mut value = serde_json::to_value(config)?;
    redaction::redact_json_value(&mut value);

    match output.format() {
        OutputFormat::Human => {
            output.section("Effective configuration")?;
            let yaml = serde_yaml::to_string(&value)?;
            output.write(&yaml)
        }
        _ => output.data(&value),
    }
}
