//! Run command handler

use crate::cli::{OutputFormat, RunArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use phrasebook_core::{HttpResponse, ResponseEnvelope, WordRequest, WordService};
use std::fs;
use tracing::{debug, info, instrument};

/// Handle the run command
///
/// Drives the full service pipeline against the configured model and prints
/// either the envelope or the whole HTTP-style response.
#[instrument(skip_all, fields(source_ip = %args.source_ip))]
pub async fn handle_run(args: RunArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("run_command", &args.word);
    info!("Starting run command execution");

    let service = WordService::from_config(&config.service())?;
    let request = WordRequest::new(args.word.clone(), args.source_ip.clone());

    let spinner = output.spinner("Asking the model for examples...");
    let response = service.handle(&request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    timer.finish();
    debug!(status = response.status_code, "Service responded");

    if let Some(path) = &args.save_to {
        let content = if args.raw {
            serde_json::to_string_pretty(&response)?
        } else {
            response.body.clone()
        };
        fs::write(path, content)?;
        output.success(&format!("✓ Response saved to {}", path.display()))?;
    }

    if args.raw {
        output.data(&response)?;
    } else {
        print_envelope(&response, output)?;
    }

    status_result(&response)
}

fn print_envelope(response: &HttpResponse, output: &mut OutputWriter) -> Result<()> {
    match serde_json::from_str::<ResponseEnvelope>(&response.body) {
        Ok(envelope) => output.envelope(&envelope),
        // The fixed 500 body is not an envelope
        Err(_) if output.format() == OutputFormat::Human => output.error(&response.body),
        Err(_) => output.writeln(&response.body),
    }
}

/// Map a non-200 response onto a failing exit status
fn status_result(response: &HttpResponse) -> Result<()> {
    match response.status_code {
        200 => Ok(()),
        status => Err(Error::RequestFailed { status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_result() {
        let ok = HttpResponse::ok(&ResponseEnvelope::error("Success"));
        assert!(status_result(&ok).is_ok());

        let failed = HttpResponse::internal_error();
        let err = status_result(&failed).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 500");
        assert_eq!(err.exit_code(), 3);
    }
}
