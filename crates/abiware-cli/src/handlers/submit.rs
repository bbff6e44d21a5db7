//! Submit command handler

use crate::cli::{OutputFormat, SubmitArgs};
use crate::config::Config;
use crate::error::Result;
use crate::handlers::utils::{build_client, read_payload};
use crate::logging::Timer;
use crate::output::OutputWriter;
use abiware_core::{dispatch, Endpoint};
use std::fs;
use tracing::{debug, info, instrument};

/// Handle the submit command: token, translation, case creation
#[instrument(skip(args, config, output))]
pub async fn handle_submit(
    args: SubmitArgs,
    config: &Config,
    principal: &str,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::start("submit_command");
    let payload = read_payload(&args.input)?;
    let client = build_client(config)?;
    let policy = config.access_policy();

    if args.show_body {
        let body = client.preview_case(&payload)?;
        output.section("Case Body")?;
        output.case_body(&body)?;
    }

    output.info(&format!("Submitting case to {}", client.submission_url()))?;
    let spinner = output.spinner("Submitting case...");
    let result = dispatch(&client, &policy, principal, Endpoint::SubmitCase, Some(&payload)).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let response = result?;
    info!(elapsed_ms = timer.elapsed().as_millis() as u64, "Case submitted");

    output.success("✓ Case submitted")?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };

    if let Some(path) = args.save_to {
        debug!("Writing response to file: {}", path.display());
        fs::write(&path, &rendered)?;
        output.success(&format!("✓ Response saved to {}", path.display()))?;
    }

    output.section("Platform Response")?;
    match output.format() {
        OutputFormat::Human => output.writeln(&rendered),
        _ => output.data(&response),
    }
}
