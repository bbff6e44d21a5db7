//! Token command handler

use crate::cli::TokenArgs;
use crate::config::Config;
use crate::error::Result;
use crate::handlers::utils::{build_client, save_output};
use crate::logging::{redaction, Timer};
use crate::output::OutputWriter;
use abiware_core::{dispatch, Endpoint};
use tracing::{info, instrument};

/// Handle the token command: a diagnostic password-grant exchange
#[instrument(skip(args, config, output))]
pub async fn handle_token(
    args: TokenArgs,
    config: &Config,
    principal: &str,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::start("token_command");
    let client = build_client(config)?;
    let policy = config.access_policy();

    output.info(&format!(
        "Requesting token from {} as {}",
        client.settings().credentials.auth_server_url,
        client.settings().credentials.username
    ))?;

    let spinner = output.spinner("Requesting access token...");
    let result = dispatch(&client, &policy, principal, Endpoint::GetToken, None).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let mut response = result?;
    info!("Token response received");

    if args.redact {
        redaction::redact_json_value(&mut response);
    }

    if response.get("access_token").is_none() {
        output.warning("The response carries no access_token; case submission would fail")?;
    }

    if let Some(path) = args.save_to {
        save_output(&path, &response, output.format())?;
        output.success(&format!("✓ Token response saved to {}", path.display()))?;
    }

    output.section("Token Response")?;
    output.data(&response)
}
