//! Preview command handler

use crate::cli::PreviewArgs;
use crate::error::Result;
use crate::handlers::utils::{read_payload, save_output};
use crate::output::OutputWriter;
use tracing::{debug, instrument};

/// Handle the preview command. Translation only, no network access and no
/// connector configuration required.
#[instrument(skip(args, output))]
pub async fn handle_preview(args: PreviewArgs, output: &mut OutputWriter) -> Result<()> {
    let payload = read_payload(&args.input)?;
    debug!(fields = payload.len(), "Translating payload");

    let body = abiware_core::preview_case(&payload)?;
    output.success(&format!(
        "✓ Payload translated ({} contact(s))",
        body.contacts.len()
    ))?;

    output.section("Case Body")?;
    output.case_body(&body)?;

    if let Some(path) = args.output_file {
        save_output(&path, &body, output.format())?;
        output.success(&format!("✓ Output saved to {}", path.display()))?;
    }

    Ok(())
}
