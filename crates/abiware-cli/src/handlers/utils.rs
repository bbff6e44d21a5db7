//! Shared utilities for command handlers

use crate::cli::{OutputFormat, PayloadInput};
use crate::config::Config;
use crate::error::{Error, Result};
use abiware_core::{AbiwareClient, InboundPayload};
use is_terminal::IsTerminal;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read the inbound payload from a file or stdin, then apply `--set` fields
pub fn read_payload(input: &PayloadInput) -> Result<InboundPayload> {
    let mut payload = match input.payload.as_deref().filter(|p| *p != Path::new("-")) {
        Some(path) => {
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            let content = fs::read_to_string(path)?;
            debug!(path = %path.display(), bytes = content.len(), "Payload file read");
            parse_payload(&content, Some(path), input.form)?
        }
        None if input.payload.is_none() && std::io::stdin().is_terminal() => {
            if input.fields.is_empty() {
                return Err(Error::invalid_args(
                    "no payload given: pass a file, pipe one on stdin, or use --set KEY=VALUE",
                ));
            }
            InboundPayload::new()
        }
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            debug!(bytes = content.len(), "Payload read from stdin");
            parse_payload(&content, None, input.form)?
        }
    };

    for (key, value) in &input.fields {
        payload.insert(key.clone(), value.clone());
    }
    Ok(payload)
}

/// Parse payload text. `--form` wins; otherwise YAML files are recognized by
/// extension and everything else is JSON.
pub fn parse_payload(content: &str, path: Option<&Path>, form: bool) -> Result<InboundPayload> {
    if form {
        return Ok(InboundPayload::from_form_urlencoded(content));
    }

    let source_path = || path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("<stdin>"));

    if path.is_some_and(is_yaml) {
        let value: Value = serde_yaml::from_str(content).map_err(|e| Error::InvalidFormat {
            path: source_path(),
            expected: "YAML".to_string(),
            source: e.into(),
        })?;
        return match value {
            Value::Object(fields) => Ok(fields.into_iter().collect()),
            _ => Err(Error::InvalidFormat {
                path: source_path(),
                expected: "YAML mapping".to_string(),
                source: anyhow::anyhow!("payload must be a mapping of field names to values"),
            }),
        };
    }

    InboundPayload::from_json_str(content).map_err(|e| match e {
        abiware_core::Error::Json { .. } => Error::InvalidFormat {
            path: source_path(),
            expected: "JSON".to_string(),
            source: e.into(),
        },
        other => Error::Core(other),
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Client built from validated configuration
pub fn build_client(config: &Config) -> Result<AbiwareClient> {
    Ok(AbiwareClient::new(config.to_settings()?)?)
}

/// Write `value` to `path`, as YAML when the output format asks for it
pub fn save_output<T: Serialize>(path: &Path, value: &T, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty | OutputFormat::Human => serde_json::to_string_pretty(value)?,
    };
    debug!(path = %path.display(), "Writing output file");
    fs::write(path, content)?;
    Ok(())
}
