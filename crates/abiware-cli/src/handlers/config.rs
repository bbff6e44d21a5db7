//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigInitArgs, ConfigShowArgs};
use crate::config::{Config, ENV_VARS};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::PathBuf;

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Validate => handle_config_validate(config, output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match (args.path, args.user) {
        (Some(path), _) => path,
        (None, true) => Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
        (None, false) => PathBuf::from(".abiware.toml"),
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::template().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Replace the placeholder URLs and credentials before use.")?;
    output.info("The password can also be supplied through ABIWARE_PASSWORD.")?;

    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let content = config.redacted().to_string_as(args.format)?;
    output.writeln(content.trim_end())
}

/// Handle config validate subcommand
fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    output.info("Validating configuration...")?;

    match config.validate() {
        Ok(()) => {
            output.success("✓ Configuration is valid")?;
        }
        Err(e) => {
            output.error(&format!("✗ Configuration validation failed: {}", e))?;
            return Err(e);
        }
    }

    output.section("Configuration Sources")?;

    if let Some(user_path) = Config::user_config_path() {
        let exists = if user_path.exists() { "✓" } else { "✗" };
        output.info(&format!("{} User config: {}", exists, user_path.display()))?;
    }

    if let Some(project_path) = Config::find_project_config() {
        output.info(&format!("✓ Project config: {}", project_path.display()))?;
    } else {
        output.info("✗ No project config found")?;
    }

    let active: Vec<(&str, String)> = ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok().map(|value| (*var, value)))
        .collect();

    if !active.is_empty() {
        output.section("Active Environment Variables")?;
        for (var, value) in active {
            let shown = if var == "ABIWARE_PASSWORD" { "***".to_string() } else { value };
            output.info(&format!("• {} = {}", var, shown))?;
        }
    }

    let policy = config.access_policy();
    if policy.is_open() {
        output.info("Access: every principal may call the connector")?;
    } else {
        output.info(&format!(
            "Access: restricted to {}",
            config.access.allowed_principals.join(", ")
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ConfigFormat, OutputFormat};
    use tempfile::TempDir;

    fn silent_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_init_writes_template_and_respects_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abiware.yaml");
        let mut output = silent_output();

        let args = || ConfigInitArgs {
            user: false,
            path: Some(path.clone()),
            force: false,
        };

        handle_config_init(args(), &mut output).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::template());

        std::fs::write(&path, "connector: {client_id: kept}\n").unwrap();
        handle_config_init(args(), &mut output).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().connector.client_id, "kept");

        handle_config_init(ConfigInitArgs { force: true, ..args() }, &mut output).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::template());
    }

    #[test]
    fn test_validate_fails_on_default_config() {
        let mut output = silent_output();
        assert!(handle_config_validate(&Config::default(), &mut output).is_err());
        assert!(handle_config_validate(&Config::template(), &mut output).is_ok());
    }

    #[test]
    fn test_show_does_not_fail() {
        let mut output = silent_output();
        let args = ConfigShowArgs {
            format: ConfigFormat::Json,
        };
        assert!(handle_config_show(args, &Config::template(), &mut output).is_ok());
    }
}
