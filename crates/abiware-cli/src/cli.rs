//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Abiware connector CLI - fetch tokens, preview and submit cases
///
/// Authenticates against the Abiware platform with an OAuth2 password grant
/// and turns flat inbound payloads into case creation requests.
#[derive(Parser, Debug)]
#[command(
    name = "abiware",
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
    #[arg(short, long, global = true, env = "ABIWARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results (defaults to the configured format)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Name the access policy checks for token and submit calls
    #[arg(long, global = true, env = "ABIWARE_PRINCIPAL")]
    pub principal: Option<String>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Request an access token and print the authentication server's answer
    Token(TokenArgs),

    /// Show the case body a payload translates to, without sending it
    Preview(PreviewArgs),

    /// Translate a payload and create the case on the platform
    Submit(SubmitArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Where the inbound payload comes from
#[derive(Args, Debug, Clone, Default)]
pub struct PayloadInput {
    /// Payload file (JSON or YAML object, or form-urlencoded with --form).
    /// Reads stdin when omitted or "-".
    #[arg(value_name = "PAYLOAD")]
    pub payload: Option<PathBuf>,

    /// Parse the payload as an application/x-www-form-urlencoded body
    #[arg(long)]
    pub form: bool,

    /// Add or override a payload field (repeatable)
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub fields: Vec<(String, String)>,
}

/// Arguments for the token command
#[derive(Parser, Debug)]
pub struct TokenArgs {
    /// Replace token values with *** before printing
    #[arg(long)]
    pub redact: bool,

    /// Save the token response to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the preview command
#[derive(Parser, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: PayloadInput,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the submit command
#[derive(Parser, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub input: PayloadInput,

    /// Show the translated body before sending it
    #[arg(long)]
    pub show_body: bool,

    /// Save the platform response to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
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
    /// Write a configuration file with placeholder values
    Init(ConfigInitArgs),

    /// Show current configuration values (password redacted)
    Show(ConfigShowArgs),

    /// Validate current configuration
    Validate,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Write to the user config directory instead of the current directory
    #[arg(long, conflicts_with = "path")]
    pub user: bool,

    /// Explicit destination; the extension picks the format
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
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

/// Parse a `KEY=VALUE` pair. The value may itself contain `=`.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    if key.trim().is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{}`", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
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

    /// Caller identity for the access policy: `--principal`, then the
    /// login name from the environment
    pub fn principal(&self) -> String {
        self.principal
            .clone()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "anonymous".to_string())
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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["abiware", "-vv", "token"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["abiware", "--quiet", "token"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_submit_arguments() {
        let cli = Cli::parse_from([
            "abiware",
            "--principal",
            "guichet",
            "submit",
            "payload.txt",
            "--form",
            "--set",
            "dossierCode=PU",
            "-s",
            "user_request=REF1 || a=b",
        ]);
        assert_eq!(cli.principal(), "guichet");

        let Commands::Submit(args) = cli.command else {
            panic!("expected submit command");
        };
        assert_eq!(args.input.payload, Some(PathBuf::from("payload.txt")));
        assert!(args.input.form);
        assert_eq!(
            args.input.fields,
            vec![
                ("dossierCode".to_string(), "PU".to_string()),
                ("user_request".to_string(), "REF1 || a=b".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_key_val() {
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=value").is_err());
        assert_eq!(
            parse_key_val("key=").unwrap(),
            ("key".to_string(), String::new())
        );
    }

    #[test]
    fn test_output_format_is_optional() {
        let cli = Cli::parse_from(["abiware", "preview"]);
        assert_eq!(cli.output, None);

        let cli = Cli::parse_from(["abiware", "-o", "json-pretty", "preview"]);
        assert_eq!(cli.output, Some(OutputFormat::JsonPretty));
    }
}
