//! Abiware CLI - command-line front end for the Abiware connector
//!
//! This is the main entry point for the `abiware` binary, providing
//! commands for fetching tokens, previewing case translations and
//! submitting cases to the platform.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands, OutputFormat};
use colored::control;
use config::Config;
use error::Result;
use logging::{LoggingConfig, Timer};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    // Variables from a local .env file, if present
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let config = Config::load_with_file(cli.config.as_deref());

    let use_color = cli.use_color()
        && config.as_ref().map(|c| c.output.color).unwrap_or(true);
    control::set_override(use_color);

    if let Err(e) = init_logging(&cli, config.as_ref().ok()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match config {
        Ok(config) => run(cli, config, use_color).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", error::format_error(&e, use_color));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli, config, use_color), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config, use_color: bool) -> Result<()> {
    let _timer = Timer::start("cli_execution");

    let format = cli
        .output
        .or_else(|| config.output.output_format().ok())
        .unwrap_or(OutputFormat::Human);
    let mut output = OutputWriter::new(format, use_color, cli.quiet, config.output.progress);
    let principal = cli.principal();

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        principal = %principal,
        "Executing command"
    );

    match cli.command {
        Commands::Token(args) => {
            handlers::handle_token(args, &config, &principal, &mut output).await
        }
        Commands::Preview(args) => handlers::handle_preview(args, &mut output).await,
        Commands::Submit(args) => {
            handlers::handle_submit(args, &config, &principal, &mut output).await
        }
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<()> {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);

    if let Some(config) = config {
        logging_config.apply_file_settings(&config.logging, verbosity);
    }

    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
