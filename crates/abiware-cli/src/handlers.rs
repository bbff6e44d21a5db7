//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod preview;
mod submit;
mod token;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use preview::handle_preview;
pub use submit::handle_submit;
pub use token::handle_token;
