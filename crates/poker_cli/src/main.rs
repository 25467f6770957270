//! PokerStars AI CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Configuration error
//! - 4: Upstream model error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod render;
mod settings;

use commands::{Cli, Commands};
use poker_chat::ChatError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIG_ERROR: u8 = 3;
    pub const UPSTREAM_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let result = match cli.command {
        Commands::Chat(args) => commands::chat::execute(args).await,
        Commands::Ask(args) => commands::ask::execute(args).await,
        Commands::Agents(args) => commands::agents::execute(args).await,
        Commands::Models => commands::models::execute().await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Logs go to stderr so the chat owns stdout
fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,poker_chat={level},pokerstars_ai={level}",
            level = default_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let chat_error = e.chain().find_map(|cause| cause.downcast_ref::<ChatError>());

    match chat_error {
        Some(ChatError::Config(_)) | Some(ChatError::LlmNotConfigured) => ExitCodes::CONFIG_ERROR,
        Some(ChatError::InvalidInput(_)) => ExitCodes::INVALID_ARGS,
        Some(err) if err.is_upstream() => ExitCodes::UPSTREAM_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
