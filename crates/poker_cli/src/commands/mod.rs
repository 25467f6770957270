//! CLI command definitions.
//!
//! Each subcommand maps to one way of talking to the PokerStars assistant.

use clap::{Parser, Subcommand};

pub mod agents;
pub mod ask;
pub mod chat;
pub mod models;

/// PokerStars AI - Poker rules assistant and specialized agents
#[derive(Parser)]
#[command(name = "pokerstars-ai")]
#[command(version, about = "PokerStars AI - Poker rules assistant and specialized agents")]
#[command(long_about = r#"
PokerStars AI is a terminal chat with a poker rules assistant and four
specialized agents: strategy coach, hand evaluator, play simulator and
technical support.

COMMANDS:
  chat    → Interactive chat; type 'salir' to finish and rate the service
  ask     → One question, one answer
  agents  → List the assistant and the agents
  models  → List the selectable models

ENVIRONMENT:
  GROQ_API_KEY                 Chat-completion credential
  POKERSTARS_MODEL             Model override
  SHEET_ID                     Spreadsheet that receives feedback
  GOOGLE_SHEETS_CREDENTIALS   Service-account key (inline JSON or file path)
  GOOGLE_SHEETS_ACCESS_TOKEN   Bearer token for the spreadsheet API; wins over the key

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration error
  4 - Upstream model error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat
    Chat(chat::ChatArgs),

    /// Ask a single question
    Ask(ask::AskArgs),

    /// List the assistant and the agents
    Agents(agents::AgentsArgs),

    /// List the selectable models
    Models,
}
