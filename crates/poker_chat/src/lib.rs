//! # poker_chat - Chat front-end core for PokerStars AI
//!
//! This crate provides the conversation core behind the PokerStars AI chat:
//! - A session state machine (`Idle → Chatting → FeedbackPending → Finished`)
//! - A default rules assistant that sees the whole transcript
//! - Four role-specialized agents that answer only the latest utterance
//! - A feedback step that stores a 1 to 5 rating and a comment
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ ChatController  │────▶│    Dispatch     │────▶│  ChatCompletion │
//! │ (state machine) │     │ default / agent │     │   (Groq, ...)   │
//! └────────┬────────┘     └─────────────────┘     └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  FeedbackSink   │  Sheets / JSONL
//! └─────────────────┘
//! ```

pub mod agents;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod feedback;
pub mod llm;
pub mod models;
pub mod session;
pub mod state_machine;
pub mod types;

pub use agents::*;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use feedback::*;
pub use llm::*;
pub use models::*;
pub use session::*;
pub use state_machine::*;
pub use types::*;
