//! Core types for the chat session.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};

/// Unique identifier for a chat session
pub type SessionId = String;

/// Display name used for answers produced without a selected agent
pub const DEFAULT_ASSISTANT_NAME: &str = "Asistente PokerStars";

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

impl MessageRole {
    /// Wire name used by chat-completion APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Assistant => "assistant",
            Self::User => "user",
        }
    }
}

/// A single turn in the transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message ID (UUID)
    pub id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// Who answered; only set on assistant messages
    #[serde(rename = "responderName", default, skip_serializing_if = "Option::is_none")]
    pub responder_name: Option<String>,
    /// When the message was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_role(role: MessageRole, content: String, responder_name: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            responder_name,
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content.into(), None)
    }

    /// Create a new assistant message tagged with the responder's display name
    pub fn assistant(content: impl Into<String>, responder_name: impl Into<String>) -> Self {
        Self::with_role(
            MessageRole::Assistant,
            content.into(),
            Some(responder_name.into()),
        )
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content.into(), None)
    }
}

/// Role-specialized agents a user can talk to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Coach,
    HandEvaluator,
    PlaySimulator,
    TechSupport,
}

impl AgentKind {
    /// Every agent, in presentation order
    pub const ALL: [AgentKind; 4] = [
        Self::Coach,
        Self::HandEvaluator,
        Self::PlaySimulator,
        Self::TechSupport,
    ];

    /// Get the display name for this agent
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Coach => "Coach Poker",
            Self::HandEvaluator => "Evaluador Mano",
            Self::PlaySimulator => "Simulador Jugada",
            Self::TechSupport => "Soporte Técnico",
        }
    }

    /// Short identifier used on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Coach => "coach",
            Self::HandEvaluator => "evaluador",
            Self::PlaySimulator => "simulador",
            Self::TechSupport => "soporte",
        }
    }

    /// Icon shown next to the agent in menus
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Coach => "🧠",
            Self::HandEvaluator => "🃏",
            Self::PlaySimulator => "🎲",
            Self::TechSupport => "🛠",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AgentKind {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        let found = match needle.as_str() {
            "coach" | "coach poker" => Some(Self::Coach),
            "evaluador" | "evaluator" | "evaluador mano" | "hand_evaluator" => {
                Some(Self::HandEvaluator)
            }
            "simulador" | "simulator" | "simulador jugada" | "play_simulator" => {
                Some(Self::PlaySimulator)
            }
            "soporte" | "support" | "soporte técnico" | "soporte tecnico" | "tech_support" => {
                Some(Self::TechSupport)
            }
            _ => None,
        };
        found.ok_or_else(|| ChatError::InvalidInput(format!("unknown agent: {}", s.trim())))
    }
}

/// Who answers the next turn: the default assistant or a named agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Responder {
    Default,
    Agent(AgentKind),
}

impl Responder {
    /// Name attached to the answers this responder produces
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Default => DEFAULT_ASSISTANT_NAME,
            Self::Agent(agent) => agent.display_name(),
        }
    }

    /// The selected agent, if any
    pub fn agent(&self) -> Option<AgentKind> {
        match self {
            Self::Default => None,
            Self::Agent(agent) => Some(*agent),
        }
    }

    /// Line shown when the user starts talking to this responder
    pub fn announcement(&self) -> String {
        match self {
            Self::Default => "Estás hablando con el asistente de PokerStars.".to_string(),
            Self::Agent(agent) => format!("Estás conversando con el agente: {}", agent),
        }
    }
}

impl From<Option<AgentKind>> for Responder {
    fn from(agent: Option<AgentKind>) -> Self {
        agent.map_or(Self::Default, Self::Agent)
    }
}

/// Satisfaction rating on a 1 to 5 scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate and wrap a rating value
    pub fn new(value: u8) -> ChatResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ChatError::InvalidInput(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = ChatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl FromStr for Rating {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| ChatError::InvalidInput(format!("rating is not a number: {}", s.trim())))?;
        Self::new(value)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
