//! Session state machine.
//!
//! `transition` is the only function that mutates a [`SessionState`]. It
//! performs no I/O: collaborator calls are returned as [`Effect`]s and their
//! results come back as [`Event`]s.
//!
//! ```text
//! Idle ──select/text──▶ Chatting ──"salir"──▶ FeedbackPending ──submit/dismiss──▶ Finished
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::DEFAULT_SYSTEM_PROMPT;
use crate::config::DEFAULT_EXIT_KEYWORD;
use crate::types::{AgentKind, Message, Rating, Responder, SessionId};

/// Lifecycle phase, derived from the session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Chatting,
    FeedbackPending,
    Finished,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User events
    /// `None` selects the default assistant
    SelectAgent(Option<AgentKind>),
    SubmitText(String),
    SubmitFeedback { rating: Rating, comment: String },
    DismissFeedback,

    // Collaborator results
    ResponseReady { text: String },
    ResponseFailed { message: String },
    FeedbackRecorded,
    FeedbackFailed { message: String },
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Self::SelectAgent(_) => "select_agent",
            Self::SubmitText(_) => "submit_text",
            Self::SubmitFeedback { .. } => "submit_feedback",
            Self::DismissFeedback => "dismiss_feedback",
            Self::ResponseReady { .. } => "response_ready",
            Self::ResponseFailed { .. } => "response_failed",
            Self::FeedbackRecorded => "feedback_recorded",
            Self::FeedbackFailed { .. } => "feedback_failed",
        }
    }
}

/// Effects to be executed after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the responder dispatch for an answer to the latest user turn
    RequestResponse { agent: Option<AgentKind> },
    /// Hand a rating to the feedback sink
    RecordFeedback { rating: Rating, comment: String },
    /// Show something to the user
    Notify(Notice),
}

/// User-facing notices produced by transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FeedbackRequested,
    FeedbackThanks,
    FeedbackClosed,
    SessionFinished,
    UpstreamFailure { message: String },
    PersistenceFailure { message: String },
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Self::FeedbackRequested => {
                "📝 Valoración del Servicio: ¿Qué tan satisfecho estás con nuestro chatbot? (1-5)"
                    .to_string()
            }
            Self::FeedbackThanks => "¡Gracias por tu valoración!".to_string(),
            Self::FeedbackClosed => "Valoración cerrada.".to_string(),
            Self::SessionFinished => {
                "El chat ha finalizado. Gracias por utilizar nuestro servicio.".to_string()
            }
            Self::UpstreamFailure { message } => {
                format!("No se pudo obtener una respuesta: {}", message)
            }
            Self::PersistenceFailure { message } => {
                format!("No se pudo guardar la valoración: {}", message)
            }
        }
    }

    /// Whether the notice reports a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFailure { .. } | Self::PersistenceFailure { .. }
        )
    }
}

/// Events rejected by the state machine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("The chat has finished; no further input is accepted")]
    SessionFinished,
    #[error("A response is still pending for the previous message")]
    AwaitingResponse,
    #[error("Invalid transition: {event} while {phase:?}")]
    InvalidTransition { event: &'static str, phase: Phase },
}

/// Conversation state of one user session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    id: SessionId,
    transcript: Vec<Message>,
    selected_agent: Option<AgentKind>,
    first_interaction_started: bool,
    feedback_pending: bool,
    session_finished: bool,
    last_shown_agent: Option<AgentKind>,
    /// Responder whose answer is outstanding
    pending_responder: Option<Responder>,
    exit_keyword: String,
    created_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_EXIT_KEYWORD)
    }
}

impl SessionState {
    /// Fresh session whose transcript holds only the System preamble
    pub fn new(exit_keyword: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            transcript: vec![Message::system(DEFAULT_SYSTEM_PROMPT)],
            selected_agent: None,
            first_interaction_started: false,
            feedback_pending: false,
            session_finished: false,
            last_shown_agent: None,
            pending_responder: None,
            exit_keyword: exit_keyword.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Full transcript, System preamble included
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Turns shown to the user; the System preamble is never one of them
    pub fn visible_turns(&self) -> &[Message] {
        self.transcript.get(1..).unwrap_or(&[])
    }

    pub fn selected_agent(&self) -> Option<AgentKind> {
        self.selected_agent
    }

    pub fn first_interaction_started(&self) -> bool {
        self.first_interaction_started
    }

    pub fn feedback_pending(&self) -> bool {
        self.feedback_pending
    }

    pub fn session_finished(&self) -> bool {
        self.session_finished
    }

    pub fn last_shown_agent(&self) -> Option<AgentKind> {
        self.last_shown_agent
    }

    pub fn exit_keyword(&self) -> &str {
        &self.exit_keyword
    }

    /// Whether an answer is outstanding for the latest user turn
    pub fn awaiting_response(&self) -> bool {
        self.pending_responder.is_some()
    }

    pub fn phase(&self) -> Phase {
        if self.session_finished {
            Phase::Finished
        } else if self.feedback_pending {
            Phase::FeedbackPending
        } else if self.first_interaction_started {
            Phase::Chatting
        } else {
            Phase::Idle
        }
    }

    /// Whether `text` is the termination keyword (trimmed, case-insensitive)
    pub fn is_exit_keyword(&self, text: &str) -> bool {
        text.trim().to_lowercase() == self.exit_keyword.trim().to_lowercase()
    }

    /// Responder to announce when the selection changed since the last announcement.
    ///
    /// Syncs `last_shown_agent` so the same selection is announced only once.
    pub fn take_announcement(&mut self) -> Option<Responder> {
        if self.selected_agent == self.last_shown_agent {
            return None;
        }
        self.last_shown_agent = self.selected_agent;
        Some(Responder::from(self.selected_agent))
    }

    fn reject(&self, event: &Event) -> TransitionError {
        TransitionError::InvalidTransition {
            event: event.name(),
            phase: self.phase(),
        }
    }

    fn finish(&mut self) {
        self.feedback_pending = false;
        self.session_finished = true;
    }
}

/// Apply one event to the session.
///
/// A rejected event leaves the state untouched.
pub fn transition(state: &mut SessionState, event: Event) -> Result<Vec<Effect>, TransitionError> {
    if state.session_finished {
        return Err(TransitionError::SessionFinished);
    }

    match event {
        Event::SelectAgent(agent) => {
            if state.feedback_pending {
                return Err(state.reject(&Event::SelectAgent(agent)));
            }
            state.selected_agent = agent;
            state.first_interaction_started = true;
            Ok(vec![])
        }

        Event::SubmitText(text) => {
            if text.trim().is_empty() {
                return Ok(vec![]);
            }
            if state.pending_responder.is_some() {
                return Err(TransitionError::AwaitingResponse);
            }

            if state.is_exit_keyword(&text) {
                // Already asking for feedback
                if state.feedback_pending {
                    return Ok(vec![]);
                }
                state.first_interaction_started = true;
                state.feedback_pending = true;
                return Ok(vec![Effect::Notify(Notice::FeedbackRequested)]);
            }

            // Chatting stays open while the feedback step is shown
            state.first_interaction_started = true;

            state.transcript.push(Message::user(text));
            state.pending_responder = Some(Responder::from(state.selected_agent));
            Ok(vec![Effect::RequestResponse {
                agent: state.selected_agent,
            }])
        }

        Event::ResponseReady { text } => {
            let Some(responder) = state.pending_responder.take() else {
                return Err(state.reject(&Event::ResponseReady { text }));
            };
            state
                .transcript
                .push(Message::assistant(text, responder.display_name()));
            Ok(vec![])
        }

        Event::ResponseFailed { message } => {
            if state.pending_responder.take().is_none() {
                return Err(state.reject(&Event::ResponseFailed { message }));
            }
            // The user turn stays in the transcript, unanswered
            Ok(vec![Effect::Notify(Notice::UpstreamFailure { message })])
        }

        Event::SubmitFeedback { rating, comment } => {
            if !state.feedback_pending {
                return Err(state.reject(&Event::SubmitFeedback { rating, comment }));
            }
            Ok(vec![Effect::RecordFeedback { rating, comment }])
        }

        Event::FeedbackRecorded => {
            if !state.feedback_pending {
                return Err(state.reject(&Event::FeedbackRecorded));
            }
            state.finish();
            Ok(vec![
                Effect::Notify(Notice::FeedbackThanks),
                Effect::Notify(Notice::SessionFinished),
            ])
        }

        Event::FeedbackFailed { message } => {
            if !state.feedback_pending {
                return Err(state.reject(&Event::FeedbackFailed { message }));
            }
            Ok(vec![Effect::Notify(Notice::PersistenceFailure { message })])
        }

        Event::DismissFeedback => {
            if !state.feedback_pending {
                return Err(state.reject(&Event::DismissFeedback));
            }
            state.finish();
            Ok(vec![
                Effect::Notify(Notice::FeedbackClosed),
                Effect::Notify(Notice::SessionFinished),
            ])
        }
    }
}
