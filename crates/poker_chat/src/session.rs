//! Chat session controller.
//!
//! Couples a [`SessionState`] with a responder dispatch and a feedback sink.
//! Each call feeds one user event through [`transition`], runs the effects it
//! yields and feeds their results back until the queue is empty.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::dispatch::Dispatch;
use crate::error::ChatResult;
use crate::feedback::{FeedbackRecord, FeedbackSink};
use crate::state_machine::{transition, Effect, Event, Notice, Phase, SessionState};
use crate::types::{AgentKind, Message, MessageRole, Rating, Responder};

/// What one user event changed, for the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Messages appended to the transcript by this event
    pub appended: Vec<Message>,
    pub notices: Vec<Notice>,
    /// Responder to announce, when the selection changed
    pub announcement: Option<Responder>,
    pub phase: Phase,
}

impl TurnOutcome {
    /// The assistant answer produced by this event, if any
    pub fn reply(&self) -> Option<&Message> {
        self.appended
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }
}

/// Drives one chat session
pub struct ChatController<D, F> {
    state: SessionState,
    dispatch: D,
    sink: F,
}

impl<D: Dispatch, F: FeedbackSink> ChatController<D, F> {
    /// Start a fresh session with the default termination keyword
    pub fn new(dispatch: D, sink: F) -> Self {
        Self::with_state(SessionState::default(), dispatch, sink)
    }

    /// Start a fresh session honoring the configured termination keyword
    pub fn from_config(config: &ChatConfig, dispatch: D, sink: F) -> Self {
        Self::with_state(SessionState::new(config.exit_keyword.clone()), dispatch, sink)
    }

    /// Resume an existing session
    pub fn with_state(state: SessionState, dispatch: D, sink: F) -> Self {
        info!(session = %state.id(), phase = ?state.phase(), "chat session ready");
        Self {
            state,
            dispatch,
            sink,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Select an agent, or the default assistant with `None`
    pub async fn select_agent(&mut self, agent: Option<AgentKind>) -> ChatResult<TurnOutcome> {
        self.process(Event::SelectAgent(agent)).await
    }

    /// Submit one line of user text
    pub async fn submit_text(&mut self, text: &str) -> ChatResult<TurnOutcome> {
        self.process(Event::SubmitText(text.to_string())).await
    }

    /// Submit the satisfaction rating and an optional comment
    pub async fn submit_feedback(&mut self, rating: Rating, comment: &str) -> ChatResult<TurnOutcome> {
        self.process(Event::SubmitFeedback {
            rating,
            comment: comment.to_string(),
        })
        .await
    }

    /// Close the feedback step without rating
    pub async fn dismiss_feedback(&mut self) -> ChatResult<TurnOutcome> {
        self.process(Event::DismissFeedback).await
    }

    async fn process(&mut self, event: Event) -> ChatResult<TurnOutcome> {
        let before = self.state.transcript().len();
        let mut notices = Vec::new();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let effects = transition(&mut self.state, event).map_err(|e| {
                debug!(error = %e, "event rejected");
                e
            })?;

            for effect in effects {
                match effect {
                    Effect::RequestResponse { agent } => {
                        queue.push_back(self.request_response(agent).await);
                    }
                    Effect::RecordFeedback { rating, comment } => {
                        queue.push_back(self.record_feedback(rating, comment).await);
                    }
                    Effect::Notify(notice) => notices.push(notice),
                }
            }
        }

        if self.state.session_finished() {
            info!(session = %self.state.id(), "chat session finished");
        }

        Ok(TurnOutcome {
            appended: self.state.transcript()[before..].to_vec(),
            notices,
            announcement: self.state.take_announcement(),
            phase: self.state.phase(),
        })
    }

    async fn request_response(&self, agent: Option<AgentKind>) -> Event {
        let responder = Responder::from(agent);
        debug!(responder = responder.display_name(), "requesting response");

        match self.dispatch.respond(self.state.transcript(), agent).await {
            Ok(text) => Event::ResponseReady { text },
            Err(e) => {
                warn!(responder = responder.display_name(), error = %e, "response failed");
                Event::ResponseFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn record_feedback(&self, rating: Rating, comment: String) -> Event {
        let record = FeedbackRecord::new(rating, comment);
        match self.sink.record(&record).await {
            Ok(()) => {
                info!(rating = rating.value(), "feedback recorded");
                Event::FeedbackRecorded
            }
            Err(e) => {
                warn!(error = %e, "feedback could not be recorded");
                Event::FeedbackFailed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MockDispatch;
    use crate::error::ChatError;
    use crate::feedback::MockFeedbackSink;
    use crate::state_machine::TransitionError;

    #[tokio::test]
    async fn test_default_turn() {
        let mut dispatch = MockDispatch::new();
        dispatch
            .expect_respond()
            .withf(|transcript: &[Message], agent: &Option<AgentKind>| {
                transcript.len() == 2 && agent.is_none()
            })
            .times(1)
            .returning(|_, _| Ok("Cinco cartas del mismo palo.".to_string()));

        let mut controller = ChatController::new(dispatch, MockFeedbackSink::new());
        let outcome = controller.submit_text("¿Qué es un flush?").await.unwrap();

        assert_eq!(outcome.appended.len(), 2);
        assert_eq!(outcome.appended[0].role, MessageRole::User);
        let reply = outcome.reply().unwrap();
        assert_eq!(reply.content, "Cinco cartas del mismo palo.");
        assert_eq!(reply.responder_name.as_deref(), Some("Asistente PokerStars"));
        assert_eq!(outcome.phase, Phase::Chatting);
        assert!(outcome.notices.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_reported_as_notice() {
        let mut dispatch = MockDispatch::new();
        dispatch
            .expect_respond()
            .returning(|_, _| Err(ChatError::Upstream("503 Service Unavailable".to_string())));

        let mut controller = ChatController::new(dispatch, MockFeedbackSink::new());
        let outcome = controller.submit_text("hola").await.unwrap();

        assert_eq!(outcome.appended.len(), 1);
        assert!(outcome.reply().is_none());
        assert!(matches!(
            outcome.notices.as_slice(),
            [Notice::UpstreamFailure { message }] if message.contains("503")
        ));
        assert_eq!(outcome.phase, Phase::Chatting);
    }

    #[tokio::test]
    async fn test_select_agent_announces_once() {
        let mut controller = ChatController::new(MockDispatch::new(), MockFeedbackSink::new());

        let outcome = controller.select_agent(Some(AgentKind::Coach)).await.unwrap();
        assert_eq!(outcome.announcement, Some(Responder::Agent(AgentKind::Coach)));
        assert!(outcome.appended.is_empty());
        assert_eq!(outcome.phase, Phase::Chatting);

        let outcome = controller.select_agent(Some(AgentKind::Coach)).await.unwrap();
        assert!(outcome.announcement.is_none());
    }

    #[tokio::test]
    async fn test_feedback_flow() {
        let mut sink = MockFeedbackSink::new();
        sink.expect_record()
            .withf(|record: &FeedbackRecord| {
                record.rating.value() == 5 && record.comment == "excelente"
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut controller = ChatController::new(MockDispatch::new(), sink);
        let outcome = controller.submit_text("salir").await.unwrap();
        assert_eq!(outcome.notices, vec![Notice::FeedbackRequested]);
        assert_eq!(outcome.phase, Phase::FeedbackPending);

        let outcome = controller
            .submit_feedback(Rating::new(5).unwrap(), "excelente")
            .await
            .unwrap();
        assert_eq!(outcome.phase, Phase::Finished);
        assert!(outcome.notices.contains(&Notice::FeedbackThanks));
        assert!(controller.state().session_finished());
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_feedback_open() {
        let mut sink = MockFeedbackSink::new();
        sink.expect_record()
            .times(1)
            .returning(|_| Err(ChatError::Persistence("403 Forbidden".to_string())));

        let mut controller = ChatController::new(MockDispatch::new(), sink);
        controller.submit_text("salir").await.unwrap();

        let outcome = controller
            .submit_feedback(Rating::new(2).unwrap(), "")
            .await
            .unwrap();
        assert_eq!(outcome.phase, Phase::FeedbackPending);
        assert!(outcome.notices.iter().any(Notice::is_error));

        let outcome = controller.dismiss_feedback().await.unwrap();
        assert_eq!(outcome.phase, Phase::Finished);
    }

    #[tokio::test]
    async fn test_rejected_event_surfaces_transition_error() {
        let mut controller = ChatController::new(MockDispatch::new(), MockFeedbackSink::new());
        controller.submit_text("salir").await.unwrap();
        controller.dismiss_feedback().await.unwrap();

        let err = controller.submit_text("hola").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Transition(TransitionError::SessionFinished)
        ));
    }

    #[tokio::test]
    async fn test_custom_exit_keyword_from_config() {
        let config = ChatConfig {
            exit_keyword: "adios".to_string(),
            ..ChatConfig::default()
        };
        let mut controller =
            ChatController::from_config(&config, MockDispatch::new(), MockFeedbackSink::new());

        let outcome = controller.submit_text("Adios").await.unwrap();
        assert_eq!(outcome.phase, Phase::FeedbackPending);
    }
}
