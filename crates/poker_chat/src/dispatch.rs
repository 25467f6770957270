//! Responder dispatch.
//!
//! Turns the transcript and the selected agent into one assistant utterance.
//! The two modes build their context differently:
//!
//! - **Default mode** replays the whole transcript, System preamble first.
//!   Nothing is truncated, so the payload grows with every turn.
//! - **Agent mode** sends only the latest user utterance as a task, bound to
//!   the agent's persona. Earlier turns are not forwarded.

use async_trait::async_trait;
use tracing::debug;

use crate::agents::{AgentRunner, AgentTask, Persona};
use crate::error::{ChatError, ChatResult};
use crate::llm::{ChatCompletion, ChatMessage, CompletionRequest};
use crate::models::ModelId;
use crate::types::{AgentKind, Message, MessageRole};

/// Payload for one responder call
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchRequest {
    /// Full-transcript chat completion for the default assistant
    Conversation(CompletionRequest),
    /// Single task for a named agent
    AgentTask {
        agent: AgentKind,
        persona: &'static Persona,
        task: AgentTask,
    },
}

/// Build the payload for the next responder call.
///
/// Fails with `InvalidInput` when the transcript holds no user turn to answer.
pub fn build_request(
    transcript: &[Message],
    agent: Option<AgentKind>,
    model: ModelId,
) -> ChatResult<DispatchRequest> {
    let latest = transcript
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .ok_or_else(|| ChatError::InvalidInput("no user utterance to answer".to_string()))?;

    let request = match agent {
        None => DispatchRequest::Conversation(CompletionRequest {
            model,
            messages: transcript.iter().map(ChatMessage::from).collect(),
            temperature: None,
        }),
        Some(agent) => DispatchRequest::AgentTask {
            agent,
            persona: agent.persona(),
            task: AgentTask::new(latest.content.clone()),
        },
    };
    Ok(request)
}

/// Produces a single assistant utterance for the current turn
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn respond(&self, transcript: &[Message], agent: Option<AgentKind>) -> ChatResult<String>;
}

/// Dispatch backed by a completion provider and an agent runner
#[derive(Debug, Clone)]
pub struct ResponderDispatch<C, R> {
    completion: C,
    runner: R,
    model: ModelId,
}

impl<C: ChatCompletion, R: AgentRunner> ResponderDispatch<C, R> {
    pub fn new(completion: C, runner: R, model: ModelId) -> Self {
        Self {
            completion,
            runner,
            model,
        }
    }

    pub fn model(&self) -> ModelId {
        self.model
    }
}

#[async_trait]
impl<C: ChatCompletion, R: AgentRunner> Dispatch for ResponderDispatch<C, R> {
    async fn respond(&self, transcript: &[Message], agent: Option<AgentKind>) -> ChatResult<String> {
        match build_request(transcript, agent, self.model)? {
            DispatchRequest::Conversation(request) => {
                debug!(turns = request.messages.len(), "answering with default assistant");
                self.completion.complete(&request).await
            }
            DispatchRequest::AgentTask {
                agent,
                persona,
                task,
            } => {
                debug!(agent = agent.slug(), "answering with agent");
                let output = self.runner.run_task(persona, &task).await?;
                Ok(output.raw)
            }
        }
    }
}
