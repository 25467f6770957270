//! Ask command - One question, one answer.

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use tracing::info;

use poker_chat::{
    AgentKind, ChatController, ChatError, ChatResult, FeedbackRecord, FeedbackSink, Notice,
    SessionState,
};

use crate::render;
use crate::settings::{build_dispatch, load_config, ConfigArgs};

#[derive(Args)]
pub struct AskArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Agent that answers (coach, evaluador, simulador, soporte)
    #[arg(short, long)]
    agent: Option<AgentKind>,

    /// Question to ask
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
}

/// One-shot turns have no feedback step
struct NoFeedback;

#[async_trait]
impl FeedbackSink for NoFeedback {
    async fn record(&self, _record: &FeedbackRecord) -> ChatResult<()> {
        Err(ChatError::Persistence(
            "feedback is only collected in interactive chats".to_string(),
        ))
    }
}

/// A one-shot question must be answerable: not blank and not the termination keyword
fn check_question(state: &SessionState, question: &str) -> ChatResult<()> {
    if question.trim().is_empty() {
        return Err(ChatError::InvalidInput("question must not be empty".to_string()));
    }
    if state.is_exit_keyword(question) {
        return Err(ChatError::InvalidInput(format!(
            "'{}' ends a chat; there is nothing to answer",
            question.trim()
        )));
    }
    Ok(())
}

pub async fn execute(args: AskArgs) -> Result<()> {
    let question = args.question.join(" ");
    let config = load_config(&args.config)?;
    check_question(&SessionState::new(config.exit_keyword.clone()), &question)?;
    let dispatch = build_dispatch(&config)?;
    let mut controller = ChatController::from_config(&config, dispatch, NoFeedback);

    if args.agent.is_some() {
        controller.select_agent(args.agent).await?;
    }
    info!(agent = ?args.agent, "asking one question");

    let outcome = controller.submit_text(&question).await?;
    if let Some(reply) = outcome.reply() {
        println!("{}", render::format_message(reply));
        return Ok(());
    }

    for notice in outcome.notices {
        if let Notice::UpstreamFailure { message } = notice {
            return Err(ChatError::Upstream(message).into());
        }
    }
    Err(ChatError::Upstream("the model returned no answer".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_question() {
        let state = SessionState::default();
        assert!(check_question(&state, "¿Qué es un flush?").is_ok());
        assert!(matches!(
            check_question(&state, "   "),
            Err(ChatError::InvalidInput(_))
        ));
        assert!(matches!(
            check_question(&state, " Salir "),
            Err(ChatError::InvalidInput(_))
        ));

        let state = SessionState::new("adios");
        assert!(check_question(&state, "salir").is_ok());
        assert!(matches!(
            check_question(&state, "ADIOS"),
            Err(ChatError::InvalidInput(_))
        ));
    }
}
