//! Chat command - Interactive chat session.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use poker_chat::{
    sink_from_config, AgentKind, ChatController, Dispatch, FeedbackSink, Phase, Rating,
};

use crate::render;
use crate::settings::{build_dispatch, load_config, ConfigArgs};

#[derive(Args)]
pub struct ChatArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Start talking to an agent (coach, evaluador, simulador, soporte)
    #[arg(short, long)]
    agent: Option<AgentKind>,
}

/// One line typed while chatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Switch responder; `None` is the default assistant
    Select(Option<AgentKind>),
    Help,
    Unknown(String),
    Text(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(name) = trimmed.strip_prefix('/') else {
            return Self::Text(line.to_string());
        };

        match name.to_lowercase().as_str() {
            "asistente" | "default" => Self::Select(None),
            "ayuda" | "help" => Self::Help,
            other => other
                .parse::<AgentKind>()
                .map(|agent| Self::Select(Some(agent)))
                .unwrap_or_else(|_| Self::Unknown(trimmed.to_string())),
        }
    }
}

/// One line typed while the feedback step is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackInput {
    Dismiss,
    Rating(Rating),
    /// A number outside the rating scale, or a command the step does not take
    Invalid(String),
    /// Anything else keeps chatting
    Text(String),
}

impl FeedbackInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("/cerrar") {
            return Self::Dismiss;
        }
        if trimmed.starts_with('/') {
            return Self::Invalid(format!(
                "{} no está disponible durante la valoración",
                trimmed
            ));
        }
        if trimmed.parse::<i64>().is_err() {
            return Self::Text(line.to_string());
        }
        match trimmed.parse::<Rating>() {
            Ok(rating) => Self::Rating(rating),
            Err(e) => Self::Invalid(e.to_string()),
        }
    }
}

pub async fn execute(args: ChatArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let dispatch = build_dispatch(&config)?;
    let sink = sink_from_config(&config).context(
        "Feedback is not configured. Set SHEET_ID and GOOGLE_SHEETS_CREDENTIALS \
         (or GOOGLE_SHEETS_ACCESS_TOKEN), or pass --feedback-file",
    )?;

    info!(model = %config.model, "starting chat");
    let mut controller = ChatController::from_config(&config, dispatch, sink);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", render::banner());
    if let Some(agent) = args.agent {
        render::print_outcome(&controller.select_agent(Some(agent)).await?);
    }

    loop {
        let finished = match controller.phase() {
            Phase::Finished => true,
            Phase::FeedbackPending => !feedback_step(&mut controller, &mut lines).await?,
            Phase::Idle | Phase::Chatting => !chat_step(&mut controller, &mut lines).await?,
        };
        if finished {
            break;
        }
    }

    info!(
        turns = controller.state().visible_turns().len(),
        phase = ?controller.phase(),
        "chat closed"
    );
    Ok(())
}

/// Read one chat line; `false` once input is exhausted
async fn chat_step<D, F>(
    controller: &mut ChatController<D, F>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool>
where
    D: Dispatch,
    F: FeedbackSink,
{
    let Some(line) = prompt(lines, "> ").await? else {
        return Ok(false);
    };

    match ChatCommand::parse(&line) {
        ChatCommand::Select(agent) => {
            render::print_outcome(&controller.select_agent(agent).await?);
        }
        ChatCommand::Help => {
            println!("{}", render::help(controller.state().exit_keyword()));
        }
        ChatCommand::Unknown(command) => {
            eprintln!("Comando desconocido: {}. Usa /ayuda.", command);
        }
        ChatCommand::Text(text) => {
            render::print_outcome(&controller.submit_text(&text).await?);
        }
    }
    Ok(true)
}

/// Collect a rating and a comment, or a dismissal; other text is still answered.
///
/// Returns `false` once input is exhausted.
async fn feedback_step<D, F>(
    controller: &mut ChatController<D, F>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool>
where
    D: Dispatch,
    F: FeedbackSink,
{
    let Some(line) = prompt(lines, "Puntuación 1-5 (/cerrar para omitir): ").await? else {
        return Ok(false);
    };

    let rating = match FeedbackInput::parse(&line) {
        FeedbackInput::Dismiss => {
            render::print_outcome(&controller.dismiss_feedback().await?);
            return Ok(true);
        }
        FeedbackInput::Invalid(reason) => {
            eprintln!("⚠️  {}", reason);
            return Ok(true);
        }
        FeedbackInput::Text(text) => {
            render::print_outcome(&controller.submit_text(&text).await?);
            return Ok(true);
        }
        FeedbackInput::Rating(rating) => rating,
    };

    let Some(comment) = prompt(lines, "Comentario (opcional): ").await? else {
        return Ok(false);
    };
    render::print_outcome(&controller.submit_feedback(rating, comment.trim()).await?);
    Ok(true)
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}
