//! Terminal rendering of transcript turns and notices.

use poker_chat::{
    AgentKind, Message, MessageRole, Notice, Responder, TurnOutcome, DEFAULT_ASSISTANT_NAME,
};

const DEFAULT_ICON: &str = "♠";

pub fn banner() -> String {
    format!(
        "{} PokerStars AI\nEscribe tu pregunta. Comandos: {}\n",
        DEFAULT_ICON,
        command_list()
    )
}

pub fn command_list() -> String {
    let mut commands: Vec<String> = AgentKind::ALL
        .iter()
        .map(|agent| format!("/{}", agent.slug()))
        .collect();
    commands.extend(["/asistente", "/ayuda"].map(String::from));
    commands.join(" ")
}

/// Help text listing the responders and how to leave
pub fn help(exit_keyword: &str) -> String {
    let mut lines = vec![format!(
        "  /asistente  {} {}",
        DEFAULT_ICON, DEFAULT_ASSISTANT_NAME
    )];
    for agent in AgentKind::ALL {
        lines.push(format!(
            "  /{:<10} {} {}",
            agent.slug(),
            agent.icon(),
            agent.display_name()
        ));
    }
    lines.push(format!("Escribe '{}' para finalizar el chat.", exit_keyword));
    lines.join("\n")
}

fn icon_for(name: &str) -> &'static str {
    AgentKind::ALL
        .iter()
        .find(|agent| agent.display_name() == name)
        .map_or(DEFAULT_ICON, |agent| agent.icon())
}

/// One transcript turn as shown in the terminal
pub fn format_message(message: &Message) -> String {
    match message.role {
        MessageRole::User => format!("🙂 Tú: {}", message.content),
        MessageRole::Assistant => {
            let name = message
                .responder_name
                .as_deref()
                .unwrap_or(DEFAULT_ASSISTANT_NAME);
            format!("{} {}: {}", icon_for(name), name, message.content)
        }
        MessageRole::System => String::new(),
    }
}

pub fn format_announcement(responder: &Responder) -> String {
    let icon = responder.agent().map_or(DEFAULT_ICON, |agent| agent.icon());
    format!("{} {}", icon, responder.announcement())
}

pub fn format_notice(notice: &Notice) -> String {
    if notice.is_error() {
        format!("⚠️  {}", notice.text())
    } else {
        notice.text()
    }
}

/// Print what a turn changed; the user's own line is not echoed back
pub fn print_outcome(outcome: &TurnOutcome) {
    if let Some(responder) = &outcome.announcement {
        println!("{}", format_announcement(responder));
    }
    for message in &outcome.appended {
        if message.role == MessageRole::Assistant {
            println!("{}\n", format_message(message));
        }
    }
    for notice in &outcome.notices {
        if notice.is_error() {
            eprintln!("{}", format_notice(notice));
        } else {
            println!("{}", format_notice(notice));
        }
    }
}
