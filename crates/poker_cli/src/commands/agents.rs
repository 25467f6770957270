//! Agents command - List the responders.

use anyhow::Result;
use clap::Args;

use poker_chat::{AgentKind, DEFAULT_ASSISTANT_NAME};

#[derive(Args)]
pub struct AgentsArgs {
    /// Also print each agent's backstory
    #[arg(long)]
    backstory: bool,
}

pub async fn execute(args: AgentsArgs) -> Result<()> {
    println!("♠ {} (/asistente)", DEFAULT_ASSISTANT_NAME);
    println!("   Reglas del póker y términos técnicos; recuerda toda la conversación");
    println!();

    for agent in AgentKind::ALL {
        let persona = agent.persona();
        println!("{} {} (/{})", agent.icon(), agent.display_name(), agent.slug());
        println!("   Rol:      {}", persona.role);
        println!("   Objetivo: {}", persona.goal);
        if args.backstory {
            for line in persona.backstory.lines() {
                println!("   │ {}", line);
            }
        }
        println!();
    }

    println!("Los agentes responden solo al último mensaje.");
    Ok(())
}
