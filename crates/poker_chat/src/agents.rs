//! Agent personas and the single-task agent runner.
//!
//! Each agent carries a fixed persona (role, goal, backstory). The scope
//! restriction of every agent lives only in its backstory text and is
//! enforced by the remote model, so personas are forwarded verbatim.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::ChatResult;
use crate::llm::{ChatCompletion, ChatMessage, CompletionRequest};
use crate::models::ModelId;
use crate::types::{AgentKind, MessageRole};

/// Expected-output hint attached to every agent task
pub const EXPECTED_OUTPUT: &str = "Respuesta clara y útil para el usuario.";

/// System preamble of the default assistant; always the first transcript entry
pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres un asistente experto en reglas del póker. Responde de forma clara, profesional y concisa solo a preguntas que tengan que ver con las reglas y a palabras técnicas. Añade siempre al final que escribiendo 'Salir' se puede finalizar el chat.";

/// Fixed identity bound to an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl Persona {
    /// Render the persona as a system directive
    pub fn system_directive(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

impl AgentKind {
    /// Persona bound to this agent
    pub fn persona(&self) -> &'static Persona {
        match self {
            Self::Coach => &COACH_PERSONA,
            Self::HandEvaluator => &HAND_EVALUATOR_PERSONA,
            Self::PlaySimulator => &PLAY_SIMULATOR_PERSONA,
            Self::TechSupport => &TECH_SUPPORT_PERSONA,
        }
    }
}

/// A single task handed to one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTask {
    /// What the agent should do; the latest user utterance
    pub description: String,
    /// Hint describing the shape of a good answer
    pub expected_output: String,
}

impl AgentTask {
    /// Task with the standard expected-output hint
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: EXPECTED_OUTPUT.to_string(),
        }
    }

    /// Render the task as the user prompt
    pub fn prompt(&self) -> String {
        format!(
            "Current task: {}\n\nExpected output: {}\nReturn the complete answer, not a summary.",
            self.description, self.expected_output
        )
    }
}

/// Result of running an agent task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub raw: String,
}

/// Runs one task on one agent; no delegation between agents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run_task(&self, persona: &Persona, task: &AgentTask) -> ChatResult<TaskOutput>;
}

/// Build the completion messages for a persona and task
pub fn task_messages(persona: &Persona, task: &AgentTask) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(MessageRole::System, persona.system_directive()),
        ChatMessage::new(MessageRole::User, task.prompt()),
    ]
}

/// Agent runner backed by a single chat completion per task
#[derive(Debug, Clone)]
pub struct SingleTaskRunner<C> {
    completion: C,
    model: ModelId,
    temperature: f32,
}

impl<C: ChatCompletion> SingleTaskRunner<C> {
    pub fn new(completion: C, model: ModelId, temperature: f32) -> Self {
        Self {
            completion,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl<C: ChatCompletion> AgentRunner for SingleTaskRunner<C> {
    async fn run_task(&self, persona: &Persona, task: &AgentTask) -> ChatResult<TaskOutput> {
        debug!(role = persona.role, model = %self.model, "running agent task");
        let request = CompletionRequest {
            model: self.model,
            messages: task_messages(persona, task),
            temperature: Some(self.temperature),
        };
        let raw = self.completion.complete(&request).await?;
        Ok(TaskOutput { raw })
    }
}

// Personas for each agent

static COACH_PERSONA: Persona = Persona {
    role: "Entrenador de Estrategia de Póker",
    goal: "Ayudar al usuario a mejorar su juego ofreciendo consejos según la fase actual",
    backstory: concat!(
        "Eres un entrenador veterano especializado en mejorar estrategias de póker.\n",
        "                Tu función es ayudar a los jugadores a tomar mejores decisiones estratégicas según la fase de la partida \n",
        "                (preflop, flop, turn, river). SOLO respondes preguntas relacionadas con estrategia de juego. \n",
        "                Si alguien te hace una pregunta fuera de ese tema (como reglas, soporte técnico, simulaciones o evaluación de manos), \n",
        "                responde de forma educada que no puedes ayudar con eso. Responde siempre en español y añade siempre al final que escribiendo 'Salir' se puede finalizar el chat.",
    ),
};

static HAND_EVALUATOR_PERSONA: Persona = Persona {
    role: "Evaluador de manos",
    goal: "Analizar la fuerza de una mano de póker en contexto",
    backstory: concat!(
        "Eres un experto en evaluar manos de póker y calcular probabilidades de ganar en tiempo real. \n",
        "                Tu función es analizar la fuerza de una mano según el contexto de la partida. SOLO debes responder a preguntas relacionadas con la evaluación de manos. \n",
        "                No debes responder preguntas sobre estrategia, simulaciones o soporte técnico. \n",
        "                Si te preguntan algo fuera de tu especialidad, responde educadamente que no puedes ayudar con eso. Responde siempre en español y añade siempre al final que escribiendo 'Salir' se puede finalizar el chat.",
    ),
};

static PLAY_SIMULATOR_PERSONA: Persona = Persona {
    role: "Simulador de decisiones",
    goal: "Simular resultados de diferentes decisiones en una mano",
    backstory: concat!(
        "Eres un simulador especializado en analizar qué podría ocurrir si un jugador apuesta, iguala o se retira en una mano concreta. \n",
        "                Simulas diferentes escenarios posibles en base a la decisión del jugador. SOLO debes responder preguntas relacionadas con simulaciones de jugadas. \n",
        "                No debes dar consejos estratégicos ni evaluar la fuerza de manos. Si te preguntan algo fuera de tu función, responde amablemente que no puedes ayudar con eso. Responde siempre en español y añade siempre al final que escribiendo 'Salir' se puede finalizar el chat.",
    ),
};

static TECH_SUPPORT_PERSONA: Persona = Persona {
    role: "Técnico de soporte",
    goal: "Resolver problemas técnicos del usuario con la plataforma",
    backstory: concat!(
        "Eres un especialista en soporte técnico para plataformas de póker online.\n",
        "                Tu función es resolver problemas técnicos como errores de conexión, cuentas, rendimiento de la app, etc. SOLO debes responder preguntas de soporte técnico.\n",
        "                No estás autorizado a dar consejos de juego, evaluar manos o simular jugadas. Si alguien te pregunta sobre esos temas, responde educadamente que no es tu campo. Responde siempre en español y añade siempre al final que escribiendo 'Salir' se puede finalizar el chat.",
    ),
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatCompletion;

    #[test]
    fn test_personas_are_bound_to_agents() {
        assert_eq!(AgentKind::Coach.persona().role, "Entrenador de Estrategia de Póker");
        assert_eq!(AgentKind::HandEvaluator.persona().role, "Evaluador de manos");
        assert_eq!(AgentKind::PlaySimulator.persona().role, "Simulador de decisiones");
        assert_eq!(AgentKind::TechSupport.persona().role, "Técnico de soporte");
    }

    #[test]
    fn test_personas_carry_scope_restriction() {
        for agent in AgentKind::ALL {
            let backstory = agent.persona().backstory;
            assert!(backstory.contains("SOLO"), "{} has no scope restriction", agent);
            assert!(backstory.contains("'Salir'"), "{} does not mention the exit keyword", agent);
        }
        assert!(AgentKind::HandEvaluator
            .persona()
            .backstory
            .contains("No debes responder preguntas sobre estrategia"));
    }

    #[test]
    fn test_backstory_keeps_source_layout() {
        let expected = "Eres un especialista en soporte técnico para plataformas de póker online.\n                Tu función es resolver problemas técnicos como errores de conexión, cuentas, rendimiento de la app, etc. SOLO debes responder preguntas de soporte técnico.\n                No estás autorizado a dar consejos de juego, evaluar manos o simular jugadas. Si alguien te pregunta sobre esos temas, responde educadamente que no es tu campo. Responde siempre en español y añade siempre al final que escribiendo 'Salir' se puede finalizar el chat.";
        assert_eq!(AgentKind::TechSupport.persona().backstory, expected);

        // Continuation lines keep their indentation and trailing spaces
        let coach = AgentKind::Coach.persona().backstory;
        assert!(coach.contains("de póker.\n                Tu función"));
        assert!(coach.contains("estrategia de juego. \n                Si alguien"));
        assert_eq!(coach.chars().count(), 618);
    }

    #[test]
    fn test_system_directive_includes_whole_persona() {
        let persona = AgentKind::Coach.persona();
        let directive = persona.system_directive();
        assert!(directive.starts_with("You are Entrenador de Estrategia de Póker."));
        assert!(directive.contains(persona.backstory));
        assert!(directive.ends_with(persona.goal));
    }

    #[test]
    fn test_task_messages() {
        let task = AgentTask::new("¿Debo subir preflop?");
        let messages = task_messages(AgentKind::Coach.persona(), &task);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
        assert!(messages[1].content.contains("¿Debo subir preflop?"));
        assert!(messages[1].content.contains(EXPECTED_OUTPUT));
    }

    #[tokio::test]
    async fn test_single_task_runner_uses_persona_and_temperature() {
        let mut completion = MockChatCompletion::new();
        completion
            .expect_complete()
            .withf(|request: &CompletionRequest| {
                request.model == ModelId::Gemma2_9bIt
                    && request.temperature == Some(0.5)
                    && request.messages.len() == 2
                    && request.messages[0].content.contains("Evaluador de manos")
            })
            .times(1)
            .returning(|_| Ok("Tienes una mano fuerte.".to_string()));

        let runner = SingleTaskRunner::new(completion, ModelId::Gemma2_9bIt, 0.5);
        let output = runner
            .run_task(
                AgentKind::HandEvaluator.persona(),
                &AgentTask::new("Tengo AK suited"),
            )
            .await
            .unwrap();

        assert_eq!(output.raw, "Tienes una mano fuerte.");
    }
}
