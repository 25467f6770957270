//! Configuration flags shared by the chat commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use poker_chat::{
    ChatConfig, FeedbackConfig, LlmAdapter, ModelId, ResponderDispatch, SingleTaskRunner,
};

/// Dispatch wired to the live provider
pub type LiveDispatch = ResponderDispatch<LlmAdapter, SingleTaskRunner<LlmAdapter>>;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long, env = "POKERSTARS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model to chat with (llama-3.3-70b-versatile, gemma2-9b-it)
    #[arg(short, long, env = "POKERSTARS_MODEL")]
    pub model: Option<String>,

    /// Store feedback in a JSON Lines file instead of the spreadsheet
    #[arg(long, value_name = "PATH")]
    pub feedback_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Resolve the configuration: file, then environment, then flags
pub fn load_config(args: &ConfigArgs) -> Result<ChatConfig> {
    load_config_with(args, |key| std::env::var(key).ok())
}

fn load_config_with<F>(args: &ConfigArgs, lookup: F) -> Result<ChatConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match &args.config {
        Some(path) => ChatConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ChatConfig::default(),
    };
    let mut config = config.with_env_from(lookup)?;

    if let Some(model) = &args.model {
        config.model = model.parse::<ModelId>()?;
    }
    if let Some(path) = &args.feedback_file {
        config.feedback = FeedbackConfig::Jsonl { path: path.clone() };
    }
    if args.timeout.is_some() {
        config.request_timeout_secs = args.timeout;
    }
    config.validate()?;

    debug!(model = %config.model, "configuration resolved");
    Ok(config)
}

/// Build the responder dispatch for the configured provider
pub fn build_dispatch(config: &ChatConfig) -> Result<LiveDispatch> {
    let llm = LlmAdapter::from_config(config)?;
    let runner = SingleTaskRunner::new(llm.clone(), config.model, config.temperature);
    Ok(ResponderDispatch::new(llm, runner, config.model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config_with(&ConfigArgs::default(), no_env).unwrap();
        assert_eq!(config.model, ModelId::Llama33_70bVersatile);
        assert_eq!(config.exit_keyword, "salir");
    }

    #[test]
    fn test_flags_override_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("pokerstars.yaml");
        fs::write(&path, "model: llama-3.3-70b-versatile\nexitKeyword: adios\n").unwrap();

        let args = ConfigArgs {
            config: Some(path),
            model: Some("gemma2-9b-it".to_string()),
            feedback_file: Some(temp.path().join("feedback.jsonl")),
            timeout: Some(20),
        };
        let config = load_config_with(&args, no_env).unwrap();

        assert_eq!(config.model, ModelId::Gemma2_9bIt);
        assert_eq!(config.exit_keyword, "adios");
        assert_eq!(config.request_timeout_secs, Some(20));
        assert!(matches!(config.feedback, FeedbackConfig::Jsonl { .. }));
    }

    #[test]
    fn test_unknown_model_flag() {
        let args = ConfigArgs {
            model: Some("gpt-4o".to_string()),
            ..ConfigArgs::default()
        };
        let err = load_config_with(&args, no_env).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<poker_chat::ChatError>(),
            Some(poker_chat::ChatError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/pokerstars.yaml")),
            ..ConfigArgs::default()
        };
        let err = load_config_with(&args, no_env).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/pokerstars.yaml"));
    }

    #[test]
    fn test_dispatch_requires_api_key() {
        let config = load_config_with(&ConfigArgs::default(), no_env).unwrap();
        assert!(build_dispatch(&config).is_err());

        let config = load_config_with(&ConfigArgs::default(), |key| {
            (key == "GROQ_API_KEY").then(|| "gsk-test".to_string())
        })
        .unwrap();
        assert_eq!(build_dispatch(&config).unwrap().model(), config.model);
    }
}
