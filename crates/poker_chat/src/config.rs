//! Chat configuration.
//!
//! Settings come from an optional YAML file; credentials are never stored
//! there and are read from the environment instead:
//!
//! - `GROQ_API_KEY`: chat-completion credential
//! - `POKERSTARS_MODEL`: model override
//! - `SHEET_ID`: target spreadsheet for feedback
//! - `GOOGLE_SHEETS_CREDENTIALS`: service-account key for the spreadsheet API,
//!   as inline JSON or a path to the key file
//! - `GOOGLE_SHEETS_ACCESS_TOKEN`: ready-made bearer token; wins over the key

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};
use crate::models::ModelId;

/// OpenAI-compatible endpoint of the default provider
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Word that ends the chat and opens the feedback step
pub const DEFAULT_EXIT_KEYWORD: &str = "salir";
/// Sampling temperature used for agent tasks
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Sheet range rows are appended to; no sheet name means the first worksheet
pub const DEFAULT_SHEET_RANGE: &str = "A:C";

/// Where feedback records go
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedbackConfig {
    /// Append rows to a spreadsheet
    Sheets {
        #[serde(rename = "sheetId", default, skip_serializing_if = "Option::is_none")]
        sheet_id: Option<String>,
        #[serde(default = "default_sheet_range")]
        range: String,
    },
    /// Append JSON lines to a local file
    Jsonl { path: PathBuf },
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self::Sheets {
            sheet_id: None,
            range: default_sheet_range(),
        }
    }
}

fn default_sheet_range() -> String {
    DEFAULT_SHEET_RANGE.to_string()
}

/// Secrets supplied out-of-band
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub groq_api_key: Option<String>,
    pub sheets_access_token: Option<String>,
    /// Service-account key, inline JSON or a file path
    pub sheets_service_account: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "sheets_access_token",
                &self.sheets_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "sheets_service_account",
                &self.sheets_service_account.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Full configuration of a chat front-end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Model used for both the default assistant and agents
    pub model: ModelId,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Temperature for agent tasks
    pub temperature: f32,
    /// Termination keyword, compared trimmed and case-insensitively
    pub exit_keyword: String,
    /// Client-side request timeout; unset means the HTTP client default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub feedback: FeedbackConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            exit_keyword: DEFAULT_EXIT_KEYWORD.to_string(),
            request_timeout_secs: None,
            feedback: FeedbackConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl ChatConfig {
    /// Load a configuration from a YAML file.
    pub fn from_file(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ChatResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the process environment
    pub fn with_env(self) -> ChatResult<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    pub fn with_env_from<F>(mut self, lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = lookup("GROQ_API_KEY") {
            self.credentials.groq_api_key = Some(key);
        }
        if let Some(token) = lookup("GOOGLE_SHEETS_ACCESS_TOKEN") {
            self.credentials.sheets_access_token = Some(token);
        }
        if let Some(key) = lookup("GOOGLE_SHEETS_CREDENTIALS") {
            self.credentials.sheets_service_account = Some(key);
        }
        if let Some(model) = lookup("POKERSTARS_MODEL") {
            self.model = model.parse()?;
        }
        if let Some(id) = lookup("SHEET_ID") {
            if let FeedbackConfig::Sheets { sheet_id, .. } = &mut self.feedback {
                *sheet_id = Some(id);
            }
        }
        Ok(self)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> ChatResult<()> {
        if self.exit_keyword.trim().is_empty() {
            return Err(ChatError::Config("exitKeyword must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(ChatError::Config("baseUrl must not be empty".to_string()));
        }
        Ok(())
    }

    /// Serialize the configuration to YAML.
    pub fn to_yaml(&self) -> ChatResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
