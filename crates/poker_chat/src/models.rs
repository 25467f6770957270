//! Allow-list of chat models the front-end may select.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// A model served by the chat-completion provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ModelId {
    #[default]
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama33_70bVersatile,
    #[serde(rename = "gemma2-9b-it")]
    Gemma2_9bIt,
}

impl ModelId {
    /// Every selectable model; the first one is the default
    pub const ALL: [ModelId; 2] = [Self::Llama33_70bVersatile, Self::Gemma2_9bIt];

    /// Identifier sent to the provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llama33_70bVersatile => "llama-3.3-70b-versatile",
            Self::Gemma2_9bIt => "gemma2-9b-it",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Llama33_70bVersatile => "Llama 3.3 70B, general purpose",
            Self::Gemma2_9bIt => "Gemma 2 9B instruction tuned, faster and lighter",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        // Tolerate a "groq/" provider prefix
        let wanted = wanted.strip_prefix("groq/").unwrap_or(wanted);
        Self::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                ChatError::Config(format!(
                    "unknown model '{}', expected one of: {}",
                    wanted,
                    allowed.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        assert_eq!(ModelId::default(), ModelId::Llama33_70bVersatile);
        assert_eq!(ModelId::ALL[0], ModelId::default());
    }

    #[test]
    fn test_parse_models() {
        assert_eq!("gemma2-9b-it".parse::<ModelId>().unwrap(), ModelId::Gemma2_9bIt);
        assert_eq!(
            "groq/llama-3.3-70b-versatile".parse::<ModelId>().unwrap(),
            ModelId::Llama33_70bVersatile
        );

        let err = "gpt-4o".parse::<ModelId>().unwrap_err();
        assert!(err.to_string().contains("gemma2-9b-it"));
    }

    #[test]
    fn test_serde_uses_provider_ids() {
        let json = serde_json::to_string(&ModelId::Gemma2_9bIt).unwrap();
        assert_eq!(json, "\"gemma2-9b-it\"");
    }
}
