//! Feedback sinks.
//!
//! A feedback record is one `(timestamp, rating, comment)` row appended to
//! an external store. Nothing is retried; failures surface as
//! `ChatError::Persistence`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::{ChatConfig, FeedbackConfig};
use crate::error::{ChatError, ChatResult};
use crate::types::Rating;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One satisfaction rating left at the end of a session
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Local>,
    pub rating: Rating,
    pub comment: String,
}

impl FeedbackRecord {
    /// Create a record stamped with the current local time
    pub fn new(rating: Rating, comment: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            rating,
            comment: comment.into(),
        }
    }

    /// Render the record as an ordered row of text values
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.rating.to_string(),
            self.comment.clone(),
        ]
    }
}

/// Append-only destination for feedback
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn record(&self, record: &FeedbackRecord) -> ChatResult<()>;
}

#[async_trait]
impl<T: FeedbackSink + ?Sized> FeedbackSink for Box<T> {
    async fn record(&self, record: &FeedbackRecord) -> ChatResult<()> {
        (**self).record(record).await
    }
}

/// Build the sink selected by the configuration
pub fn sink_from_config(config: &ChatConfig) -> ChatResult<Box<dyn FeedbackSink>> {
    match &config.feedback {
        FeedbackConfig::Sheets { sheet_id, range } => {
            let sheet_id = sheet_id
                .clone()
                .ok_or_else(|| ChatError::Config("SHEET_ID is not set".to_string()))?;
            let credentials = &config.credentials;
            let auth = match (
                &credentials.sheets_access_token,
                &credentials.sheets_service_account,
            ) {
                (Some(token), _) => SheetsAuth::Token(token.clone()),
                (None, Some(key)) => SheetsAuth::service_account(key)?,
                (None, None) => {
                    return Err(ChatError::Config(
                        "GOOGLE_SHEETS_CREDENTIALS is not set".to_string(),
                    ))
                }
            };
            Ok(Box::new(SheetsFeedbackSink::new(sheet_id, range.clone(), auth)))
        }
        FeedbackConfig::Jsonl { path } => Ok(Box::new(JsonlFeedbackSink::new(path))),
    }
}

/// How the spreadsheet API is authenticated
#[derive(Clone)]
pub enum SheetsAuth {
    /// Bearer token minted elsewhere
    Token(String),
    /// Service account; tokens are minted and cached on demand
    ServiceAccount(Arc<CustomServiceAccount>),
}

impl SheetsAuth {
    /// Load a service-account key given as inline JSON or as a file path
    pub fn service_account(key: &str) -> ChatResult<Self> {
        let key = key.trim();
        let account = if key.starts_with('{') {
            CustomServiceAccount::from_json(key)
        } else {
            CustomServiceAccount::from_file(key)
        }
        .map_err(|e| ChatError::Config(format!("invalid service-account key: {}", e)))?;
        Ok(Self::ServiceAccount(Arc::new(account)))
    }

    async fn bearer(&self) -> ChatResult<String> {
        match self {
            Self::Token(token) => Ok(token.clone()),
            Self::ServiceAccount(account) => {
                let token = account.token(&[SHEETS_SCOPE]).await.map_err(|e| {
                    ChatError::Persistence(format!("cannot obtain spreadsheet token: {}", e))
                })?;
                Ok(token.as_str().to_string())
            }
        }
    }
}

impl std::fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::ServiceAccount(_) => f.write_str("ServiceAccount(<redacted>)"),
        }
    }
}

/// Appends rows to a spreadsheet through the Sheets v4 `values:append` API
#[derive(Clone)]
pub struct SheetsFeedbackSink {
    api_base: String,
    sheet_id: String,
    range: String,
    auth: SheetsAuth,
    client: reqwest::Client,
}

impl SheetsFeedbackSink {
    pub fn new(sheet_id: impl Into<String>, range: impl Into<String>, auth: SheetsAuth) -> Self {
        Self {
            api_base: SHEETS_API_BASE.to_string(),
            sheet_id: sheet_id.into(),
            range: range.into(),
            auth,
            client: reqwest::Client::new(),
        }
    }

    /// Point the sink at another API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// URL of the append call
    pub fn append_url(&self) -> String {
        format!(
            "{}/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.api_base.trim_end_matches('/'),
            self.sheet_id,
            self.range
        )
    }

    /// Append one row of text values
    pub async fn append_row(&self, values: Vec<String>) -> ChatResult<()> {
        let body = ValueRange {
            values: vec![values],
        };
        let token = self.auth.bearer().await?;

        let response = self
            .client
            .post(self.append_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Persistence(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "spreadsheet append rejected");
            return Err(ChatError::Persistence(format!(
                "Sheets API error {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SheetsFeedbackSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsFeedbackSink")
            .field("sheet_id", &self.sheet_id)
            .field("range", &self.range)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FeedbackSink for SheetsFeedbackSink {
    async fn record(&self, record: &FeedbackRecord) -> ChatResult<()> {
        self.append_row(record.to_row()).await?;
        info!(rating = record.rating.value(), "feedback appended to spreadsheet");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ValueRange {
    values: Vec<Vec<String>>,
}

/// Appends feedback as JSON lines to a local file
#[derive(Debug, Clone)]
pub struct JsonlFeedbackSink {
    path: PathBuf,
}

/// On-disk shape of one JSONL feedback line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFeedback {
    pub timestamp: String,
    pub rating: Rating,
    pub comment: String,
}

impl From<&FeedbackRecord> for StoredFeedback {
    fn from(record: &FeedbackRecord) -> Self {
        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            rating: record.rating,
            comment: record.comment.clone(),
        }
    }
}

impl JsonlFeedbackSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored record
    pub fn load(&self) -> ChatResult<Vec<StoredFeedback>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }
}

#[async_trait]
impl FeedbackSink for JsonlFeedbackSink {
    async fn record(&self, record: &FeedbackRecord) -> ChatResult<()> {
        let json = serde_json::to_string(&StoredFeedback::from(record))?;
        self.append(&json).await.map_err(|e| {
            ChatError::Persistence(format!("cannot write {}: {}", self.path.display(), e))
        })?;
        info!(path = %self.path.display(), "feedback appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, DEFAULT_SHEET_RANGE};
    use tempfile::tempdir;

    #[test]
    fn test_record_row_layout() {
        let record = FeedbackRecord::new(Rating::new(4).unwrap(), "buena ayuda");
        let row = record.to_row();

        assert_eq!(row.len(), 3);
        assert_eq!(row[1], "4");
        assert_eq!(row[2], "buena ayuda");
        // "YYYY-MM-DD HH:MM:SS.ffffff"
        assert_eq!(row[0].len(), 26);
        assert_eq!(&row[0][10..11], " ");
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends() {
        let temp = tempdir().unwrap();
        let sink = JsonlFeedbackSink::new(temp.path().join("nested").join("feedback.jsonl"));

        sink.record(&FeedbackRecord::new(Rating::new(4).unwrap(), "buena ayuda"))
            .await
            .unwrap();
        sink.record(&FeedbackRecord::new(Rating::new(2).unwrap(), ""))
            .await
            .unwrap();

        let stored = sink.load().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].rating.value(), 4);
        assert_eq!(stored[0].comment, "buena ayuda");
        assert_eq!(stored[1].rating.value(), 2);
    }

    #[tokio::test]
    async fn test_jsonl_sink_reports_persistence_error() {
        let temp = tempdir().unwrap();
        // A directory cannot be opened for appending
        let sink = JsonlFeedbackSink::new(temp.path());

        let err = sink
            .record(&FeedbackRecord::new(Rating::new(3).unwrap(), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Persistence(_)));
    }

    #[test]
    fn test_append_url() {
        let sink = SheetsFeedbackSink::new(
            "abc123",
            "Hoja 1",
            SheetsAuth::Token("secret-token".to_string()),
        )
        .with_api_base("http://localhost:9000/v4/spreadsheets/");
        assert_eq!(
            sink.append_url(),
            "http://localhost:9000/v4/spreadsheets/abc123/values/Hoja 1:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
        assert!(!format!("{:?}", sink).contains("secret-token"));
    }

    #[test]
    fn test_default_range_targets_first_worksheet() {
        let FeedbackConfig::Sheets { range, .. } = FeedbackConfig::default() else {
            panic!("default feedback goes to the spreadsheet");
        };
        let sink = SheetsFeedbackSink::new("abc123", range, SheetsAuth::Token("t".to_string()));
        assert_eq!(
            sink.append_url(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/A:C:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
    }

    #[test]
    fn test_service_account_key_is_validated() {
        assert!(matches!(
            SheetsAuth::service_account("{\"type\": \"service_account\"}"),
            Err(ChatError::Config(_))
        ));
        assert!(matches!(
            SheetsAuth::service_account("/nonexistent/service-account.json"),
            Err(ChatError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_token_used_as_bearer() {
        let auth = SheetsAuth::Token("ya29.token".to_string());
        assert_eq!(auth.bearer().await.unwrap(), "ya29.token");
    }

    #[test]
    fn test_sink_from_config() {
        let config = ChatConfig::default();
        assert!(matches!(sink_from_config(&config), Err(ChatError::Config(_))));

        let sheets = FeedbackConfig::Sheets {
            sheet_id: Some("abc123".to_string()),
            range: DEFAULT_SHEET_RANGE.to_string(),
        };

        // A sheet without any credential is a configuration error
        let config = ChatConfig {
            feedback: sheets.clone(),
            ..ChatConfig::default()
        };
        assert!(matches!(sink_from_config(&config), Err(ChatError::Config(_))));

        // The explicit token wins over a broken key
        let config = ChatConfig {
            feedback: sheets.clone(),
            credentials: Credentials {
                sheets_access_token: Some("token".to_string()),
                sheets_service_account: Some("{}".to_string()),
                ..Credentials::default()
            },
            ..ChatConfig::default()
        };
        assert!(sink_from_config(&config).is_ok());

        let config = ChatConfig {
            feedback: sheets,
            credentials: Credentials {
                sheets_service_account: Some("{}".to_string()),
                ..Credentials::default()
            },
            ..ChatConfig::default()
        };
        assert!(matches!(sink_from_config(&config), Err(ChatError::Config(_))));

        let config = ChatConfig {
            feedback: FeedbackConfig::Jsonl {
                path: PathBuf::from("feedback.jsonl"),
            },
            ..ChatConfig::default()
        };
        assert!(sink_from_config(&config).is_ok());
    }
}
