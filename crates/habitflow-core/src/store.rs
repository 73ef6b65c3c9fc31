//! Append-only storage for finished coach exchanges

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use habitflow_models::{NewChatMessage, Role};
use parking_lot::Mutex;
use reqwest::Client;
use thiserror::Error;
use uuid::Uuid;

use crate::session::AuthSession;

const CHAT_MESSAGES_TABLE: &str = "chat_messages";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Insert rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Destination for chat message rows
#[async_trait]
pub trait ChatMessageStore: Send + Sync {
    async fn insert(&self, auth: &AuthSession, row: &NewChatMessage) -> Result<(), StoreError>;
}

/// Inserts rows through the hosted table REST interface
pub struct SupabaseChatStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseChatStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, StoreError> {
        let client = habitflow_ai::build_http_client()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, CHAT_MESSAGES_TABLE)
    }
}

#[async_trait]
impl ChatMessageStore for SupabaseChatStore {
    async fn insert(&self, auth: &AuthSession, row: &NewChatMessage) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&auth.access_token)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Row as kept by [`InMemoryChatStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChatMessage {
    pub id: Uuid,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Process-local store for tests and offline use
#[derive(Default)]
pub struct InMemoryChatStore {
    rows: Mutex<Vec<StoredChatMessage>>,
    fail_inserts: bool,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects every insert
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_inserts: true,
        }
    }

    pub fn rows(&self) -> Vec<StoredChatMessage> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl ChatMessageStore for InMemoryChatStore {
    async fn insert(&self, _auth: &AuthSession, row: &NewChatMessage) -> Result<(), StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Unavailable("inserts disabled".to_string()));
        }

        self.rows.lock().push(StoredChatMessage {
            id: Uuid::new_v4(),
            user_id: row.user_id.clone(),
            role: row.role,
            content: row.content.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}
