//! Coach chat types

use serde::{Deserialize, Serialize};

/// Chat message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Habit entry as it appears inside a [`UserContext`].
///
/// Callers usually pass whole habit rows; only the title is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitSummary {
    #[serde(default)]
    pub title: String,
}

/// Application state the caller attaches to a coach request.
///
/// The client forwards it untouched; the coach service folds it into the
/// system prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habits: Option<Vec<HabitSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_today: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_habits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation_triggers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<String>,
}

/// Row inserted into the `chat_messages` table after a finished exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewChatMessage {
    pub user_id: String,
    pub role: Role,
    pub content: String,
}

impl NewChatMessage {
    pub fn from_message(user_id: impl Into<String>, message: &Message) -> Self {
        Self {
            user_id: user_id.into(),
            role: message.role,
            content: message.content.clone(),
        }
    }
}
