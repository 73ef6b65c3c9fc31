//! Motivation generation payloads

use serde::{Deserialize, Serialize};

use crate::chat::HabitSummary;

/// Input for a generated motivation message
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MotivationRequest {
    #[serde(default)]
    pub habits: Vec<HabitSummary>,
    #[serde(default)]
    pub completed_today: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl MotivationRequest {
    /// Share of today's habits already completed, as a whole percentage
    pub fn completion_rate(&self) -> u32 {
        if self.habits.is_empty() {
            return 0;
        }
        (self.completed_today as f64 / self.habits.len() as f64 * 100.0).round() as u32
    }
}

/// Generated motivation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Motivation {
    pub motivation: String,
    pub tips: Vec<String>,
    pub encouragement: String,
}

impl Motivation {
    /// Wrap free text that did not come back in the structured shape
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            motivation: text.into(),
            tips: vec![
                "Keep going!".to_string(),
                "Stay consistent!".to_string(),
                "Celebrate small wins!".to_string(),
            ],
            encouragement: "You've got this!".to_string(),
        }
    }

    /// Message shown when generation is unavailable
    pub fn fallback() -> Self {
        Self {
            motivation: "Keep building those habits! Every small step counts.".to_string(),
            tips: vec![
                "Start with just 2 minutes".to_string(),
                "Stack habits together".to_string(),
                "Track your progress".to_string(),
            ],
            encouragement: "You're doing great!".to_string(),
        }
    }
}
