//! Habit rows read by the analytics views

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A tracked habit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Habit {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            is_active: true,
        }
    }
}

/// One completion of a habit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitCompletion {
    pub id: String,
    pub habit_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_count() -> u32 {
    1
}

impl HabitCompletion {
    pub fn new(
        id: impl Into<String>,
        habit_id: impl Into<String>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            habit_id: habit_id.into(),
            completed_at,
            count: 1,
            duration_minutes: None,
            notes: None,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Calendar day the completion falls on
    pub fn day(&self) -> NaiveDate {
        self.completed_at.date_naive()
    }
}
