//! Shared model types for HabitFlow
//!
//! Wire shapes exchanged between the coach client, the coach function
//! service and the hosted tables.

mod chat;
mod habit;
mod motivation;

pub use chat::{HabitSummary, Message, NewChatMessage, Role, UserContext};
pub use habit::{Habit, HabitCompletion};
pub use motivation::{Motivation, MotivationRequest};
