//! HabitFlow AI - coach chat plumbing
//!
//! This crate provides:
//! - Stream transport client for the `habit-coach` function
//! - Incremental decoder for the server-sent-event reply body
//! - OpenAI-compatible gateway client used by the coach functions
//! - Coach prompts and motivation reply parsing

pub mod coach;
pub mod error;
pub mod gateway;
mod http_client;
pub mod motivation;
pub mod prompt;
pub mod sse;

// Re-export commonly used types
pub use coach::{ByteStream, ChatTransport, CoachClient};
pub use error::{APOLOGY_MESSAGE, AiError, Result};
pub use gateway::GatewayClient;
pub use http_client::build_http_client;
pub use motivation::parse_motivation;
pub use prompt::{COACH_SYSTEM_PROMPT, coach_system_prompt, motivation_messages};
pub use sse::{DecoderState, EventDecoder, FinalState, Frame, Scan, scan_frames};
