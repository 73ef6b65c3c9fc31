//! HabitFlow core: the coaching session, chat persistence and dashboard
//! analytics.

pub mod analytics;
pub mod session;
pub mod store;

pub use session::{AuthSession, CoachSession, GREETING, SendOutcome, TranscriptSnapshot};
pub use store::{
    ChatMessageStore, InMemoryChatStore, StoreError, StoredChatMessage, SupabaseChatStore,
};
