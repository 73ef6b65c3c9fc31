//! Coach chat session
//!
//! Owns the transcript for one open coaching surface. Each [`CoachSession::send`]
//! appends the user's message, streams the assistant reply into a placeholder
//! message and publishes every change as a full snapshot.

use std::sync::Arc;

use futures::StreamExt;
use habitflow_ai::{APOLOGY_MESSAGE, AiError, ChatTransport, EventDecoder, FinalState};
use habitflow_models::{Message, NewChatMessage, Role, UserContext};
use tokio::sync::watch;

use crate::store::ChatMessageStore;

/// First assistant message of every session
pub const GREETING: &str = "Hey! 👋 I'm your HabitFlow Coach. I'm here to help you build better habits, stay motivated, and achieve your goals. How are you feeling today?";

/// Signed-in user. Chats are only saved when the user id is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: Option<String>,
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: Some(user_id.into()),
        }
    }

    pub fn token_only(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: None,
        }
    }
}

/// Published state of the transcript. Each snapshot replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSnapshot {
    pub messages: Vec<Message>,
    pub loading: bool,
}

impl TranscriptSnapshot {
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// How a call to [`CoachSession::send`] ended
#[derive(Debug)]
pub enum SendOutcome {
    /// Blank input, or a turn was already in flight; nothing was sent
    Ignored,
    /// The reply stream reached its end
    Completed(FinalState),
    /// The turn failed; the transcript already shows the failure
    Failed(AiError),
}

pub struct CoachSession {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn ChatMessageStore>,
    auth: Option<AuthSession>,
    context: UserContext,
    transcript: Vec<Message>,
    loading: bool,
    updates: watch::Sender<TranscriptSnapshot>,
}

/// Holds the session for the duration of one turn.
///
/// If the `send` future is dropped before the turn closes, the guard settles
/// the turn: an empty reply placeholder becomes the apology and loading is
/// cleared.
struct TurnGuard<'a> {
    session: &'a mut CoachSession,
    closed: bool,
}

impl TurnGuard<'_> {
    fn close(&mut self) {
        self.session.loading = false;
        self.session.publish();
        self.closed = true;
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::warn!("Coach turn abandoned before the reply finished");
        if let Some(last) = self.session.transcript.last()
            && last.role == Role::Assistant
            && last.content.is_empty()
        {
            self.session.replace_reply(APOLOGY_MESSAGE);
        }
        self.session.loading = false;
        self.session.publish();
    }
}

impl CoachSession {
    pub fn new(transport: Arc<dyn ChatTransport>, store: Arc<dyn ChatMessageStore>) -> Self {
        let transcript = vec![Message::assistant(GREETING)];
        let (updates, _) = watch::channel(TranscriptSnapshot {
            messages: transcript.clone(),
            loading: false,
        });

        Self {
            transport,
            store,
            auth: None,
            context: UserContext::default(),
            transcript,
            loading: false,
            updates,
        }
    }

    pub fn with_auth(mut self, auth: AuthSession) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_context(mut self, context: UserContext) -> Self {
        self.context = context;
        self
    }

    pub fn set_auth(&mut self, auth: Option<AuthSession>) {
        self.auth = auth;
    }

    pub fn set_context(&mut self, context: UserContext) {
        self.context = context;
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Receive every published transcript snapshot
    pub fn subscribe(&self) -> watch::Receiver<TranscriptSnapshot> {
        self.updates.subscribe()
    }

    fn publish(&self) {
        self.updates.send_replace(TranscriptSnapshot {
            messages: self.transcript.clone(),
            loading: self.loading,
        });
    }

    fn replace_reply(&mut self, content: &str) {
        if let Some(last) = self.transcript.last_mut()
            && last.role == Role::Assistant
        {
            last.content = content.to_string();
        }
    }

    /// Run one send/receive cycle.
    ///
    /// Failures never escape as errors: they are written into the transcript
    /// and reported through [`SendOutcome::Failed`], and the session stays
    /// usable for the next turn.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        let input = input.trim();
        if input.is_empty() || self.loading {
            return SendOutcome::Ignored;
        }

        let user_message = Message::user(input);
        self.transcript.push(user_message.clone());
        self.loading = true;
        self.publish();

        let mut turn = TurnGuard {
            session: self,
            closed: false,
        };

        let access_token = turn
            .session
            .auth
            .as_ref()
            .map(|auth| auth.access_token.clone());
        let opened = turn
            .session
            .transport
            .open_stream(
                access_token.as_deref(),
                &turn.session.transcript,
                &turn.session.context,
            )
            .await;

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(error = %error, "Coach turn failed to start");
                turn.session
                    .transcript
                    .push(Message::assistant(error.user_message()));
                turn.close();
                return SendOutcome::Failed(error);
            }
        };

        turn.session.transcript.push(Message::assistant(""));
        turn.session.publish();

        let mut decoder = EventDecoder::new();
        let mut reply = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        received_chars = reply.chars().count(),
                        "Coach stream interrupted"
                    );
                    decoder.fail();
                    if reply.is_empty() {
                        turn.session.replace_reply(APOLOGY_MESSAGE);
                    }
                    turn.close();
                    return SendOutcome::Failed(error);
                }
            };

            for delta in decoder.feed(&bytes) {
                reply.push_str(&delta);
                turn.session.replace_reply(&reply);
                turn.session.publish();
            }
        }

        let final_state = decoder.finish();
        turn.close();
        tracing::debug!(
            sentinel_seen = final_state.sentinel_seen,
            discarded_bytes = final_state.discarded_bytes,
            "Coach reply complete"
        );

        turn.session
            .persist_exchange(&user_message, &Message::assistant(reply))
            .await;

        SendOutcome::Completed(final_state)
    }

    /// Best-effort write of a finished exchange. Failures are only logged.
    async fn persist_exchange(&self, user_message: &Message, reply: &Message) {
        let Some(auth) = &self.auth else {
            return;
        };
        let Some(user_id) = auth.user_id.as_deref() else {
            tracing::debug!("No user id, chat exchange not saved");
            return;
        };

        let user_row = NewChatMessage::from_message(user_id, user_message);
        let reply_row = NewChatMessage::from_message(user_id, reply);
        let (user_result, reply_result) = futures::join!(
            self.store.insert(auth, &user_row),
            self.store.insert(auth, &reply_row)
        );

        for (role, result) in [("user", user_result), ("assistant", reply_result)] {
            if let Err(error) = result {
                tracing::warn!(role, error = %error, "Failed to save chat message");
            }
        }
    }
}
