use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use habitflow_core::{
    ChatMessageStore, CoachSession, InMemoryChatStore, SendOutcome, SupabaseChatStore,
    TranscriptSnapshot,
};
use habitflow_models::{HabitSummary, Role, UserContext};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::coach_client;
use crate::cli::CoachArgs;
use crate::config::ClientConfig;

/// Turns published snapshots into text to append to the terminal.
///
/// Snapshots only ever carry the whole transcript, so the printer remembers
/// what it already wrote for the current reply and emits the difference.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    skip: usize,
    reply_index: Option<usize>,
    printed: String,
}

impl StreamPrinter {
    /// Ignore the first `skip` messages (already on screen)
    pub fn new(skip: usize) -> Self {
        Self {
            skip,
            ..Self::default()
        }
    }

    pub fn render(&mut self, snapshot: &TranscriptSnapshot) -> Option<String> {
        let index = snapshot.messages.len().checked_sub(1)?;
        let last = &snapshot.messages[index];
        if index < self.skip || last.role != Role::Assistant {
            return None;
        }

        if self.reply_index != Some(index) {
            self.reply_index = Some(index);
            self.printed.clear();
        }

        let out = match last.content.strip_prefix(self.printed.as_str()) {
            Some(rest) => rest.to_string(),
            // Reply was replaced rather than extended
            None => format!("\n{}", last.content),
        };
        self.printed = last.content.clone();
        (!out.is_empty()).then_some(out)
    }
}

fn user_context(args: &CoachArgs) -> UserContext {
    let habits: Option<Vec<HabitSummary>> = (!args.habits.is_empty()).then(|| {
        args.habits
            .iter()
            .map(|title| HabitSummary {
                title: title.clone(),
            })
            .collect()
    });
    UserContext {
        total_habits: habits.as_ref().map(|h| h.len() as u32),
        habits,
        completed_today: args.completed,
        mood: args.mood.clone(),
        ..UserContext::default()
    }
}

fn build_store(config: &ClientConfig) -> Result<Arc<dyn ChatMessageStore>> {
    match (&config.project.url, &config.project.api_key) {
        (Some(url), Some(key)) => Ok(Arc::new(SupabaseChatStore::new(url, key)?)),
        _ => {
            tracing::info!("No project key configured, keeping chat history in memory");
            Ok(Arc::new(InMemoryChatStore::new()))
        }
    }
}

async fn run_turn(session: &mut CoachSession, input: &str) -> SendOutcome {
    let mut updates = session.subscribe();
    let mut printer = StreamPrinter::new(session.transcript().len());
    let mut stdout = std::io::stdout();

    print!("{} ", "coach>".green().bold());
    let outcome = {
        let send = session.send(input);
        tokio::pin!(send);
        loop {
            tokio::select! {
                outcome = &mut send => break outcome,
                Ok(()) = updates.changed() => {
                    let snapshot = updates.borrow_and_update().clone();
                    if let Some(text) = printer.render(&snapshot) {
                        print!("{text}");
                        let _ = stdout.flush();
                    }
                }
            }
        }
    };

    let snapshot = updates.borrow().clone();
    if let Some(text) = printer.render(&snapshot) {
        print!("{text}");
    }
    println!();
    outcome
}

pub async fn run(config: &ClientConfig, args: CoachArgs) -> Result<()> {
    let transport = Arc::new(coach_client(config)?);
    let mut session =
        CoachSession::new(transport, build_store(config)?).with_context(user_context(&args));
    session.set_auth(config.auth_session());

    if let Some(message) = &args.message {
        if let SendOutcome::Failed(error) = run_turn(&mut session, message).await {
            anyhow::bail!(error);
        }
        return Ok(());
    }

    if let Some(greeting) = session.transcript().first() {
        println!("{} {}", "coach>".green().bold(), greeting.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        match run_turn(&mut session, &line).await {
            SendOutcome::Failed(error) => tracing::warn!(error = %error, "Coach turn failed"),
            SendOutcome::Completed(state) if !state.sentinel_seen => {
                tracing::debug!("Reply ended without a completion marker")
            }
            _ => {}
        }
    }

    Ok(())
}
