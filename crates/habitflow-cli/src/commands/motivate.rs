use anyhow::Result;
use colored::Colorize;
use habitflow_models::{HabitSummary, Motivation, MotivationRequest};

use super::coach_client;
use crate::cli::{MotivateArgs, OutputFormat};
use crate::config::ClientConfig;

fn request_from(args: MotivateArgs) -> MotivationRequest {
    MotivationRequest {
        habits: args
            .habits
            .into_iter()
            .map(|title| HabitSummary { title })
            .collect(),
        completed_today: args.completed,
        mood: args.mood,
        reflection: args.reflection,
    }
}

fn render(motivation: &Motivation) -> String {
    let mut out = format!("{}\n", motivation.motivation.bold());
    for tip in &motivation.tips {
        out.push_str(&format!("  • {}\n", tip));
    }
    out.push_str(&motivation.encouragement.green().to_string());
    out
}

pub async fn run(config: &ClientConfig, args: MotivateArgs, format: OutputFormat) -> Result<()> {
    let client = coach_client(config)?;
    let request = request_from(args);
    tracing::debug!(
        habits = request.habits.len(),
        rate = request.completion_rate(),
        "Requesting motivation"
    );

    let motivation = client
        .generate_motivation(config.auth.access_token.as_deref(), &request)
        .await?;

    if format.is_json() {
        println!("{}", serde_json::to_string_pretty(&motivation)?);
    } else {
        println!("{}", render(&motivation));
    }
    Ok(())
}
