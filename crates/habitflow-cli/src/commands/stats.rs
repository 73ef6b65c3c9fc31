use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use colored::Colorize;
use habitflow_core::analytics::{
    MonthlyStats, WeeklyProgress, current_streak, max_streak, monthly_progress, weekly_progress,
};
use habitflow_models::{Habit, HabitCompletion};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cli::{OutputFormat, StatsArgs};

#[derive(Debug, Serialize)]
pub struct Report {
    pub today: NaiveDate,
    pub weekly: WeeklyProgress,
    pub monthly: MonthlyStats,
    pub current_streak: u32,
    pub max_streak: u32,
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid rows in {}", path.display()))
}

pub fn build_report(
    today: NaiveDate,
    habits: &[Habit],
    completions: &[HabitCompletion],
) -> Report {
    let active = habits.iter().filter(|h| h.is_active).count() as u32;
    Report {
        today,
        weekly: weekly_progress(today, active, completions),
        monthly: monthly_progress(today, habits, completions),
        current_streak: current_streak(completions, today),
        max_streak: max_streak(completions),
    }
}

fn render(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "This week".bold()));
    for day in &report.weekly.days {
        out.push_str(&format!(
            "  {} {}/{} ({}%)\n",
            day.day_name, day.completed, day.total, day.percentage
        ));
    }
    let week = &report.weekly.stats;
    out.push_str(&format!(
        "  consistency {}%, best {}, worst {}, {:+}% vs last week\n",
        week.consistency_score, week.best_day, week.worst_day, week.improvement_percent
    ));

    let month = &report.monthly;
    out.push_str(&format!("{}\n", "Last 30 days".bold()));
    out.push_str(&format!(
        "  {}/{} completions ({}%), {:.1} hours\n",
        month.total_completed, month.total_possible, month.consistency_score, month.total_hours
    ));
    for habit in &month.top_habits {
        out.push_str(&format!("  top: {} ({})\n", habit.title, habit.count));
    }
    for habit in &month.drop_rate_habits {
        out.push_str(&format!(
            "  {}: {} down {}%\n",
            "slipping".yellow(),
            habit.title,
            habit.drop_percent
        ));
    }
    out.push_str(&format!(
        "Streak: {} days (best {})",
        report.current_streak, report.max_streak
    ));
    out
}

pub fn run(args: StatsArgs, format: OutputFormat) -> Result<()> {
    let habits: Vec<Habit> = read_rows(&args.habits)?;
    let completions: Vec<HabitCompletion> = read_rows(&args.completions)?;
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    let report = build_report(today, &habits, &completions);
    if format.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render(&report));
    }
    Ok(())
}
