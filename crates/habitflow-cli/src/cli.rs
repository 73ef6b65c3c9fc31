use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "habitflow")]
#[command(version, about = "HabitFlow - habit coaching from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/habitflow/config.toml)
    #[arg(long, global = true, env = "HABITFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the habit coach
    Coach(CoachArgs),

    /// Generate a motivation message for today
    Motivate(MotivateArgs),

    /// Weekly, monthly and streak statistics from exported rows
    Stats(StatsArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct CoachArgs {
    /// Send a single message and exit
    #[arg(short, long)]
    pub message: Option<String>,

    /// Current mood, shared with the coach
    #[arg(long)]
    pub mood: Option<String>,

    /// Habit titles, shared with the coach
    #[arg(long = "habit")]
    pub habits: Vec<String>,

    /// Habits completed today
    #[arg(long)]
    pub completed: Option<u32>,
}

#[derive(Args)]
pub struct MotivateArgs {
    /// Today's habit titles
    #[arg(long = "habit")]
    pub habits: Vec<String>,

    /// Habits completed today
    #[arg(long, default_value_t = 0)]
    pub completed: u32,

    #[arg(long)]
    pub mood: Option<String>,

    #[arg(long)]
    pub reflection: Option<String>,
}

#[derive(Args)]
pub struct StatsArgs {
    /// JSON array of habit rows
    #[arg(long)]
    pub habits: PathBuf,

    /// JSON array of completion rows
    #[arg(long)]
    pub completions: PathBuf,

    /// Day to report on (defaults to today, UTC)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}
