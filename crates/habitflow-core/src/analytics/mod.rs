//! Dashboard analytics
//!
//! Pure aggregations over habits and completions that were fetched for the
//! current user. Completions are bucketed by the UTC calendar day they fall on.

mod monthly;
mod streak;
mod weekly;

pub use monthly::{DailyCount, HabitCount, HabitDrop, MonthlyStats, monthly_progress};
pub use streak::{current_streak, max_streak};
pub use weekly::{DayProgress, WeeklyProgress, WeeklyStats, week_start, weekly_progress};

/// Round half up, the way the dashboard displays scores
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Whole percentage of `part` over `whole`, zero when `whole` is zero
pub(crate) fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0) as u32
}
