use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use habitflow_models::HabitCompletion;

/// Longest run of consecutive days with at least one completion
pub fn max_streak(completions: &[HabitCompletion]) -> u32 {
    let days: BTreeSet<NaiveDate> = completions.iter().map(HabitCompletion::day).collect();

    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        best = best.max(current);
        previous = Some(day);
    }
    best
}

/// Days in a row ending today (or yesterday, if today has nothing yet).
///
/// Only the last week is inspected, so the result never exceeds 7.
pub fn current_streak(completions: &[HabitCompletion], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = completions.iter().map(HabitCompletion::day).collect();

    let mut streak = 0;
    for offset in 0..7u64 {
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };
        if days.contains(&day) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}
