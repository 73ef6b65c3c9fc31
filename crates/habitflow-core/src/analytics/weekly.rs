use chrono::{Datelike, Days, NaiveDate};
use habitflow_models::HabitCompletion;
use serde::Serialize;

use super::{percent, round_half_up};

/// One day of the current week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub day_name: String,
    pub completed: u32,
    pub total: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyStats {
    pub total_completed: u32,
    pub total_possible: u32,
    pub consistency_score: u32,
    pub best_day: String,
    pub worst_day: String,
    /// Change against the whole previous week, in percent
    pub improvement_percent: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyProgress {
    pub days: Vec<DayProgress>,
    pub stats: WeeklyStats,
}

/// Monday of the week containing `day`
pub fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = day.weekday().num_days_from_monday() as u64;
    day - Days::new(offset)
}

fn count_between(completions: &[HabitCompletion], from: NaiveDate, to: NaiveDate) -> u32 {
    completions
        .iter()
        .filter(|c| (from..=to).contains(&c.day()))
        .count() as u32
}

/// Progress from Monday through `today`, compared with the previous week.
///
/// `completions` may span both weeks; anything outside them is ignored.
pub fn weekly_progress(
    today: NaiveDate,
    habit_count: u32,
    completions: &[HabitCompletion],
) -> WeeklyProgress {
    let start = week_start(today);

    let days: Vec<DayProgress> = start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| {
            let completed = count_between(completions, day, day);
            DayProgress {
                date: day,
                day_name: day.format("%a").to_string(),
                completed,
                total: habit_count,
                percentage: percent(completed, habit_count),
            }
        })
        .collect();

    let total_completed: u32 = days.iter().map(|d| d.completed).sum();
    let total_possible: u32 = days.iter().map(|d| d.total).sum();

    let mut ranked: Vec<&DayProgress> = days.iter().collect();
    ranked.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    let best_day = ranked
        .first()
        .map(|d| d.day_name.clone())
        .unwrap_or_else(|| "-".to_string());
    let worst_day = ranked
        .last()
        .map(|d| d.day_name.clone())
        .unwrap_or_else(|| "-".to_string());

    let last_week_total = count_between(
        completions,
        start - Days::new(7),
        start - Days::new(1),
    );
    let improvement_percent = if last_week_total > 0 {
        let change = total_completed as f64 - last_week_total as f64;
        round_half_up(change / last_week_total as f64 * 100.0) as i32
    } else {
        0
    };

    WeeklyProgress {
        stats: WeeklyStats {
            total_completed,
            total_possible,
            consistency_score: percent(total_completed, total_possible),
            best_day,
            worst_day,
            improvement_percent,
        },
        days,
    }
}
