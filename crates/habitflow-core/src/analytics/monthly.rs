use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use habitflow_models::{Habit, HabitCompletion};
use serde::Serialize;

use super::percent;

const WINDOW_DAYS: u64 = 30;
const WEEKS: u64 = 4;
const TOP_HABITS: usize = 3;
const SPLIT_DAYS_AGO: u64 = 15;
const DROP_THRESHOLD_PERCENT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitCount {
    pub title: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitDrop {
    pub title: String,
    pub drop_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub total_completed: u32,
    pub total_possible: u32,
    pub consistency_score: u32,
    pub total_hours: f64,
    pub top_habits: Vec<HabitCount>,
    pub drop_rate_habits: Vec<HabitDrop>,
    /// Oldest week first
    pub weekly_scores: Vec<u32>,
    pub daily_completions: Vec<DailyCount>,
}

/// Statistics over the 30 days ending `today`.
///
/// Only active habits count towards the possible total.
pub fn monthly_progress(
    today: NaiveDate,
    habits: &[Habit],
    completions: &[HabitCompletion],
) -> MonthlyStats {
    let window_start = today - Days::new(WINDOW_DAYS - 1);
    let active: Vec<&Habit> = habits.iter().filter(|h| h.is_active).collect();
    let habit_count = active.len() as u32;

    let in_window: Vec<&HabitCompletion> = completions
        .iter()
        .filter(|c| (window_start..=today).contains(&c.day()))
        .collect();

    let mut per_day: HashMap<NaiveDate, u32> = HashMap::new();
    for completion in &in_window {
        *per_day.entry(completion.day()).or_default() += 1;
    }

    let daily_completions: Vec<DailyCount> = window_start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| DailyCount {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect();

    let weekly_scores = (0..WEEKS)
        .map(|week| {
            let end = today - Days::new((WEEKS - 1 - week) * 7);
            let start = end - Days::new(6);
            let completed: u32 = daily_completions
                .iter()
                .filter(|d| (start..=end).contains(&d.date))
                .map(|d| d.count)
                .sum();
            percent(completed, 7 * habit_count)
        })
        .collect();

    let titles: HashMap<&str, &str> = habits
        .iter()
        .map(|h| (h.id.as_str(), h.title.as_str()))
        .collect();

    // Counts in the order habits first appear, so ties keep that order
    let mut per_habit: Vec<(&str, u32)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for completion in &in_window {
        let id = completion.habit_id.as_str();
        let slot = *slots.entry(id).or_insert_with(|| {
            per_habit.push((id, 0));
            per_habit.len() - 1
        });
        per_habit[slot].1 += 1;
    }
    let mut top_habits: Vec<HabitCount> = per_habit
        .iter()
        .map(|(id, count)| HabitCount {
            title: titles.get(id).copied().unwrap_or("Unknown").to_string(),
            count: *count,
        })
        .collect();
    top_habits.sort_by(|a, b| b.count.cmp(&a.count));
    top_habits.truncate(TOP_HABITS);

    let split = today - Days::new(SPLIT_DAYS_AGO);
    let mut drop_rate_habits: Vec<HabitDrop> = active
        .iter()
        .filter_map(|habit| {
            let (first, second) = in_window
                .iter()
                .filter(|c| c.habit_id == habit.id)
                .fold((0u32, 0u32), |(first, second), c| {
                    if c.day() < split {
                        (first + 1, second)
                    } else {
                        (first, second + 1)
                    }
                });
            if first == 0 || second >= first {
                return None;
            }
            let drop_percent = percent(first - second, first);
            (drop_percent > DROP_THRESHOLD_PERCENT).then(|| HabitDrop {
                title: habit.title.clone(),
                drop_percent,
            })
        })
        .collect();
    drop_rate_habits.sort_by(|a, b| b.drop_percent.cmp(&a.drop_percent));

    let total_minutes: u32 = in_window
        .iter()
        .map(|c| c.duration_minutes.unwrap_or(0))
        .sum();
    let total_hours = (total_minutes as f64 / 60.0 * 10.0).round() / 10.0;

    let total_completed = in_window.len() as u32;
    let total_possible = daily_completions.len() as u32 * habit_count;

    MonthlyStats {
        total_completed,
        total_possible,
        consistency_score: percent(total_completed, total_possible),
        total_hours,
        top_habits,
        drop_rate_habits,
        weekly_scores,
        daily_completions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn done(habit: &str, days_ago: u64) -> HabitCompletion {
        let day = today() - Days::new(days_ago);
        let at = Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap());
        HabitCompletion::new(format!("{habit}-{days_ago}"), habit, at)
    }

    fn habits() -> Vec<Habit> {
        vec![
            Habit::new("read", "Read"),
            Habit::new("run", "Run"),
            Habit::new("sleep", "Sleep early"),
        ]
    }

    #[test]
    fn window_covers_thirty_days_including_today() {
        let completions = vec![done("read", 0), done("read", 29), done("read", 30)];
        let stats = monthly_progress(today(), &habits(), &completions);

        assert_eq!(stats.daily_completions.len(), 30);
        assert_eq!(stats.daily_completions[0].count, 1);
        assert_eq!(stats.daily_completions[29].count, 1);
        assert_eq!(stats.total_completed, 2);
        assert_eq!(stats.total_possible, 90);
        assert_eq!(stats.consistency_score, 2);
    }

    #[test]
    fn weekly_scores_are_oldest_first() {
        let completions: Vec<_> = (0..7).map(|d| done("read", d)).collect();
        let stats = monthly_progress(today(), &habits(), &completions);
        // 7 of 21 possible in the latest week
        assert_eq!(stats.weekly_scores, vec![0, 0, 0, 33]);
    }

    #[test]
    fn ranks_top_habits_and_falls_back_to_unknown() {
        let mut completions = vec![done("run", 1), done("run", 2), done("run", 3)];
        completions.extend([done("read", 1), done("read", 2)]);
        completions.extend([done("gone", 1)]);
        completions.extend((4..8).map(|d| done("sleep", d)));

        let stats = monthly_progress(today(), &habits(), &completions);
        let top: Vec<(&str, u32)> = stats
            .top_habits
            .iter()
            .map(|h| (h.title.as_str(), h.count))
            .collect();
        assert_eq!(top, vec![("Sleep early", 4), ("Run", 3), ("Read", 2)]);

        let only_unknown = monthly_progress(today(), &[], &[done("gone", 1)]);
        assert_eq!(only_unknown.top_habits[0].title, "Unknown");
        assert_eq!(only_unknown.consistency_score, 0);
    }

    #[test]
    fn tied_habits_keep_first_seen_order() {
        let habits = vec![Habit::new("zeta", "Zeta"), Habit::new("alpha", "Alpha")];
        let completions = vec![
            done("zeta", 1),
            done("zeta", 2),
            done("alpha", 1),
            done("alpha", 2),
        ];
        let stats = monthly_progress(today(), &habits, &completions);
        let titles: Vec<&str> = stats.top_habits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn detects_dropping_habits() {
        let mut completions: Vec<_> = (16..26).map(|d| done("run", d)).collect();
        completions.extend((0..2).map(|d| done("run", d)));
        // Slight drop only: 4 before, 4 after
        completions.extend((16..20).map(|d| done("read", d)));
        completions.extend((0..4).map(|d| done("read", d)));
        // 5 before, 4 after: 20% is not enough
        completions.extend((16..21).map(|d| done("sleep", d)));
        completions.extend((0..4).map(|d| done("sleep", d)));

        let stats = monthly_progress(today(), &habits(), &completions);
        assert_eq!(
            stats.drop_rate_habits,
            vec![HabitDrop {
                title: "Run".into(),
                drop_percent: 80
            }]
        );
    }

    #[test]
    fn totals_hours_to_one_decimal() {
        let completions = vec![
            done("read", 0).with_duration(25),
            done("run", 1).with_duration(40),
            done("run", 2),
        ];
        let stats = monthly_progress(today(), &habits(), &completions);
        assert_eq!(stats.total_hours, 1.1);
    }
}
