//! crates/workout_log_core/src/analysis.rs
//!
//! Aggregates a user's workout history into the figures shown on the
//! analysis page: totals, distributions, monthly trend and current streak.

use crate::domain::WorkoutRecord;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use std::collections::BTreeMap;

/// Longest gap, in whole days, between two workouts of the same streak.
pub const STREAK_MAX_GAP_DAYS: i64 = 2;

/// Aggregated view over a user's entire workout history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkoutSummary {
    pub total_workouts: usize,
    pub total_minutes: u64,
    /// Mean session length rounded half-up, 0 without workouts.
    pub average_minutes: u64,
    pub type_distribution: BTreeMap<String, usize>,
    /// Minutes per `YYYY-MM` month.
    pub monthly_minutes: BTreeMap<String, u64>,
    /// Workout count per weekday, Monday first.
    pub weekday_pattern: [usize; 7],
    pub this_month_workouts: usize,
    pub current_streak: usize,
}

impl WorkoutSummary {
    /// Months and weekdays are read in the offset carried by `now`.
    pub fn compute(workouts: &[WorkoutRecord], now: DateTime<FixedOffset>) -> Self {
        let offset = *now.offset();
        let current_month = month_key(now);

        let mut summary = Self {
            total_workouts: workouts.len(),
            current_streak: current_streak(workouts, now.with_timezone(&Utc)),
            ..Self::default()
        };

        for w in workouts {
            let minutes = u64::from(w.training_time);
            let local = w.date.with_timezone(&offset);
            let month = month_key(local);

            summary.total_minutes += minutes;
            *summary
                .type_distribution
                .entry(w.training_type.clone())
                .or_insert(0) += 1;
            summary.weekday_pattern[local.weekday().num_days_from_monday() as usize] += 1;
            if month == current_month {
                summary.this_month_workouts += 1;
            }
            *summary.monthly_minutes.entry(month).or_insert(0) += minutes;
        }

        let n = summary.total_workouts as u64;
        if n > 0 {
            summary.average_minutes = (2 * summary.total_minutes + n) / (2 * n);
        }

        summary
    }
}

fn month_key(instant: DateTime<FixedOffset>) -> String {
    format!("{:04}-{:02}", instant.year(), instant.month())
}

/// Counts the run of recent workouts with no gap longer than
/// [`STREAK_MAX_GAP_DAYS`], walking back from the newest one.
///
/// The streak is broken (0) when the newest workout is more than one whole
/// day older than `now`. Several workouts on the same day each count.
pub fn current_streak(workouts: &[WorkoutRecord], now: DateTime<Utc>) -> usize {
    let mut dates: Vec<DateTime<Utc>> = workouts.iter().map(|w| w.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let Some(newest) = dates.first() else {
        return 0;
    };
    if (now - *newest).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    for pair in dates.windows(2) {
        if (pair[0] - pair[1]).num_days() <= STREAK_MAX_GAP_DAYS {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn workout(date: DateTime<Utc>, minutes: u32, kind: &str) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            training_time: minutes,
            training_type: kind.to_string(),
            date,
            sensations: "ok".to_string(),
            created_at: date,
        }
    }

    #[test]
    fn empty_history_summarises_to_zero() {
        let now = at(2024, 5, 8, 12).fixed_offset();
        let summary = WorkoutSummary::compute(&[], now);
        assert_eq!(summary, WorkoutSummary::default());
    }

    #[test]
    fn totals_distribution_and_pattern() {
        let now = at(2024, 5, 15, 12).fixed_offset();
        let workouts = vec![
            // Monday, Wednesday in May; a Sunday in April
            workout(at(2024, 5, 13, 7), 30, "Running"),
            workout(at(2024, 5, 15, 7), 45, "Yoga"),
            workout(at(2024, 4, 28, 7), 60, "Running"),
        ];

        let summary = WorkoutSummary::compute(&workouts, now);
        assert_eq!(summary.total_workouts, 3);
        assert_eq!(summary.total_minutes, 135);
        assert_eq!(summary.average_minutes, 45);
        assert_eq!(summary.type_distribution["Running"], 2);
        assert_eq!(summary.type_distribution["Yoga"], 1);
        assert_eq!(summary.monthly_minutes["2024-05"], 75);
        assert_eq!(summary.monthly_minutes["2024-04"], 60);
        assert_eq!(summary.weekday_pattern, [1, 0, 1, 0, 0, 0, 1]);
        assert_eq!(summary.this_month_workouts, 2);
    }

    #[test]
    fn average_rounds_half_up() {
        let now = at(2024, 5, 15, 12).fixed_offset();
        let workouts = vec![
            workout(at(2024, 5, 1, 7), 30, "Yoga"),
            workout(at(2024, 5, 2, 7), 31, "Yoga"),
        ];
        assert_eq!(WorkoutSummary::compute(&workouts, now).average_minutes, 31);
    }

    #[test]
    fn streak_counts_back_until_a_long_gap() {
        let now = at(2024, 5, 15, 20);
        let workouts = vec![
            workout(at(2024, 5, 15, 7), 30, "Running"),
            workout(at(2024, 5, 13, 7), 30, "Running"),
            workout(at(2024, 5, 11, 7), 30, "Running"),
            workout(at(2024, 5, 1, 7), 30, "Running"),
        ];
        assert_eq!(current_streak(&workouts, now), 3);
    }

    #[test]
    fn stale_history_has_no_streak() {
        let now = at(2024, 5, 15, 20);
        let workouts = vec![
            workout(now - Duration::days(3), 30, "Running"),
            workout(now - Duration::days(4), 30, "Running"),
        ];
        assert_eq!(current_streak(&workouts, now), 0);
        assert_eq!(current_streak(&[], now), 0);
    }

    #[test]
    fn month_buckets_use_the_local_offset() {
        // 23:30 UTC on April 30th is already May at UTC+2.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at(2024, 5, 2, 12).with_timezone(&plus_two);
        let workouts = vec![workout(
            Utc.with_ymd_and_hms(2024, 4, 30, 23, 30, 0).unwrap(),
            40,
            "Cycling",
        )];

        let summary = WorkoutSummary::compute(&workouts, now);
        assert_eq!(summary.monthly_minutes["2024-05"], 40);
        assert_eq!(summary.this_month_workouts, 1);
    }
}
