//! crates/workout_log_core/src/progress.rs
//!
//! Goal-progress evaluation. Maps a goal's cadence onto the calendar period
//! containing a reference instant, then measures the workouts logged inside
//! that period against the goal's target.
//!
//! Calendar arithmetic (where a week or month begins) happens in the local
//! offset carried by `now`; all comparisons happen on UTC instants.

use crate::domain::{Goal, GoalCadence, GoalUnit, WorkoutRecord};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

/// An inclusive `[start, end]` range of instants, precise to the millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    /// The week (Monday to Sunday) or calendar month containing `now`.
    pub fn containing(cadence: GoalCadence, now: DateTime<FixedOffset>) -> Self {
        let today = now.date_naive();
        let (first_day, next_first_day) = match cadence {
            GoalCadence::Weekly => {
                // Sunday counts as the last day of the week.
                let monday =
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                (monday, monday + Duration::days(7))
            }
            GoalCadence::Monthly => {
                let first = today - Duration::days(i64::from(today.day0()));
                (first, first_of_next_month(first))
            }
        };

        let offset = *now.offset();
        Self {
            start: local_midnight_as_utc(first_day, offset),
            end: local_midnight_as_utc(next_first_day, offset) - Duration::milliseconds(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

fn first_of_next_month(first: NaiveDate) -> NaiveDate {
    // 32 days past the 1st always lands in the following month.
    let later = first + Duration::days(32);
    later - Duration::days(i64::from(later.day0()))
}

fn local_midnight_as_utc(day: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = day.and_time(NaiveTime::MIN);
    (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// Where a goal stands within its current period.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    /// Workouts counted, or hours to one decimal. Not capped at the target.
    pub current: f64,
    pub target_value: f64,
    /// `current / target_value * 100`, capped at 100 and left unrounded.
    pub percentage: f64,
    pub is_completed: bool,
    pub period: PeriodWindow,
}

/// Evaluates `goal` against `workouts` for the period containing `now`.
///
/// Only workouts dated within `[max(goal.start_date, period.start), period.end]`
/// count. `workouts` may be in any order and is expected to belong to the
/// goal's owner.
pub fn evaluate_goal_progress(
    goal: &Goal,
    workouts: &[WorkoutRecord],
    now: DateTime<FixedOffset>,
) -> GoalProgress {
    let period = PeriodWindow::containing(goal.cadence, now);
    let effective_start = goal.start_date.max(period.start);

    let counted = workouts
        .iter()
        .filter(|w| effective_start <= w.date && w.date <= period.end);

    let current = match goal.unit {
        GoalUnit::Workouts => counted.count() as f64,
        GoalUnit::Hours => minutes_to_hours(counted.map(|w| u64::from(w.training_time)).sum()),
    };

    let target_value = goal.target_value.get();
    let percentage = (current / target_value * 100.0).min(100.0);

    GoalProgress {
        current,
        target_value,
        percentage,
        is_completed: percentage >= 100.0,
        period,
    }
}

/// Converts minutes to hours rounded half-up to one decimal place.
pub fn minutes_to_hours(minutes: u64) -> f64 {
    // Tenths of an hour are minutes / 6; adding 3 rounds the halves up.
    ((minutes + 3) / 6) as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetValue;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn goal(cadence: GoalCadence, target: f64, unit: GoalUnit, start: DateTime<Utc>) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            cadence,
            target_value: TargetValue::new(target).unwrap(),
            unit,
            start_date: start,
            is_active: true,
            created_at: start,
        }
    }

    fn workout(date: DateTime<Utc>, minutes: u32) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            training_time: minutes,
            training_type: "Running".to_string(),
            date,
            sensations: "fine".to_string(),
            created_at: date,
        }
    }

    #[test]
    fn weekly_window_runs_monday_to_sunday() {
        // 2024-05-08 is a Wednesday.
        let now = at(2024, 5, 8, 12, 0).with_timezone(&utc());
        let window = PeriodWindow::containing(GoalCadence::Weekly, now);
        assert_eq!(window.start, at(2024, 5, 6, 0, 0));
        assert_eq!(
            window.end,
            at(2024, 5, 13, 0, 0) - Duration::milliseconds(1)
        );
    }

    #[test]
    fn sunday_belongs_to_the_week_that_started_on_monday() {
        // 2024-05-12 is a Sunday.
        let now = at(2024, 5, 12, 22, 0).with_timezone(&utc());
        let window = PeriodWindow::containing(GoalCadence::Weekly, now);
        assert_eq!(window.start, at(2024, 5, 6, 0, 0));
        assert!(window.contains(at(2024, 5, 12, 23, 59)));
    }

    #[test]
    fn monthly_window_handles_short_and_leap_months() {
        let feb = at(2024, 2, 10, 9, 0).with_timezone(&utc());
        let window = PeriodWindow::containing(GoalCadence::Monthly, feb);
        assert_eq!(window.start, at(2024, 2, 1, 0, 0));
        assert_eq!(window.end, at(2024, 3, 1, 0, 0) - Duration::milliseconds(1));

        let dec = at(2023, 12, 31, 23, 0).with_timezone(&utc());
        let window = PeriodWindow::containing(GoalCadence::Monthly, dec);
        assert_eq!(window.start, at(2023, 12, 1, 0, 0));
        assert_eq!(window.end, at(2024, 1, 1, 0, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn window_follows_the_local_offset() {
        // Monday 01:00 at UTC+2 is still Sunday in UTC.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at(2024, 5, 5, 23, 0).with_timezone(&plus_two);
        let window = PeriodWindow::containing(GoalCadence::Weekly, now);
        assert_eq!(window.start, at(2024, 5, 5, 22, 0));
    }

    #[test]
    fn weekly_three_workouts_completes_goal() {
        let now = at(2024, 5, 10, 18, 0).with_timezone(&utc());
        let g = goal(GoalCadence::Weekly, 3.0, GoalUnit::Workouts, at(2024, 5, 6, 0, 0));
        let workouts = vec![
            workout(at(2024, 5, 6, 7, 0), 30),
            workout(at(2024, 5, 8, 7, 0), 30),
            workout(at(2024, 5, 10, 7, 0), 30),
        ];

        let progress = evaluate_goal_progress(&g, &workouts, now);
        assert_eq!(progress.current, 3.0);
        assert_eq!(progress.percentage, 100.0);
        assert!(progress.is_completed);
    }

    #[test]
    fn monthly_hours_sum_minutes() {
        let now = at(2024, 5, 20, 12, 0).with_timezone(&utc());
        let g = goal(GoalCadence::Monthly, 10.0, GoalUnit::Hours, at(2024, 1, 1, 0, 0));
        let workouts: Vec<_> = [2, 7, 11, 19]
            .into_iter()
            .map(|d| workout(at(2024, 5, d, 8, 0), 90))
            .collect();

        let progress = evaluate_goal_progress(&g, &workouts, now);
        assert_eq!(progress.current, 6.0);
        assert_eq!(progress.percentage, 60.0);
        assert!(!progress.is_completed);
    }

    #[test]
    fn start_date_mid_week_excludes_earlier_days() {
        let now = at(2024, 5, 10, 12, 0).with_timezone(&utc());
        let thursday = at(2024, 5, 9, 0, 0);
        let g = goal(GoalCadence::Weekly, 2.0, GoalUnit::Workouts, thursday);
        let workouts = vec![workout(at(2024, 5, 6, 9, 0), 45), workout(at(2024, 5, 9, 9, 0), 45)];

        let progress = evaluate_goal_progress(&g, &workouts, now);
        assert_eq!(progress.current, 1.0);
        assert_eq!(progress.percentage, 50.0);
    }

    #[test]
    fn boundaries_are_inclusive_to_the_millisecond() {
        let now = at(2024, 5, 8, 12, 0).with_timezone(&utc());
        let g = goal(GoalCadence::Weekly, 10.0, GoalUnit::Workouts, at(2024, 1, 1, 0, 0));
        let window = PeriodWindow::containing(GoalCadence::Weekly, now);
        let ms = Duration::milliseconds(1);

        let inside = vec![workout(window.start, 10), workout(window.end, 10)];
        assert_eq!(evaluate_goal_progress(&g, &inside, now).current, 2.0);

        let outside = vec![workout(window.start - ms, 10), workout(window.end + ms, 10)];
        assert_eq!(evaluate_goal_progress(&g, &outside, now).current, 0.0);
    }

    #[test]
    fn future_start_date_counts_nothing() {
        let now = at(2024, 5, 8, 12, 0).with_timezone(&utc());
        let g = goal(GoalCadence::Weekly, 1.0, GoalUnit::Workouts, at(2024, 6, 1, 0, 0));
        let workouts = vec![workout(at(2024, 5, 7, 9, 0), 30)];

        let progress = evaluate_goal_progress(&g, &workouts, now);
        assert_eq!(progress.current, 0.0);
        assert!(!progress.is_completed);
    }

    #[test]
    fn empty_history_is_zero_progress() {
        let now = at(2024, 5, 8, 12, 0).with_timezone(&utc());
        let g = goal(GoalCadence::Monthly, 4.0, GoalUnit::Hours, at(2024, 5, 1, 0, 0));

        let progress = evaluate_goal_progress(&g, &[], now);
        assert_eq!(progress.current, 0.0);
        assert_eq!(progress.percentage, 0.0);
        assert!(!progress.is_completed);
    }

    #[test]
    fn overshoot_keeps_current_but_caps_percentage() {
        let now = at(2024, 5, 8, 12, 0).with_timezone(&utc());
        let g = goal(GoalCadence::Weekly, 2.0, GoalUnit::Workouts, at(2024, 5, 6, 0, 0));
        let workouts: Vec<_> = (0..5).map(|h| workout(at(2024, 5, 7, h, 0), 20)).collect();

        let progress = evaluate_goal_progress(&g, &workouts, now);
        assert_eq!(progress.current, 5.0);
        assert_eq!(progress.percentage, 100.0);
    }

    #[test]
    fn hours_round_half_up_to_one_decimal() {
        assert_eq!(minutes_to_hours(0), 0.0);
        assert_eq!(minutes_to_hours(45), 0.8);
        assert_eq!(minutes_to_hours(50), 0.8);
        assert_eq!(minutes_to_hours(2), 0.0);
        assert_eq!(minutes_to_hours(3), 0.1);
        assert_eq!(minutes_to_hours(360), 6.0);
    }
}
