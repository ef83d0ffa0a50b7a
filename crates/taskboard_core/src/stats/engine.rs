//! Pure statistics over task snapshots.
//!
//! # Responsibility
//! - Derive counts, subsets and time series consumed by dashboard views.
//!
//! # Invariants
//! - No function mutates its input or keeps state between calls.
//! - Subset results keep collection order unless a sort order is stated.
//! - Rates are defined as zero for empty input.

use crate::model::task::{Priority, Task, Timestamp};
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

/// Completed vs. open task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub completed: usize,
    pub pending: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.completed + self.pending
    }
}

/// Task counts per priority; absent priorities count zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    /// `(priority, count)` pairs in `Priority::ALL` order.
    pub fn entries(&self) -> [(Priority, usize); 3] {
        Priority::ALL.map(|priority| (priority, self.get(priority)))
    }

    fn bump(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
    }
}

/// Completions on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: usize,
}

pub fn count_by_status(tasks: &[Task]) -> StatusCounts {
    tasks
        .iter()
        .fold(StatusCounts::default(), |mut counts, task| {
            if task.completed {
                counts.completed += 1;
            } else {
                counts.pending += 1;
            }
            counts
        })
}

pub fn count_by_priority(tasks: &[Task]) -> PriorityCounts {
    count_priorities(tasks)
}

/// Priority distribution over any selection of tasks.
pub fn count_priorities<'t>(tasks: impl IntoIterator<Item = &'t Task>) -> PriorityCounts {
    let mut counts = PriorityCounts::default();
    for task in tasks {
        counts.bump(task.priority);
    }
    counts
}

/// Open tasks whose due date lies strictly before `as_of`.
pub fn overdue(tasks: &[Task], as_of: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|task| task.is_overdue(as_of)).collect()
}

/// Completed tasks in collection order.
pub fn completed(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| task.completed).collect()
}

/// Completion counts per UTC day; see [`completions_by_day_in`].
pub fn completions_by_day(tasks: &[Task], window_days: u32, now: Timestamp) -> Vec<DailyCount> {
    completions_by_day_in(tasks, window_days, now, &Utc)
}

/// Completion counts for the `window_days` calendar days ending with the
/// day containing `now`, oldest first.
///
/// A completed task counts on the day of its `updated_at` in `tz`. Every
/// day in the window is present, with zero when nothing was completed.
/// A zero window, or a `now` outside the calendar range, yields an empty
/// series. A window reaching before `NaiveDate::MIN` starts at that date.
pub fn completions_by_day_in<Tz: TimeZone>(
    tasks: &[Task],
    window_days: u32,
    now: Timestamp,
    tz: &Tz,
) -> Vec<DailyCount> {
    if window_days == 0 {
        return Vec::new();
    }
    let Some(today) = date_in(now, tz) else {
        return Vec::new();
    };
    let start = today
        .checked_sub_days(Days::new(u64::from(window_days - 1)))
        .unwrap_or(NaiveDate::MIN);
    let len = today.signed_duration_since(start).num_days() as usize + 1;

    let mut counts = vec![0usize; len];
    for task in tasks.iter().filter(|task| task.completed) {
        let Some(day) = date_in(task.updated_at, tz) else {
            continue;
        };
        if day < start || day > today {
            continue;
        }
        let offset = day.signed_duration_since(start).num_days() as usize;
        counts[offset] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .filter_map(|(offset, count)| {
            start
                .checked_add_days(Days::new(offset as u64))
                .map(|day| DailyCount { day, count })
        })
        .collect()
}

/// Up to `n` tasks with the greatest `updated_at`, newest first.
///
/// Equal timestamps keep collection order.
pub fn most_recently_updated(tasks: &[Task], n: usize) -> Vec<&Task> {
    newest_first(tasks.iter().collect(), n)
}

/// Up to `n` completed tasks, most recently updated first.
pub fn most_recently_completed(tasks: &[Task], n: usize) -> Vec<&Task> {
    newest_first(completed(tasks), n)
}

/// `completed / total`, or `0.0` for an empty slice.
pub fn completion_rate(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let counts = count_by_status(tasks);
    counts.completed as f64 / counts.total() as f64
}

/// Completion rate as a rounded whole percentage.
pub fn completion_percent(tasks: &[Task]) -> u32 {
    (completion_rate(tasks) * 100.0).round() as u32
}

/// Whole days from `today` to the task's due date; negative once overdue.
pub fn days_until_due(task: &Task, today: NaiveDate) -> i64 {
    task.due_date.signed_duration_since(today).num_days()
}

/// Open tasks due on or after `today`, soonest first, at most `limit`.
///
/// Equal due dates keep collection order.
pub fn upcoming_deadlines(tasks: &[Task], today: NaiveDate, limit: usize) -> Vec<&Task> {
    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|task| !task.completed && task.due_date >= today)
        .collect();
    upcoming.sort_by_key(|task| task.due_date);
    upcoming.truncate(limit);
    upcoming
}

/// Calendar date of an epoch-millisecond timestamp in UTC.
pub fn utc_date(timestamp: Timestamp) -> Option<NaiveDate> {
    date_in(timestamp, &Utc)
}

fn newest_first(mut tasks: Vec<&Task>, n: usize) -> Vec<&Task> {
    tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    tasks.truncate(n);
    tasks
}

/// Calendar date of an epoch-millisecond timestamp in `tz`.
pub fn date_in<Tz: TimeZone>(timestamp: Timestamp, tz: &Tz) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|instant| instant.with_timezone(tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::{completions_by_day, date_in, PriorityCounts};
    use crate::model::task::Priority;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn priority_entries_follow_ascending_order() {
        let counts = PriorityCounts {
            low: 1,
            medium: 0,
            high: 2,
        };
        assert_eq!(
            counts.entries(),
            [
                (Priority::Low, 1),
                (Priority::Medium, 0),
                (Priority::High, 2)
            ]
        );
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn date_in_respects_offset() {
        // 2025-01-10T23:30:00Z
        let ts = 1_736_551_800_000;
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(
            date_in(ts, &chrono::Utc),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        assert_eq!(date_in(ts, &tokyo), NaiveDate::from_ymd_opt(2025, 1, 11));
    }

    #[test]
    fn window_before_first_representable_day_is_clamped() {
        let first_noon = NaiveDate::MIN
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let next_noon = first_noon + 24 * 3_600_000;

        let series = completions_by_day(&[], 7, next_noon);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].day, NaiveDate::MIN);
        assert!(series.iter().all(|entry| entry.count == 0));
    }
}
