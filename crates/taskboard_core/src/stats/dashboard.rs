//! Dashboard summary.
//!
//! One pass of every aggregation a dashboard page renders, computed from a
//! single snapshot so that cards and charts agree with each other.

use crate::config::CoreConfig;
use crate::model::task::{Task, Timestamp};
use crate::stats::engine::{
    completion_percent, completion_rate, completions_by_day_in, count_by_priority,
    count_by_status, count_priorities, date_in, most_recently_completed, most_recently_updated,
    overdue, upcoming_deadlines, DailyCount, PriorityCounts, StatusCounts,
};
use chrono::{TimeZone, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary<'a> {
    pub status: StatusCounts,
    pub completion_rate: f64,
    pub completion_percent: u32,
    pub overdue_count: usize,
    pub by_priority: PriorityCounts,
    /// Priority distribution of completed tasks only.
    pub completed_by_priority: PriorityCounts,
    /// `config.trend_window_days` entries, oldest first.
    pub trend: Vec<DailyCount>,
    pub recent: Vec<&'a Task>,
    pub recent_completed: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
}

impl<'a> DashboardSummary<'a> {
    /// Computes the summary as of `now` with UTC calendar days.
    pub fn compute(tasks: &'a [Task], now: Timestamp, config: &CoreConfig) -> Option<Self> {
        Self::compute_in(tasks, now, config, &Utc)
    }

    /// Computes the summary as of `now` with calendar days taken in `tz`.
    ///
    /// "Today" for overdue and upcoming figures and the trend buckets all
    /// use the same zone. Returns `None` when `now` has no calendar date.
    pub fn compute_in<Tz: TimeZone>(
        tasks: &'a [Task],
        now: Timestamp,
        config: &CoreConfig,
        tz: &Tz,
    ) -> Option<Self> {
        let today = date_in(now, tz)?;

        Some(Self {
            status: count_by_status(tasks),
            completion_rate: completion_rate(tasks),
            completion_percent: completion_percent(tasks),
            overdue_count: overdue(tasks, today).len(),
            by_priority: count_by_priority(tasks),
            completed_by_priority: count_priorities(tasks.iter().filter(|task| task.completed)),
            trend: completions_by_day_in(tasks, config.trend_window_days, now, tz),
            recent: most_recently_updated(tasks, config.recent_limit),
            recent_completed: most_recently_completed(tasks, config.recent_limit),
            upcoming: upcoming_deadlines(tasks, today, config.upcoming_limit),
        })
    }

    pub fn total(&self) -> usize {
        self.status.total()
    }
}
