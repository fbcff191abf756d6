use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single agenda item.
///
/// ```text
/// Pending -> Running <-> Paused
///               |
///               v
///           Overtime -> Completed
/// ```
///
/// Any non-completed item can be completed by advancing past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgendaStatus {
    #[default]
    Pending,
    Running,
    Paused,
    Completed,
    Overtime,
}

impl AgendaStatus {
    /// Completed items are frozen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgendaStatus::Completed)
    }
}

/// A single timed segment within a meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub memo: Option<String>,
    /// Position in the meeting, dense 0..n-1.
    pub order: u32,
    /// Seconds.
    pub planned_duration: u64,
    /// Seconds elapsed while this item was the active one.
    #[serde(default)]
    pub actual_duration: u64,
    /// `planned_duration - actual_duration`; negative in overtime.
    pub remaining_time: i64,
    #[serde(default)]
    pub status: AgendaStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl AgendaItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        memo: Option<String>,
        order: u32,
        planned_duration: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            memo,
            order,
            planned_duration,
            actual_duration: 0,
            remaining_time: planned_duration as i64,
            status: AgendaStatus::Pending,
            start_time: None,
            end_time: None,
        }
    }

    /// Record elapsed seconds and keep `remaining_time` in step.
    pub(crate) fn set_elapsed(&mut self, secs: u64) {
        self.actual_duration = secs;
        self.refresh_remaining();
    }

    pub(crate) fn refresh_remaining(&mut self) {
        self.remaining_time = self.planned_duration as i64 - self.actual_duration as i64;
    }

    /// 0.0 .. 150.0 progress of this item against its plan.
    pub fn progress_pct(&self) -> f64 {
        progress_pct(self.actual_duration, self.planned_duration)
    }
}

/// Percentage of `actual` over `planned`, capped at 150%.
pub(crate) fn progress_pct(actual: u64, planned: u64) -> f64 {
    if planned == 0 {
        return 0.0;
    }
    (actual as f64 / planned as f64 * 100.0).min(150.0)
}
