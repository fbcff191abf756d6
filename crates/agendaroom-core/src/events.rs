use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meeting::{AgendaStatus, MeetingStatus};
use crate::notify::NotificationKind;

/// Every timer state change produces an Event.
/// Hosts print or forward them; a `None` from a command means it was a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        meeting_id: String,
        agenda_id: String,
        planned_secs: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        meeting_id: String,
        agenda_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// A tick crossed a notification threshold.
    ThresholdReached {
        meeting_id: String,
        agenda_id: String,
        kind: NotificationKind,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// The current item finished and another pending item became current.
    AgendaAdvanced {
        meeting_id: String,
        completed_agenda_id: String,
        next_agenda_id: String,
        at: DateTime<Utc>,
    },
    AgendaSelected {
        meeting_id: String,
        agenda_id: String,
        previous_agenda_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// The last pending item finished.
    MeetingCompleted {
        meeting_id: String,
        completed_agenda_id: String,
        total_actual_secs: u64,
        at: DateTime<Utc>,
    },
    /// A delayed auto-start was queued after the previous item finished.
    AutoStartScheduled {
        meeting_id: String,
        agenda_id: String,
        due_at: DateTime<Utc>,
    },
    StateSnapshot {
        meeting_id: Option<String>,
        meeting_status: Option<MeetingStatus>,
        is_running: bool,
        agenda_id: Option<String>,
        agenda_title: Option<String>,
        agenda_status: Option<AgendaStatus>,
        elapsed_secs: u64,
        remaining_secs: i64,
        progress_pct: f64,
        total_progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable name of the variant, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::ThresholdReached { .. } => "threshold_reached",
            Event::AgendaAdvanced { .. } => "agenda_advanced",
            Event::AgendaSelected { .. } => "agenda_selected",
            Event::MeetingCompleted { .. } => "meeting_completed",
            Event::AutoStartScheduled { .. } => "auto_start_scheduled",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_matches_serialized_tag() {
        let event = Event::MeetingCompleted {
            meeting_id: "m1".into(),
            completed_agenda_id: "a1".into(),
            total_actual_secs: 90,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MeetingCompleted");
        assert_eq!(event.name(), "meeting_completed");
    }
}
