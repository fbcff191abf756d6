//! Delayed auto-transition.
//!
//! When a meeting has `auto_transition` on and the running item is stopped,
//! the next item starts after a short delay. The delay is a
//! [`ScheduledStart`] record polled by the host through
//! [`MeetingEngine::run_scheduled`]. Anything can happen before it comes due,
//! so firing re-checks the meeting, the timer and the target item first.

use serde::Serialize;
use tracing::debug;

use super::engine::{find_meeting_mut, MeetingEngine};
use crate::clock::to_datetime;
use crate::events::Event;
use crate::meeting::MeetingStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledStart {
    pub meeting_id: String,
    pub agenda_id: String,
    /// Epoch ms at which the start becomes due.
    pub due_ms: i64,
}

impl MeetingEngine {
    pub(super) fn schedule_start(&mut self, meeting_id: String, agenda_id: String, now: i64) -> Event {
        let due_ms = now + self.options.auto_transition_delay_ms;
        debug!(%meeting_id, %agenda_id, due_ms, "auto-start scheduled");
        let event = Event::AutoStartScheduled {
            meeting_id: meeting_id.clone(),
            agenda_id: agenda_id.clone(),
            due_at: to_datetime(due_ms),
        };
        self.scheduled = Some(ScheduledStart {
            meeting_id,
            agenda_id,
            due_ms,
        });
        event
    }

    pub fn scheduled_start(&self) -> Option<&ScheduledStart> {
        self.scheduled.as_ref()
    }

    /// Drop a pending auto-start, returning it.
    pub fn cancel_scheduled(&mut self) -> Option<ScheduledStart> {
        self.scheduled.take()
    }

    /// Fire a due auto-start if it is still valid.
    ///
    /// Returns the `TimerStarted` event when the item was started. A stale
    /// record is discarded without touching any state.
    pub fn run_scheduled(&mut self) -> Option<Event> {
        let due_ms = self.scheduled.as_ref()?.due_ms;
        if self.clock.now_ms() < due_ms {
            return None;
        }
        let task = self.scheduled.take()?;
        if let Err(reason) = self.revalidate(&task) {
            debug!(meeting_id = %task.meeting_id, agenda_id = %task.agenda_id, reason, "auto-start discarded");
            return None;
        }
        self.start_timer()
    }

    fn revalidate(&mut self, task: &ScheduledStart) -> Result<(), &'static str> {
        if self.current_meeting_id.as_deref() != Some(task.meeting_id.as_str()) {
            return Err("meeting no longer current");
        }
        if self.timer.is_running {
            return Err("timer already running");
        }
        let meeting = find_meeting_mut(&mut self.meetings, Some(&task.meeting_id))
            .ok_or("meeting deleted")?;
        if meeting.status == MeetingStatus::Completed {
            return Err("meeting completed");
        }
        match meeting.current_agenda() {
            Some(item) if item.id == task.agenda_id && !item.status.is_terminal() => Ok(()),
            Some(_) => Err("target item changed"),
            None => Err("no current item"),
        }
    }
}
