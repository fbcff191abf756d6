//! Meeting and agenda mutations.
//!
//! Every structural change recompacts `order` to 0..n-1 and recomputes the
//! meeting totals from scratch before returning. Unknown ids are no-ops.

use tracing::{debug, info};
use uuid::Uuid;

use super::engine::{find_meeting_mut, MeetingEngine, TimerState};
use crate::clock::to_datetime;
use crate::events::Event;
use crate::meeting::{AgendaItem, AgendaStatus, Meeting, MeetingSettings, MeetingStatus};

/// Input for [`MeetingEngine::add_agenda`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgenda {
    pub title: String,
    /// Seconds.
    pub planned_duration: u64,
    pub memo: Option<String>,
}

impl NewAgenda {
    pub fn new(title: impl Into<String>, planned_duration: u64) -> Self {
        Self {
            title: title.into(),
            planned_duration,
            memo: None,
        }
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Partial update for [`MeetingEngine::update_agenda`]. `None` leaves a field
/// untouched; `memo: Some(None)` clears the memo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgendaPatch {
    pub title: Option<String>,
    pub memo: Option<Option<String>>,
    pub planned_duration: Option<u64>,
}

impl MeetingEngine {
    /// Create an empty meeting with the default settings. It becomes the
    /// current meeting if none is selected.
    pub fn create_meeting(&mut self, title: impl Into<String>) -> String {
        let settings = self.options.default_settings;
        self.create_meeting_with(title, settings)
    }

    pub fn create_meeting_with(
        &mut self,
        title: impl Into<String>,
        settings: MeetingSettings,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let now = to_datetime(self.clock.now_ms());
        self.meetings.push(Meeting::new(id.clone(), title, settings, now));
        if self.current_meeting_id.is_none() {
            self.current_meeting_id = Some(id.clone());
        }
        info!(meeting_id = %id, "meeting created");
        id
    }

    pub fn delete_meeting(&mut self, meeting_id: &str) -> bool {
        let Some(index) = self.meetings.iter().position(|m| m.id == meeting_id) else {
            return false;
        };
        self.meetings.remove(index);
        if self.current_meeting_id.as_deref() == Some(meeting_id) {
            self.current_meeting_id = None;
            self.timer = TimerState::default();
            self.scheduled = None;
        }
        info!(%meeting_id, "meeting deleted");
        true
    }

    /// Switch the engine to another meeting. A running item on the old
    /// meeting is paused first; timer state does not carry over.
    pub fn set_current_meeting(&mut self, meeting_id: &str) -> bool {
        if self.meeting(meeting_id).is_none() {
            return false;
        }
        if self.current_meeting_id.as_deref() == Some(meeting_id) {
            return true;
        }
        self.pause_timer();
        self.timer = TimerState::default();
        self.scheduled = None;
        self.current_meeting_id = Some(meeting_id.to_string());
        debug!(%meeting_id, "current meeting changed");
        true
    }

    pub fn update_meeting_title(&mut self, meeting_id: &str, title: impl Into<String>) -> bool {
        let now = to_datetime(self.clock.now_ms());
        let Some(meeting) = find_meeting_mut(&mut self.meetings, Some(meeting_id)) else {
            return false;
        };
        meeting.title = title.into();
        meeting.updated_at = now;
        true
    }

    pub fn update_meeting_settings(&mut self, meeting_id: &str, settings: MeetingSettings) -> bool {
        let now = to_datetime(self.clock.now_ms());
        let Some(meeting) = find_meeting_mut(&mut self.meetings, Some(meeting_id)) else {
            return false;
        };
        meeting.settings = settings;
        meeting.updated_at = now;
        true
    }

    /// Append an item at the end of the agenda. Returns its id.
    pub fn add_agenda(&mut self, meeting_id: &str, new: NewAgenda) -> Option<String> {
        let now = to_datetime(self.clock.now_ms());
        let meeting = find_meeting_mut(&mut self.meetings, Some(meeting_id))?;
        let id = Uuid::new_v4().to_string();
        let order = meeting.agenda.len() as u32;
        meeting.agenda.push(AgendaItem::new(
            id.clone(),
            new.title,
            new.memo,
            order,
            new.planned_duration,
        ));
        meeting.compact_orders();
        meeting.recalculate_totals();
        meeting.updated_at = now;
        debug!(%meeting_id, agenda_id = %id, order, "agenda added");
        Some(id)
    }

    pub fn update_agenda(&mut self, meeting_id: &str, agenda_id: &str, patch: AgendaPatch) -> bool {
        let now = to_datetime(self.clock.now_ms());
        let is_active = self.timer.is_running && self.current_meeting_id.as_deref() == Some(meeting_id);
        let Some(meeting) = find_meeting_mut(&mut self.meetings, Some(meeting_id)) else {
            return false;
        };
        let is_current = meeting.current_agenda_id.as_deref() == Some(agenda_id);
        let Some(item) = meeting.find_agenda_mut(agenda_id) else {
            return false;
        };
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(memo) = patch.memo {
            item.memo = memo;
        }
        if let Some(planned) = patch.planned_duration {
            item.planned_duration = planned;
            item.refresh_remaining();
            item.status = match item.status {
                AgendaStatus::Overtime if item.remaining_time > 0 => {
                    if is_active && is_current {
                        AgendaStatus::Running
                    } else {
                        AgendaStatus::Paused
                    }
                }
                AgendaStatus::Running if item.remaining_time <= 0 => AgendaStatus::Overtime,
                other => other,
            };
        }
        meeting.recalculate_totals();
        meeting.updated_at = now;
        true
    }

    /// Remove an item. If it was the current one, the next unfinished item
    /// by order becomes current, falling back to the first unfinished one.
    pub fn delete_agenda(&mut self, meeting_id: &str, agenda_id: &str) -> bool {
        let now = to_datetime(self.clock.now_ms());
        let is_current_meeting = self.current_meeting_id.as_deref() == Some(meeting_id);
        let Some(meeting) = find_meeting_mut(&mut self.meetings, Some(meeting_id)) else {
            return false;
        };
        let Some(index) = meeting.agenda.iter().position(|a| a.id == agenda_id) else {
            return false;
        };
        let removed = meeting.agenda.remove(index);
        let was_current = meeting.current_agenda_id.as_deref() == Some(agenda_id);

        if was_current {
            // Completed items are never reselected. With none left the
            // reference stays unset until an item is added.
            let open = || meeting.agenda.iter().filter(|a| !a.status.is_terminal());
            let reselected = open()
                .filter(|a| a.order > removed.order)
                .min_by_key(|a| a.order)
                .or_else(|| open().min_by_key(|a| a.order))
                .map(|a| a.id.clone());
            debug!(%meeting_id, deleted = %agenda_id, reselected = ?reselected, "current agenda deleted");
            meeting.current_agenda_id = reselected;
        }
        meeting.compact_orders();
        meeting.recalculate_totals();
        meeting.updated_at = now;
        if meeting.status == MeetingStatus::InProgress && was_current && is_current_meeting {
            meeting.status = MeetingStatus::Paused;
        }

        if was_current && is_current_meeting {
            // The clock belonged to the removed item.
            self.timer.is_running = false;
            self.timer.last_tick_ms = None;
            self.timer.current_time = 0;
        }
        if self
            .scheduled
            .as_ref()
            .is_some_and(|s| s.meeting_id == meeting_id && s.agenda_id == agenda_id)
        {
            self.scheduled = None;
        }
        true
    }

    /// Reorder the agenda. `ordered_ids` lists items in their new sequence;
    /// unlisted items keep their relative order after the listed ones.
    /// Unknown or duplicate ids reject the whole call.
    pub fn reorder_agendas(&mut self, meeting_id: &str, ordered_ids: &[String]) -> bool {
        let now = to_datetime(self.clock.now_ms());
        let Some(meeting) = find_meeting_mut(&mut self.meetings, Some(meeting_id)) else {
            return false;
        };
        for (i, id) in ordered_ids.iter().enumerate() {
            if meeting.find_agenda(id).is_none() || ordered_ids[..i].contains(id) {
                debug!(%meeting_id, agenda_id = %id, "reorder rejected");
                return false;
            }
        }
        let listed = ordered_ids.len() as u32;
        for item in &mut meeting.agenda {
            item.order = match ordered_ids.iter().position(|id| *id == item.id) {
                Some(rank) => rank as u32,
                None => listed + item.order,
            };
        }
        meeting.compact_orders();
        meeting.recalculate_totals();
        meeting.updated_at = now;
        true
    }

    /// Make `agenda_id` the current item of the current meeting.
    ///
    /// If the timer is running on a different item, that item is paused
    /// with its elapsed time kept, and the clock stops.
    pub fn select_agenda(&mut self, agenda_id: &str) -> Option<Event> {
        let now = self.clock.now_ms();
        let at = to_datetime(now);
        let meeting = find_meeting_mut(&mut self.meetings, self.current_meeting_id.as_deref())?;
        if meeting.find_agenda(agenda_id)?.status.is_terminal() {
            debug!(%agenda_id, "select ignored: item completed");
            return None;
        }
        meeting.validate_current();
        let previous_agenda_id = meeting.current_agenda_id.clone();
        if previous_agenda_id.as_deref() == Some(agenda_id) {
            return None;
        }

        if self.timer.is_running {
            let frozen_floor = self.timer.current_time;
            if let Some(prev) = previous_agenda_id
                .as_deref()
                .and_then(|id| meeting.find_agenda_mut(id))
            {
                let frozen = prev.actual_duration.max(frozen_floor);
                prev.set_elapsed(frozen);
                if matches!(prev.status, AgendaStatus::Running | AgendaStatus::Overtime) {
                    prev.status = AgendaStatus::Paused;
                }
            }
            if meeting.status == MeetingStatus::InProgress {
                meeting.status = MeetingStatus::Paused;
            }
            self.timer.is_running = false;
            self.timer.last_tick_ms = None;
        }

        meeting.current_agenda_id = Some(agenda_id.to_string());
        meeting.recalculate_totals();
        meeting.updated_at = at;
        let meeting_id = meeting.id.clone();
        self.timer.current_time = 0;
        self.scheduled = None;

        debug!(%meeting_id, %agenda_id, previous = ?previous_agenda_id, "agenda selected");
        Some(Event::AgendaSelected {
            meeting_id,
            agenda_id: agenda_id.to_string(),
            previous_agenda_id,
            at,
        })
    }
}
