//! Meeting timer engine.
//!
//! The engine is a wall-clock-based state machine over the current meeting.
//! It does not use internal threads - the host calls `tick()` periodically
//! and `sync_time()` when it regains focus. Elapsed time is derived from the
//! wall-clock difference between ticks, so a late or throttled tick source
//! still produces the correct total.
//!
//! ## State Transitions
//!
//! ```text
//! Not running --start--> Running --pause--> Not running
//!                           |
//!                         stop --> advance --> (next item | meeting completed)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = MeetingEngine::new(EngineOptions::default());
//! let meeting = engine.create_meeting("Weekly sync");
//! engine.add_agenda(&meeting, NewAgenda::new("Updates", 600));
//! engine.start_timer();
//! // In a loop:
//! engine.tick();
//! engine.run_scheduled();
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::transition::ScheduledStart;
use crate::clock::{to_datetime, Clock, SystemClock};
use crate::events::Event;
use crate::meeting::{AgendaItem, AgendaStatus, Meeting, MeetingSettings, MeetingStatus};
use crate::notify::trigger::{self, NotificationKind, ThresholdMode};
use crate::notify::{Notification, NotificationSink, TracingSink};

/// Tunables the engine reads on every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub threshold_mode: ThresholdMode,
    /// Remaining seconds at which the warning fires.
    pub warning_threshold_secs: i64,
    /// Delay before an auto-transition starts the next item.
    pub auto_transition_delay_ms: i64,
    /// Master switch over every notification.
    pub notifications_enabled: bool,
    pub sound: Option<String>,
    /// Settings given to newly created meetings.
    pub default_settings: MeetingSettings,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threshold_mode: ThresholdMode::Crossed,
            warning_threshold_secs: 300,
            auto_transition_delay_ms: 1000,
            notifications_enabled: true,
            sound: Some("bell".to_string()),
            default_settings: MeetingSettings::default(),
        }
    }
}

/// Transient timer state. Never persisted; a reload always starts stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub is_running: bool,
    /// Seconds elapsed on the current item as seen by the engine.
    pub current_time: u64,
    /// Wall-clock anchor of the last applied tick (epoch ms).
    pub last_tick_ms: Option<i64>,
    /// When the current meeting was first started (epoch ms).
    pub meeting_start_ms: Option<i64>,
}

/// The durable part of the engine: exactly the meetings and which one is
/// current.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub current_meeting_id: Option<String>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

/// Owns every meeting plus the timer state for the current one.
pub struct MeetingEngine {
    pub(super) meetings: Vec<Meeting>,
    pub(super) current_meeting_id: Option<String>,
    pub(super) timer: TimerState,
    pub(super) scheduled: Option<ScheduledStart>,
    pub(super) options: EngineOptions,
    pub(super) clock: Box<dyn Clock>,
    pub(super) sink: Box<dyn NotificationSink>,
}

impl MeetingEngine {
    /// Empty engine on the system clock, logging notifications via `tracing`.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            meetings: Vec::new(),
            current_meeting_id: None,
            timer: TimerState::default(),
            scheduled: None,
            options,
            clock: Box::new(SystemClock),
            sink: Box::new(TracingSink),
        }
    }

    /// Rehydrate from a persisted snapshot.
    ///
    /// Timer state starts stopped. Items left `running` or `overtime` by an
    /// unclean exit are downgraded to `paused`; in-progress meetings are not
    /// resumed.
    pub fn restore(state: PersistedState, options: EngineOptions) -> Self {
        let mut engine = Self::new(options);
        let mut meetings = state.meetings;
        for meeting in &mut meetings {
            for item in &mut meeting.agenda {
                if matches!(item.status, AgendaStatus::Running | AgendaStatus::Overtime) {
                    item.status = AgendaStatus::Paused;
                }
            }
            meeting.recalculate_totals();
        }
        engine.current_meeting_id = state
            .current_meeting_id
            .filter(|id| meetings.iter().any(|m| &m.id == id));
        engine.meetings = meetings;
        engine
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    pub fn meeting(&self, meeting_id: &str) -> Option<&Meeting> {
        self.meetings.iter().find(|m| m.id == meeting_id)
    }

    pub fn current_meeting_id(&self) -> Option<&str> {
        self.current_meeting_id.as_deref()
    }

    pub fn current_meeting(&self) -> Option<&Meeting> {
        self.meeting(self.current_meeting_id.as_deref()?)
    }

    pub fn timer(&self) -> TimerState {
        self.timer
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            current_meeting_id: self.current_meeting_id.clone(),
            meetings: self.meetings.clone(),
        }
    }

    /// Current agenda item of the current meeting, repairing a stale
    /// reference on the way.
    pub fn current_agenda(&mut self) -> Option<&AgendaItem> {
        find_meeting_mut(&mut self.meetings, self.current_meeting_id.as_deref())?.current_agenda()
    }

    /// 0.0 .. 150.0 progress of the current item.
    pub fn progress_percentage(&mut self) -> f64 {
        self.current_agenda().map(|a| a.progress_pct()).unwrap_or(0.0)
    }

    /// 0.0 .. 150.0 progress of the current meeting.
    pub fn total_progress_percentage(&self) -> f64 {
        self.current_meeting()
            .map(|m| m.total_progress_pct())
            .unwrap_or(0.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&mut self) -> Event {
        let at = to_datetime(self.clock.now_ms());
        let is_running = self.timer.is_running;
        let Some(meeting) = find_meeting_mut(&mut self.meetings, self.current_meeting_id.as_deref())
        else {
            return Event::StateSnapshot {
                meeting_id: None,
                meeting_status: None,
                is_running,
                agenda_id: None,
                agenda_title: None,
                agenda_status: None,
                elapsed_secs: 0,
                remaining_secs: 0,
                progress_pct: 0.0,
                total_progress_pct: 0.0,
                at,
            };
        };
        let meeting_id = meeting.id.clone();
        let meeting_status = meeting.status;
        let total_progress_pct = meeting.total_progress_pct();
        let item = meeting.current_agenda();
        Event::StateSnapshot {
            meeting_id: Some(meeting_id),
            meeting_status: Some(meeting_status),
            is_running,
            agenda_id: item.map(|a| a.id.clone()),
            agenda_title: item.map(|a| a.title.clone()),
            agenda_status: item.map(|a| a.status),
            elapsed_secs: item.map(|a| a.actual_duration).unwrap_or(0),
            remaining_secs: item.map(|a| a.remaining_time).unwrap_or(0),
            progress_pct: item.map(|a| a.progress_pct()).unwrap_or(0.0),
            total_progress_pct,
            at,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or resume) the current item.
    pub fn start_timer(&mut self) -> Option<Event> {
        if self.timer.is_running {
            debug!("start ignored: already running");
            return None;
        }
        let now = self.clock.now_ms();
        let at = to_datetime(now);
        let meeting = find_meeting_mut(&mut self.meetings, self.current_meeting_id.as_deref())?;
        if meeting.status == MeetingStatus::Completed {
            debug!(meeting_id = %meeting.id, "start ignored: meeting completed");
            return None;
        }
        let settings = meeting.settings;
        let item = meeting.current_agenda_mut()?;
        if item.status.is_terminal() {
            return None;
        }
        item.status = AgendaStatus::Running;
        if item.start_time.is_none() {
            item.start_time = Some(at);
        }
        let agenda_id = item.id.clone();
        let planned_secs = item.planned_duration;
        let elapsed_secs = item.actual_duration;
        let notification = trigger::render(
            NotificationKind::Start,
            item,
            &settings,
            self.options.sound.as_deref(),
            self.options.warning_threshold_secs,
        );

        meeting.status = MeetingStatus::InProgress;
        if meeting.start_time.is_none() {
            meeting.start_time = Some(at);
        }
        meeting.updated_at = at;
        let meeting_id = meeting.id.clone();

        self.timer.meeting_start_ms.get_or_insert(now);
        self.timer.last_tick_ms = Some(now);
        self.timer.is_running = true;
        self.scheduled = None;

        info!(%meeting_id, %agenda_id, elapsed_secs, "timer started");
        self.deliver(notification.into_iter().collect());
        Some(Event::TimerStarted {
            meeting_id,
            agenda_id,
            planned_secs,
            elapsed_secs,
            at,
        })
    }

    /// Freeze elapsed time on the current item.
    pub fn pause_timer(&mut self) -> Option<Event> {
        if !self.timer.is_running {
            return None;
        }
        let at = to_datetime(self.clock.now_ms());
        let meeting = find_meeting_mut(&mut self.meetings, self.current_meeting_id.as_deref())?;
        let Some(item) = meeting.current_agenda_mut() else {
            self.timer.is_running = false;
            return None;
        };
        // Tolerate skew between the engine counter and the item.
        let frozen = item.actual_duration.max(self.timer.current_time);
        item.set_elapsed(frozen);
        item.status = AgendaStatus::Paused;
        let agenda_id = item.id.clone();

        meeting.recalculate_totals();
        meeting.status = MeetingStatus::Paused;
        meeting.updated_at = at;
        let meeting_id = meeting.id.clone();

        self.timer.current_time = frozen;
        self.timer.is_running = false;

        info!(%meeting_id, %agenda_id, elapsed_secs = frozen, "timer paused");
        Some(Event::TimerPaused {
            meeting_id,
            agenda_id,
            elapsed_secs: frozen,
            at,
        })
    }

    /// Finish the current item early and move on. Progress is kept.
    pub fn stop_timer(&mut self) -> Vec<Event> {
        let was_running = self.timer.is_running;
        self.timer.is_running = false;
        self.timer.last_tick_ms = None;
        self.advance(was_running)
    }

    /// Explicit advance. Rejected while the timer is running.
    pub fn next_agenda(&mut self) -> Vec<Event> {
        self.advance(false)
    }

    /// Fold the wall-clock time since the last tick into the current item.
    ///
    /// Safe to call at any cadence, redundantly, or after the clock jumped.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.timer.is_running {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let Some(last) = self.timer.last_tick_ms else {
            self.timer.last_tick_ms = Some(now);
            return Vec::new();
        };
        let delta = ((now - last) as f64 / 1000.0).round() as i64;
        if delta <= 0 {
            return Vec::new();
        }
        let at = to_datetime(now);
        let Some(meeting) = find_meeting_mut(&mut self.meetings, self.current_meeting_id.as_deref())
        else {
            return Vec::new();
        };
        let settings = meeting.settings;
        let meeting_id = meeting.id.clone();
        let Some(item) = meeting.current_agenda_mut() else {
            return Vec::new();
        };
        if !matches!(item.status, AgendaStatus::Running | AgendaStatus::Overtime) {
            return Vec::new();
        }

        let base = item.actual_duration.max(self.timer.current_time);
        let prev_remaining = item.planned_duration as i64 - base as i64;
        let elapsed = base + delta as u64;
        item.set_elapsed(elapsed);
        item.status = if item.remaining_time <= 0 {
            AgendaStatus::Overtime
        } else {
            AgendaStatus::Running
        };

        let kinds = trigger::reached(
            prev_remaining,
            item.remaining_time,
            self.options.threshold_mode,
            self.options.warning_threshold_secs,
        );
        let mut notifications = Vec::new();
        let mut events = Vec::new();
        for kind in kinds {
            notifications.extend(trigger::render(
                kind,
                item,
                &settings,
                self.options.sound.as_deref(),
                self.options.warning_threshold_secs,
            ));
            events.push(Event::ThresholdReached {
                meeting_id: meeting_id.clone(),
                agenda_id: item.id.clone(),
                kind,
                remaining_secs: item.remaining_time,
                at,
            });
        }

        meeting.recalculate_totals();
        meeting.updated_at = at;
        self.timer.current_time = elapsed;
        self.timer.last_tick_ms = Some(now);

        self.deliver(notifications);
        events
    }

    /// Catch up after the host was suspended or backgrounded.
    pub fn sync_time(&mut self) -> Vec<Event> {
        debug!("syncing timer with wall clock");
        self.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Complete the current item and select the next pending one, or
    /// complete the meeting when none is left.
    fn advance(&mut self, was_running: bool) -> Vec<Event> {
        if self.timer.is_running {
            debug!("advance rejected: timer running");
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let at = to_datetime(now);
        let Some(meeting) = find_meeting_mut(&mut self.meetings, self.current_meeting_id.as_deref())
        else {
            return Vec::new();
        };
        if meeting.status == MeetingStatus::Completed {
            return Vec::new();
        }
        let floor = self.timer.current_time;
        let Some(item) = meeting.current_agenda_mut() else {
            return Vec::new();
        };
        if item.status.is_terminal() {
            return Vec::new();
        }
        let elapsed = item.actual_duration.max(floor);
        item.set_elapsed(elapsed);
        item.status = AgendaStatus::Completed;
        item.end_time = Some(at);
        let completed_agenda_id = item.id.clone();

        let next = meeting
            .next_pending(Some(&completed_agenda_id))
            .map(|a| a.id.clone());
        meeting.recalculate_totals();
        meeting.updated_at = at;
        let meeting_id = meeting.id.clone();

        match next {
            Some(next_agenda_id) => {
                meeting.current_agenda_id = Some(next_agenda_id.clone());
                if meeting.status == MeetingStatus::InProgress {
                    meeting.status = MeetingStatus::Paused;
                }
                let auto = was_running && meeting.settings.auto_transition;
                self.timer.current_time = 0;

                info!(%meeting_id, %completed_agenda_id, %next_agenda_id, "agenda advanced");
                let mut events = vec![Event::AgendaAdvanced {
                    meeting_id: meeting_id.clone(),
                    completed_agenda_id,
                    next_agenda_id: next_agenda_id.clone(),
                    at,
                }];
                if auto {
                    events.push(self.schedule_start(meeting_id, next_agenda_id, now));
                }
                events
            }
            None => {
                meeting.status = MeetingStatus::Completed;
                if meeting.end_time.is_none() {
                    meeting.end_time = Some(at);
                }
                meeting.current_agenda_id = None;
                let total_actual_secs = meeting.total_actual_duration;
                self.timer = TimerState::default();
                self.scheduled = None;

                info!(%meeting_id, total_actual_secs, "meeting completed");
                vec![Event::MeetingCompleted {
                    meeting_id,
                    completed_agenda_id,
                    total_actual_secs,
                    at,
                }]
            }
        }
    }

    /// Hand notifications to the sink. Failures are logged, never returned.
    fn deliver(&self, notifications: Vec<Notification>) {
        if !self.options.notifications_enabled {
            return;
        }
        for n in notifications {
            if let Err(e) = self.sink.notify(&n) {
                warn!(error = %e, kind = ?n.kind, "notification dropped");
            }
        }
    }
}

pub(super) fn find_meeting_mut<'a>(
    meetings: &'a mut [Meeting],
    meeting_id: Option<&str>,
) -> Option<&'a mut Meeting> {
    let meeting_id = meeting_id?;
    meetings.iter_mut().find(|m| m.id == meeting_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::NotifyError;
    use crate::notify::RecordingSink;
    use crate::timer::NewAgenda;

    fn engine_at(start_ms: i64) -> (MeetingEngine, ManualClock, RecordingSink) {
        let clock = ManualClock::new(start_ms);
        let sink = RecordingSink::new();
        let engine = MeetingEngine::new(EngineOptions::default())
            .with_clock(clock.clone())
            .with_sink(sink.clone());
        (engine, clock, sink)
    }

    fn meeting_with(engine: &mut MeetingEngine, planned: &[u64]) -> (String, Vec<String>) {
        let meeting_id = engine.create_meeting("Weekly");
        let ids = planned
            .iter()
            .enumerate()
            .map(|(i, secs)| {
                engine
                    .add_agenda(&meeting_id, NewAgenda::new(format!("Item {i}"), *secs))
                    .unwrap()
            })
            .collect();
        (meeting_id, ids)
    }

    fn item<'a>(engine: &'a MeetingEngine, meeting_id: &str, agenda_id: &str) -> &'a AgendaItem {
        engine
            .meeting(meeting_id)
            .unwrap()
            .find_agenda(agenda_id)
            .unwrap()
    }

    #[test]
    fn tick_folds_wall_clock_delta_into_item() {
        let (mut engine, clock, _) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[2]);

        clock.set(2000);
        assert!(engine.start_timer().is_some());
        clock.set(5000);
        engine.tick();

        assert_eq!(engine.timer().current_time, 3);
        let a = item(&engine, &m, &ids[0]);
        assert_eq!(a.actual_duration, 3);
        assert_eq!(a.remaining_time, -1);
        assert_eq!(a.status, AgendaStatus::Overtime);
        assert_eq!(engine.meeting(&m).unwrap().total_actual_duration, 3);
    }

    #[test]
    fn pause_then_resume_keeps_progress() {
        let (mut engine, clock, _) = engine_at(1_000);
        let (m, ids) = meeting_with(&mut engine, &[600]);

        engine.start_timer();
        clock.advance(2_000);
        engine.timer.current_time = 4;
        engine.pause_timer().unwrap();
        let a = item(&engine, &m, &ids[0]);
        assert_eq!(a.status, AgendaStatus::Paused);
        assert_eq!(a.actual_duration, 4);
        assert_eq!(engine.meeting(&m).unwrap().status, MeetingStatus::Paused);

        engine.start_timer().unwrap();
        clock.advance(1_000);
        engine.tick();
        let a = item(&engine, &m, &ids[0]);
        assert_eq!(a.status, AgendaStatus::Running);
        assert_eq!(a.actual_duration, 5);
    }

    #[test]
    fn sub_second_and_backwards_ticks_are_ignored() {
        let (mut engine, clock, _) = engine_at(10_000);
        let (m, ids) = meeting_with(&mut engine, &[60]);
        engine.start_timer();

        clock.advance(400);
        engine.tick();
        assert_eq!(item(&engine, &m, &ids[0]).actual_duration, 0);
        // The anchor did not move, so the next tick sees the full 1.2 s.
        clock.advance(800);
        engine.tick();
        assert_eq!(item(&engine, &m, &ids[0]).actual_duration, 1);

        clock.set(0);
        engine.tick();
        assert_eq!(item(&engine, &m, &ids[0]).actual_duration, 1);
    }

    #[test]
    fn late_tick_catches_up_in_one_step() {
        let (mut engine, clock, sink) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[400]);
        engine.start_timer();
        sink.clear();

        clock.advance(150_000);
        let events = engine.sync_time();
        assert_eq!(item(&engine, &m, &ids[0]).actual_duration, 150);
        assert_eq!(sink.kinds(), vec![NotificationKind::Warning]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn thresholds_fire_once_per_crossing_with_one_second_ticks() {
        let (mut engine, clock, sink) = engine_at(0);
        meeting_with(&mut engine, &[302]);
        engine.start_timer();
        for _ in 0..130 + 302 {
            clock.advance(1_000);
            engine.tick();
        }
        assert_eq!(
            sink.kinds(),
            vec![
                NotificationKind::Start,
                NotificationKind::Warning,
                NotificationKind::TimeUp,
                NotificationKind::Overtime { minutes: 1 },
                NotificationKind::Overtime { minutes: 2 },
            ]
        );
    }

    #[test]
    fn silent_mode_and_disabled_notifications() {
        let (mut engine, clock, sink) = engine_at(0);
        let (m, _) = meeting_with(&mut engine, &[1]);
        let mut settings = engine.meeting(&m).unwrap().settings;
        settings.silent_mode = true;
        engine.update_meeting_settings(&m, settings);

        engine.start_timer();
        assert!(sink.sent()[0].options.silent);

        engine.options.notifications_enabled = false;
        clock.advance(1_000);
        let events = engine.tick();
        assert_eq!(events.len(), 1);
        assert_eq!(sink.sent().len(), 1);
    }

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn notify(&self, _: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError("speaker unplugged".into()))
        }
    }

    #[test]
    fn failing_sink_does_not_block_timer() {
        let clock = ManualClock::new(0);
        let mut engine = MeetingEngine::new(EngineOptions::default())
            .with_clock(clock.clone())
            .with_sink(FailingSink);
        let (m, ids) = meeting_with(&mut engine, &[1]);
        assert!(engine.start_timer().is_some());
        clock.advance(1_000);
        assert_eq!(engine.tick().len(), 1);
        assert_eq!(item(&engine, &m, &ids[0]).status, AgendaStatus::Overtime);
    }

    #[test]
    fn start_without_items_is_noop() {
        let (mut engine, _, sink) = engine_at(0);
        engine.create_meeting("Empty");
        assert!(engine.start_timer().is_none());
        assert!(!engine.is_running());
        assert!(sink.sent().is_empty());
        assert!(engine.tick().is_empty());
    }

    #[test]
    fn start_stamps_times_once() {
        let (mut engine, clock, _) = engine_at(5_000);
        let (m, ids) = meeting_with(&mut engine, &[600]);
        engine.start_timer();
        engine.pause_timer();
        clock.advance(10_000);
        engine.start_timer();

        assert_eq!(engine.timer().meeting_start_ms, Some(5_000));
        let meeting = engine.meeting(&m).unwrap();
        assert_eq!(meeting.start_time.unwrap().timestamp_millis(), 5_000);
        assert_eq!(
            item(&engine, &m, &ids[0]).start_time.unwrap().timestamp_millis(),
            5_000
        );
    }

    #[test]
    fn single_item_cascade_completes_meeting() {
        let (mut engine, clock, _) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[60]);
        engine.start_timer();
        clock.advance(3_000);
        engine.tick();
        engine.pause_timer();

        let events = engine.next_agenda();
        assert!(matches!(events[0], Event::MeetingCompleted { .. }));
        let a = item(&engine, &m, &ids[0]);
        assert_eq!(a.status, AgendaStatus::Completed);
        assert!(a.end_time.is_some());
        let meeting = engine.meeting(&m).unwrap();
        assert_eq!(meeting.status, MeetingStatus::Completed);
        assert!(meeting.end_time.is_some());
        assert!(!engine.is_running());
        assert_eq!(engine.timer().current_time, 0);
    }

    #[test]
    fn advance_is_rejected_while_running() {
        let (mut engine, _, _) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[60, 60]);
        engine.start_timer();
        assert!(engine.next_agenda().is_empty());
        assert_eq!(
            engine.meeting(&m).unwrap().current_agenda_id.as_deref(),
            Some(ids[0].as_str())
        );
    }

    #[test]
    fn stop_completes_current_and_selects_next() {
        let (mut engine, clock, _) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[60, 60]);
        engine.start_timer();
        clock.advance(7_000);
        engine.tick();

        let events = engine.stop_timer();
        assert_eq!(events.len(), 1);
        assert!(!engine.is_running());
        assert_eq!(engine.timer().current_time, 0);
        let first = item(&engine, &m, &ids[0]);
        assert_eq!(first.status, AgendaStatus::Completed);
        assert_eq!(first.actual_duration, 7);
        assert_eq!(
            engine.meeting(&m).unwrap().current_agenda_id.as_deref(),
            Some(ids[1].as_str())
        );
        assert!(engine.scheduled.is_none());
    }

    #[test]
    fn completed_item_is_frozen() {
        let (mut engine, clock, _) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[60, 60]);
        engine.start_timer();
        clock.advance(2_000);
        engine.tick();
        engine.stop_timer();
        let before = item(&engine, &m, &ids[0]).clone();

        engine.start_timer();
        for _ in 0..5 {
            clock.advance(1_000);
            engine.tick();
        }
        let after = item(&engine, &m, &ids[0]);
        assert_eq!(after.actual_duration, before.actual_duration);
        assert_eq!(after.end_time, before.end_time);
        assert_eq!(item(&engine, &m, &ids[1]).actual_duration, 5);
    }

    #[test]
    fn progress_is_capped_at_150() {
        let (mut engine, clock, _) = engine_at(0);
        meeting_with(&mut engine, &[10, 10]);
        engine.start_timer();
        clock.advance(5_000);
        engine.tick();
        assert_eq!(engine.progress_percentage(), 50.0);
        assert_eq!(engine.total_progress_percentage(), 25.0);
        clock.advance(60_000);
        engine.tick();
        assert_eq!(engine.progress_percentage(), 150.0);
        assert_eq!(engine.total_progress_percentage(), 150.0);
    }

    #[test]
    fn restore_resets_transient_state() {
        let (mut engine, clock, _) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[60]);
        engine.start_timer();
        clock.advance(2_000);
        engine.tick();

        let state = engine.persisted_state();
        let json = serde_json::to_string(&state).unwrap();
        let restored: PersistedState = serde_json::from_str(&json).unwrap();
        let restored = MeetingEngine::restore(restored, EngineOptions::default());

        assert!(!restored.is_running());
        assert_eq!(restored.timer(), TimerState::default());
        assert_eq!(restored.current_meeting_id(), Some(m.as_str()));
        let meeting = restored.current_meeting().unwrap();
        assert_eq!(meeting.status, MeetingStatus::InProgress);
        assert_eq!(meeting.find_agenda(&ids[0]).unwrap().status, AgendaStatus::Paused);
        assert_eq!(meeting.total_actual_duration, 2);

        // An item saved while over time comes back paused too.
        let (mut engine, clock, _) = engine_at(0);
        let (_, ids) = meeting_with(&mut engine, &[1]);
        engine.start_timer();
        clock.advance(3_000);
        engine.tick();
        let item = engine.current_meeting().unwrap().find_agenda(&ids[0]).unwrap();
        assert_eq!(item.status, AgendaStatus::Overtime);

        let restored = MeetingEngine::restore(engine.persisted_state(), EngineOptions::default());
        let item = restored.current_meeting().unwrap().find_agenda(&ids[0]).unwrap();
        assert_eq!(item.status, AgendaStatus::Paused);
        assert_eq!(item.actual_duration, 3);
        assert!(!restored.is_running());
    }

    #[test]
    fn restore_drops_unknown_current_meeting() {
        let state = PersistedState {
            current_meeting_id: Some("missing".into()),
            meetings: Vec::new(),
        };
        let engine = MeetingEngine::restore(state, EngineOptions::default());
        assert!(engine.current_meeting_id().is_none());
    }

    #[test]
    fn snapshot_reports_current_item() {
        let (mut engine, clock, _) = engine_at(0);
        let (m, ids) = meeting_with(&mut engine, &[120]);
        engine.start_timer();
        clock.advance(30_000);
        engine.tick();
        match engine.snapshot() {
            Event::StateSnapshot {
                meeting_id,
                is_running,
                agenda_id,
                remaining_secs,
                progress_pct,
                ..
            } => {
                assert_eq!(meeting_id.as_deref(), Some(m.as_str()));
                assert!(is_running);
                assert_eq!(agenda_id.as_deref(), Some(ids[0].as_str()));
                assert_eq!(remaining_secs, 90);
                assert_eq!(progress_pct, 25.0);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
