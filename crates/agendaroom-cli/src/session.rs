//! Per-invocation engine state: load from the database, run one command,
//! save back.

use std::io::Write;

use tracing::debug;

use agendaroom_core::{
    Config, Database, Event, MeetingEngine, Notification, NotificationSink, NotifyError,
    ValidationError,
};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Prints notifications to stderr and rings the terminal bell when the
/// notification carries a sound.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn notify(&self, n: &Notification) -> Result<(), NotifyError> {
        let mut stderr = std::io::stderr().lock();
        let bell = if n.options.sound.is_some() && !n.options.silent {
            "\x07"
        } else {
            ""
        };
        writeln!(stderr, "{bell}[{}] {}", n.title, n.body).map_err(|e| NotifyError(e.to_string()))
    }
}

pub struct Session {
    pub db: Database,
    pub config: Config,
    pub engine: MeetingEngine,
}

impl Session {
    pub fn open() -> CliResult<Self> {
        let config = Config::load()?;
        let db = Database::open()?;
        let engine = MeetingEngine::restore(db.load_state()?, config.engine_options()?)
            .with_sink(TerminalSink);
        debug!(
            meetings = engine.meetings().len(),
            current = ?engine.current_meeting_id(),
            "state loaded"
        );
        Ok(Self { db, config, engine })
    }

    pub fn save(&self) -> CliResult {
        self.db.save_state(&self.engine.persisted_state())?;
        Ok(())
    }

    /// Log every meeting completed by `events` to the history table.
    pub fn record_completed(&self, events: &[Event]) -> CliResult {
        for event in events {
            if let Event::MeetingCompleted { meeting_id, .. } = event {
                if let Some(meeting) = self.engine.meeting(meeting_id) {
                    self.db.record_meeting(meeting)?;
                }
            }
        }
        Ok(())
    }

    /// `id` if given, otherwise the current meeting.
    pub fn meeting_id(&self, id: Option<String>) -> CliResult<String> {
        match id {
            Some(id) if self.engine.meeting(&id).is_some() => Ok(id),
            Some(id) => Err(ValidationError::UnknownMeeting(id).into()),
            None => self
                .engine
                .current_meeting_id()
                .map(str::to_string)
                .ok_or_else(|| "no current meeting; create one or pass --meeting".into()),
        }
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_events(events: &[Event]) -> CliResult {
    for event in events {
        debug!(event = event.name(), "emit");
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

pub fn require_title(field: &str, title: &str) -> CliResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        }
        .into());
    }
    Ok(title.to_string())
}

/// Planned duration in seconds from `--minutes` / `--secs`.
pub fn planned_secs(minutes: Option<u64>, secs: Option<u64>) -> CliResult<Option<u64>> {
    let invalid = |message: &str| ValidationError::InvalidValue {
        field: "planned_duration".to_string(),
        message: message.to_string(),
    };
    let total = match (minutes, secs) {
        (None, None) => return Ok(None),
        (m, s) => m
            .unwrap_or(0)
            .checked_mul(60)
            .and_then(|m| m.checked_add(s.unwrap_or(0)))
            .ok_or_else(|| invalid("too large"))?,
    };
    if total == 0 {
        return Err(invalid("must be greater than zero").into());
    }
    Ok(Some(total))
}
