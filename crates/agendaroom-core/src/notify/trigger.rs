//! Remaining-time thresholds.
//!
//! Thresholds are checked against the remaining time produced by each tick:
//! the five-minute warning, time-up at zero, and one overtime notification
//! per full minute past zero.

use serde::{Deserialize, Serialize};

use super::{Notification, NotificationOptions};
use crate::meeting::{AgendaItem, MeetingSettings};

/// How a threshold is matched against a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Fire when the tick moved remaining time across the threshold.
    /// A long suspension fires late rather than never.
    #[default]
    Crossed,
    /// Fire only when remaining time lands exactly on the threshold.
    /// A multi-second delta can step over a threshold and skip it.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    Start,
    Warning,
    TimeUp,
    Overtime { minutes: u64 },
}

impl NotificationKind {
    fn bell_enabled(&self, settings: &MeetingSettings) -> bool {
        match self {
            NotificationKind::Start => settings.bells.start,
            NotificationKind::Warning => settings.bells.warning,
            NotificationKind::TimeUp => settings.bells.end,
            NotificationKind::Overtime { .. } => settings.bells.overtime,
        }
    }

    fn title(&self, warning_secs: i64) -> String {
        match self {
            NotificationKind::Start => "Agenda started".to_string(),
            NotificationKind::Warning => format!("{} minutes left", warning_secs / 60),
            NotificationKind::TimeUp => "Time's up".to_string(),
            NotificationKind::Overtime { minutes } => format!("{minutes} min over time"),
        }
    }
}

/// Thresholds reached by moving remaining time from `prev` to `new`.
///
/// `prev` is the remaining time before the tick, `new` after it. Ticks only
/// ever decrease remaining time.
pub fn reached(prev: i64, new: i64, mode: ThresholdMode, warning_secs: i64) -> Vec<NotificationKind> {
    let mut kinds = Vec::new();
    match mode {
        ThresholdMode::Exact => {
            if new == warning_secs {
                kinds.push(NotificationKind::Warning);
            }
            if new == 0 {
                kinds.push(NotificationKind::TimeUp);
            }
            if new < 0 && new % 60 == 0 {
                kinds.push(NotificationKind::Overtime {
                    minutes: new.unsigned_abs() / 60,
                });
            }
        }
        ThresholdMode::Crossed => {
            let crossed = |t: i64| prev > t && t >= new;
            if crossed(warning_secs) {
                kinds.push(NotificationKind::Warning);
            }
            if crossed(0) {
                kinds.push(NotificationKind::TimeUp);
            }
            // Only the latest overtime minute; a long gap does not replay each one.
            let minutes = if new < 0 { new.unsigned_abs() / 60 } else { 0 };
            if minutes >= 1 && crossed(-(minutes as i64) * 60) {
                kinds.push(NotificationKind::Overtime { minutes });
            }
        }
    }
    kinds
}

/// Build the notification for `kind`, or `None` if the meeting's bell for
/// this event is off.
pub fn render(
    kind: NotificationKind,
    item: &AgendaItem,
    settings: &MeetingSettings,
    sound: Option<&str>,
    warning_secs: i64,
) -> Option<Notification> {
    if !kind.bell_enabled(settings) {
        return None;
    }
    let body = match kind {
        NotificationKind::Start => {
            format!("{} ({} min)", item.title, item.planned_duration / 60)
        }
        _ => item.title.clone(),
    };
    let options = if settings.silent_mode {
        NotificationOptions {
            sound: None,
            silent: true,
        }
    } else {
        NotificationOptions {
            sound: sound.map(str::to_string),
            silent: false,
        }
    };
    Some(Notification {
        kind,
        title: kind.title(warning_secs),
        body,
        options,
    })
}
