//! Meeting management commands for CLI.

use clap::Subcommand;
use serde::Serialize;

use agendaroom_core::{Meeting, MeetingSettings, MeetingStatus, ValidationError};

use crate::session::{print_json, require_title, CliResult, Session};

#[derive(Subcommand)]
pub enum MeetingAction {
    /// Create a new meeting
    Create {
        /// Meeting title
        title: String,
        /// Start the next item automatically when one is stopped
        #[arg(long)]
        auto_transition: Option<bool>,
        /// Deliver notifications without sound
        #[arg(long)]
        silent: Option<bool>,
    },
    /// List meetings
    List,
    /// Show a meeting with its agenda
    Show {
        /// Meeting ID (defaults to the current meeting)
        id: Option<String>,
    },
    /// Delete a meeting
    Delete {
        /// Meeting ID
        id: String,
    },
    /// Make a meeting the current one
    Use {
        /// Meeting ID
        id: String,
    },
    /// Rename a meeting
    Rename {
        /// Meeting ID
        id: String,
        /// New title
        title: String,
    },
    /// Show or change meeting settings
    Settings {
        /// Meeting ID (defaults to the current meeting)
        #[arg(long)]
        meeting: Option<String>,
        #[arg(long)]
        auto_transition: Option<bool>,
        #[arg(long)]
        silent: Option<bool>,
        /// Bell when an item starts
        #[arg(long)]
        bell_start: Option<bool>,
        /// Bell at the warning threshold
        #[arg(long)]
        bell_warning: Option<bool>,
        /// Bell when time is up
        #[arg(long)]
        bell_end: Option<bool>,
        /// Bell for every overtime minute
        #[arg(long)]
        bell_overtime: Option<bool>,
    },
    /// List completed meetings, newest first
    History {
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

/// One row of `meeting list`.
#[derive(Serialize)]
struct MeetingSummary<'a> {
    id: &'a str,
    title: &'a str,
    status: MeetingStatus,
    current: bool,
    agenda_count: usize,
    total_planned_duration: u64,
    total_actual_duration: u64,
}

impl<'a> MeetingSummary<'a> {
    fn new(meeting: &'a Meeting, current: Option<&str>) -> Self {
        Self {
            id: &meeting.id,
            title: &meeting.title,
            status: meeting.status,
            current: current == Some(meeting.id.as_str()),
            agenda_count: meeting.agenda.len(),
            total_planned_duration: meeting.total_planned_duration,
            total_actual_duration: meeting.total_actual_duration,
        }
    }
}

struct SettingsPatch {
    auto_transition: Option<bool>,
    silent: Option<bool>,
    bell_start: Option<bool>,
    bell_warning: Option<bool>,
    bell_end: Option<bool>,
    bell_overtime: Option<bool>,
}

impl SettingsPatch {
    fn is_empty(&self) -> bool {
        [
            self.auto_transition,
            self.silent,
            self.bell_start,
            self.bell_warning,
            self.bell_end,
            self.bell_overtime,
        ]
        .iter()
        .all(Option::is_none)
    }

    fn apply(&self, mut settings: MeetingSettings) -> MeetingSettings {
        if let Some(v) = self.auto_transition {
            settings.auto_transition = v;
        }
        if let Some(v) = self.silent {
            settings.silent_mode = v;
        }
        if let Some(v) = self.bell_start {
            settings.bells.start = v;
        }
        if let Some(v) = self.bell_warning {
            settings.bells.warning = v;
        }
        if let Some(v) = self.bell_end {
            settings.bells.end = v;
        }
        if let Some(v) = self.bell_overtime {
            settings.bells.overtime = v;
        }
        settings
    }
}

fn unknown(id: &str) -> Box<dyn std::error::Error> {
    ValidationError::UnknownMeeting(id.to_string()).into()
}

pub fn run(action: MeetingAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        MeetingAction::Create {
            title,
            auto_transition,
            silent,
        } => {
            let title = require_title("title", &title)?;
            let patch = SettingsPatch {
                auto_transition,
                silent,
                bell_start: None,
                bell_warning: None,
                bell_end: None,
                bell_overtime: None,
            };
            let settings = patch.apply(session.engine.options().default_settings);
            let id = session.engine.create_meeting_with(title, settings);
            if let Some(meeting) = session.engine.meeting(&id) {
                print_json(meeting)?;
            }
        }
        MeetingAction::List => {
            let current = session.engine.current_meeting_id();
            let rows: Vec<_> = session
                .engine
                .meetings()
                .iter()
                .map(|m| MeetingSummary::new(m, current))
                .collect();
            print_json(&rows)?;
        }
        MeetingAction::Show { id } => {
            let id = session.meeting_id(id)?;
            if session.engine.current_meeting_id() == Some(id.as_str()) {
                // Repairs a dangling current item before display.
                session.engine.current_agenda();
            }
            if let Some(meeting) = session.engine.meeting(&id) {
                print_json(meeting)?;
            }
        }
        MeetingAction::Delete { id } => {
            if !session.engine.delete_meeting(&id) {
                return Err(unknown(&id));
            }
            println!("Meeting deleted: {id}");
        }
        MeetingAction::Use { id } => {
            if !session.engine.set_current_meeting(&id) {
                return Err(unknown(&id));
            }
            println!("Current meeting: {id}");
        }
        MeetingAction::Rename { id, title } => {
            let title = require_title("title", &title)?;
            if !session.engine.update_meeting_title(&id, title) {
                return Err(unknown(&id));
            }
            println!("Meeting renamed: {id}");
        }
        MeetingAction::Settings {
            meeting,
            auto_transition,
            silent,
            bell_start,
            bell_warning,
            bell_end,
            bell_overtime,
        } => {
            let id = session.meeting_id(meeting)?;
            let patch = SettingsPatch {
                auto_transition,
                silent,
                bell_start,
                bell_warning,
                bell_end,
                bell_overtime,
            };
            let current = session
                .engine
                .meeting(&id)
                .map(|m| m.settings)
                .ok_or_else(|| unknown(&id))?;
            let settings = patch.apply(current);
            if !patch.is_empty() {
                session.engine.update_meeting_settings(&id, settings);
            }
            print_json(&settings)?;
        }
        MeetingAction::History { limit } => {
            print_json(&session.db.meeting_history(limit)?)?;
            return Ok(());
        }
    }

    session.save()?;
    Ok(())
}
