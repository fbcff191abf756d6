//! Agenda item commands for CLI.

use clap::Subcommand;

use agendaroom_core::{AgendaPatch, NewAgenda, ValidationError};

use crate::session::{planned_secs, print_events, print_json, require_title, CliResult, Session};

#[derive(Subcommand)]
pub enum AgendaAction {
    /// Append an item to a meeting's agenda
    Add {
        /// Item title
        title: String,
        /// Planned minutes
        #[arg(long)]
        minutes: Option<u64>,
        /// Planned seconds (added to --minutes)
        #[arg(long)]
        secs: Option<u64>,
        #[arg(long)]
        memo: Option<String>,
        /// Meeting ID (defaults to the current meeting)
        #[arg(long)]
        meeting: Option<String>,
    },
    /// List agenda items in order
    List {
        #[arg(long)]
        meeting: Option<String>,
    },
    /// Update an item
    Update {
        /// Agenda item ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        minutes: Option<u64>,
        #[arg(long)]
        secs: Option<u64>,
        #[arg(long)]
        memo: Option<String>,
        /// Remove the memo
        #[arg(long, conflicts_with = "memo")]
        clear_memo: bool,
        #[arg(long)]
        meeting: Option<String>,
    },
    /// Delete an item
    Delete {
        /// Agenda item ID
        id: String,
        #[arg(long)]
        meeting: Option<String>,
    },
    /// Move items to the front in the given order
    Reorder {
        /// Agenda item IDs in their new order
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        meeting: Option<String>,
    },
    /// Make an item of the current meeting the current one
    Select {
        /// Agenda item ID
        id: String,
    },
}

fn unknown(meeting_id: &str, agenda_id: &str) -> Box<dyn std::error::Error> {
    ValidationError::UnknownAgenda {
        meeting_id: meeting_id.to_string(),
        agenda_id: agenda_id.to_string(),
    }
    .into()
}

pub fn run(action: AgendaAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        AgendaAction::Add {
            title,
            minutes,
            secs,
            memo,
            meeting,
        } => {
            let meeting_id = session.meeting_id(meeting)?;
            let title = require_title("title", &title)?;
            let planned = planned_secs(minutes, secs)?
                .ok_or("planned duration required: pass --minutes or --secs")?;
            let mut new = NewAgenda::new(title, planned);
            if let Some(memo) = memo {
                new = new.memo(memo);
            }
            let id = session
                .engine
                .add_agenda(&meeting_id, new)
                .ok_or_else(|| ValidationError::UnknownMeeting(meeting_id.clone()))?;
            let item = session
                .engine
                .meeting(&meeting_id)
                .and_then(|m| m.find_agenda(&id));
            print_json(&item)?;
        }
        AgendaAction::List { meeting } => {
            let meeting_id = session.meeting_id(meeting)?;
            if let Some(meeting) = session.engine.meeting(&meeting_id) {
                print_json(&meeting.ordered_agenda())?;
            }
            return Ok(());
        }
        AgendaAction::Update {
            id,
            title,
            minutes,
            secs,
            memo,
            clear_memo,
            meeting,
        } => {
            let meeting_id = session.meeting_id(meeting)?;
            let patch = AgendaPatch {
                title: title.map(|t| require_title("title", &t)).transpose()?,
                memo: if clear_memo { Some(None) } else { memo.map(Some) },
                planned_duration: planned_secs(minutes, secs)?,
            };
            if !session.engine.update_agenda(&meeting_id, &id, patch) {
                return Err(unknown(&meeting_id, &id));
            }
            let item = session
                .engine
                .meeting(&meeting_id)
                .and_then(|m| m.find_agenda(&id));
            print_json(&item)?;
        }
        AgendaAction::Delete { id, meeting } => {
            let meeting_id = session.meeting_id(meeting)?;
            if !session.engine.delete_agenda(&meeting_id, &id) {
                return Err(unknown(&meeting_id, &id));
            }
            println!("Agenda item deleted: {id}");
        }
        AgendaAction::Reorder { ids, meeting } => {
            let meeting_id = session.meeting_id(meeting)?;
            if !session.engine.reorder_agendas(&meeting_id, &ids) {
                return Err(ValidationError::InvalidValue {
                    field: "ids".to_string(),
                    message: "unknown or duplicate agenda item id".to_string(),
                }
                .into());
            }
            if let Some(meeting) = session.engine.meeting(&meeting_id) {
                print_json(&meeting.ordered_agenda())?;
            }
        }
        AgendaAction::Select { id } => {
            let meeting_id = session.meeting_id(None)?;
            let exists = session
                .engine
                .meeting(&meeting_id)
                .is_some_and(|m| m.find_agenda(&id).is_some());
            if !exists {
                return Err(unknown(&meeting_id, &id));
            }
            match session.engine.select_agenda(&id) {
                Some(event) => print_events(&[event])?,
                None => println!("No change: item is already current or completed"),
            }
        }
    }

    session.save()?;
    Ok(())
}
