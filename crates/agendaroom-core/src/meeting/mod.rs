//! Meeting and agenda data model.
//!
//! A [`Meeting`] owns an ordered agenda. The `order` field, not the vector
//! position, defines the sequence. Aggregate totals are always recomputed
//! from the items, never accumulated.

mod agenda;
mod navigator;
mod settings;

pub use agenda::{AgendaItem, AgendaStatus};
pub use settings::{BellSettings, MeetingSettings};

pub(crate) use agenda::progress_pct;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

/// The top-level timed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub agenda: Vec<AgendaItem>,
    /// Seconds, sum of `planned_duration` over the agenda.
    #[serde(default)]
    pub total_planned_duration: u64,
    /// Seconds, sum of `actual_duration` over the agenda.
    #[serde(default)]
    pub total_actual_duration: u64,
    #[serde(default)]
    pub status: MeetingStatus,
    /// May dangle after structural edits; read it through the navigator.
    #[serde(default)]
    pub current_agenda_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: MeetingSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        settings: MeetingSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            agenda: Vec::new(),
            total_planned_duration: 0,
            total_actual_duration: 0,
            status: MeetingStatus::NotStarted,
            current_agenda_id: None,
            start_time: None,
            end_time: None,
            settings,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn find_agenda(&self, agenda_id: &str) -> Option<&AgendaItem> {
        self.agenda.iter().find(|a| a.id == agenda_id)
    }

    pub fn find_agenda_mut(&mut self, agenda_id: &str) -> Option<&mut AgendaItem> {
        self.agenda.iter_mut().find(|a| a.id == agenda_id)
    }

    /// Items sorted by `order`.
    pub fn ordered_agenda(&self) -> Vec<&AgendaItem> {
        let mut items: Vec<&AgendaItem> = self.agenda.iter().collect();
        items.sort_by_key(|a| a.order);
        items
    }

    /// Lowest-order pending item, skipping `exclude`.
    pub fn next_pending(&self, exclude: Option<&str>) -> Option<&AgendaItem> {
        self.agenda
            .iter()
            .filter(|a| a.status == AgendaStatus::Pending)
            .filter(|a| exclude != Some(a.id.as_str()))
            .min_by_key(|a| a.order)
    }

    /// Recompute both totals from scratch.
    pub(crate) fn recalculate_totals(&mut self) {
        self.total_planned_duration = self.agenda.iter().map(|a| a.planned_duration).sum();
        self.total_actual_duration = self.agenda.iter().map(|a| a.actual_duration).sum();
    }

    /// Reassign `order` to 0..n-1 preserving the current relative sequence,
    /// and keep the vector sorted to match.
    pub(crate) fn compact_orders(&mut self) {
        self.agenda.sort_by_key(|a| a.order);
        for (i, item) in self.agenda.iter_mut().enumerate() {
            item.order = i as u32;
        }
    }

    /// 0.0 .. 150.0 progress of the whole meeting against its plan.
    pub fn total_progress_pct(&self) -> f64 {
        progress_pct(self.total_actual_duration, self.total_planned_duration)
    }
}
