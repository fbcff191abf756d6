//! Current-item selection.
//!
//! `current_agenda_id` can dangle after a structural edit. Every read of the
//! current item goes through [`Meeting::current_agenda`], which repairs the
//! reference in place before returning it, so callers never need a separate
//! repair step.

use tracing::debug;

use super::{AgendaItem, Meeting};

impl Meeting {
    /// Repair `current_agenda_id` if it is unset or points at a missing item.
    ///
    /// The replacement is the lowest-order pending item, or `None`.
    /// Returns `true` if the stored reference changed.
    pub fn validate_current(&mut self) -> bool {
        let valid = self
            .current_agenda_id
            .as_deref()
            .is_some_and(|id| self.find_agenda(id).is_some());
        if valid {
            return false;
        }

        let healed = self.next_pending(None).map(|a| a.id.clone());
        if healed == self.current_agenda_id {
            return false;
        }
        debug!(
            meeting_id = %self.id,
            stale = ?self.current_agenda_id,
            healed = ?healed,
            "repaired current agenda reference"
        );
        self.current_agenda_id = healed;
        true
    }

    /// Current item without repair. Only meaningful after `validate_current`.
    pub fn current(&self) -> Option<&AgendaItem> {
        self.current_agenda_id
            .as_deref()
            .and_then(|id| self.find_agenda(id))
    }

    /// Self-healing read of the current item.
    pub fn current_agenda(&mut self) -> Option<&AgendaItem> {
        self.validate_current();
        self.current()
    }

    pub(crate) fn current_agenda_mut(&mut self) -> Option<&mut AgendaItem> {
        self.validate_current();
        let id = self.current_agenda_id.clone()?;
        self.find_agenda_mut(&id)
    }
}
