mod engine;
mod lifecycle;
mod transition;

pub use engine::{EngineOptions, MeetingEngine, PersistedState, TimerState};
pub use lifecycle::{AgendaPatch, NewAgenda};
pub use transition::ScheduledStart;
