//! # Agendaroom Core Library
//!
//! This library provides the core business logic for the Agendaroom meeting
//! timer. All operations are available through a standalone CLI binary; any
//! GUI is a thin layer over the same engine.
//!
//! ## Architecture
//!
//! - **Meeting model**: meetings with ordered agenda items and derived totals
//! - **Navigator**: self-healing selection of the current agenda item
//! - **Timer Engine**: a wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()` for progress updates
//! - **Notification Trigger**: start, warning, time-up and overtime
//!   thresholds delivered through a pluggable sink
//! - **Storage**: SQLite-based state storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`MeetingEngine`]: Core meeting timer state machine
//! - [`Database`]: State and history persistence
//! - [`Config`]: Application configuration management
//! - [`NotificationSink`]: Trait for notification delivery

pub mod clock;
pub mod error;
pub mod events;
pub mod meeting;
pub mod notify;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, NotifyError, ValidationError};
pub use events::Event;
pub use meeting::{AgendaItem, AgendaStatus, BellSettings, Meeting, MeetingSettings, MeetingStatus};
pub use notify::{
    Notification, NotificationKind, NotificationOptions, NotificationSink, NullSink, RecordingSink,
    ThresholdMode, TracingSink,
};
pub use storage::{Config, Database, MeetingRecord};
pub use timer::{
    AgendaPatch, EngineOptions, MeetingEngine, NewAgenda, PersistedState, ScheduledStart, TimerState,
};
