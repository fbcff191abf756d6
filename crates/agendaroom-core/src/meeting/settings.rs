use serde::{Deserialize, Serialize};

/// Which events ring the bell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BellSettings {
    #[serde(default = "default_true")]
    pub start: bool,
    /// Five-minute warning.
    #[serde(default = "default_true")]
    pub warning: bool,
    #[serde(default = "default_true")]
    pub end: bool,
    #[serde(default = "default_true")]
    pub overtime: bool,
}

/// Per-meeting notification and transition preferences.
///
/// Opaque to the timing logic; only the notification trigger and the
/// auto-transition read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MeetingSettings {
    /// Start the next item automatically after `stop`.
    #[serde(default)]
    pub auto_transition: bool,
    /// Deliver notifications without sound.
    #[serde(default)]
    pub silent_mode: bool,
    #[serde(default)]
    pub bells: BellSettings,
}

fn default_true() -> bool {
    true
}

impl Default for BellSettings {
    fn default() -> Self {
        Self {
            start: true,
            warning: true,
            end: true,
            overtime: true,
        }
    }
}
