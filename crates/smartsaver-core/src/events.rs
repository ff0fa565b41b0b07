use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::SettingKey;

/// What a countdown does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Single click: start the screensaver only.
    Activate,
    /// Double click: lock the screen.
    Lock,
}

/// Every state change of the controller produces an Event.
/// Hosts log them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// First press of a gesture window.
    GestureWindowOpened {
        threshold_ms: u32,
        at: DateTime<Utc>,
    },
    /// The window closed and a countdown was armed.
    GestureResolved {
        mode: LockMode,
        click_count: u32,
        countdown_secs: u32,
        at: DateTime<Utc>,
    },
    /// The cancel gesture aborted an armed countdown.
    CountdownCanceled {
        mode: LockMode,
        at: DateTime<Utc>,
    },
    /// The countdown ran out and the actuator was invoked.
    CountdownFired {
        mode: LockMode,
        sound_played: bool,
        at: DateTime<Utc>,
    },
    /// A live setting was re-read.
    SettingReloaded {
        key: SettingKey,
        value: u32,
        at: DateTime<Utc>,
    },
}
