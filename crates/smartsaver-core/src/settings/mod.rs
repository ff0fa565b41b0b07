mod config;
mod store;

pub use config::{Settings, SoundSelection};
pub use store::{ChangeListener, FileSettings, MemorySettings, SettingsStore, SubscriptionId};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Returns `~/.config/monitor-smart-saver[-dev]/` based on SMARTSAVER_ENV.
///
/// Set SMARTSAVER_ENV=dev to use a development config directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SMARTSAVER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("monitor-smart-saver-dev")
    } else {
        base_dir.join("monitor-smart-saver")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::NoConfigDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// The settings keys the gesture controller reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingKey {
    /// Countdown duration in seconds.
    DelayOff,
    /// Gesture window in milliseconds.
    DelayDoubleClick,
    PlaySound,
    SoundFileMap,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::DelayOff,
        SettingKey::DelayDoubleClick,
        SettingKey::PlaySound,
        SettingKey::SoundFileMap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::DelayOff => "delay-off",
            SettingKey::DelayDoubleClick => "delay-double-click",
            SettingKey::PlaySound => "play-sound",
            SettingKey::SoundFileMap => "sound-file-map",
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_from_their_names() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!("delay-on".parse::<SettingKey>().is_err());
    }

    #[test]
    fn serde_name_matches_display() {
        let json = serde_json::to_string(&SettingKey::DelayDoubleClick).unwrap();
        assert_eq!(json, "\"delay-double-click\"");
    }
}
