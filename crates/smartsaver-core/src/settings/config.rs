//! TOML-based application settings.
//!
//! Stores the gesture and feedback preferences:
//! - Countdown duration (`delay-off`, seconds)
//! - Gesture window (`delay-double-click`, milliseconds)
//! - Whether to play a sound when the countdown fires, and which file
//! - The program used to play it
//!
//! Settings are stored at `~/.config/monitor-smart-saver/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{data_dir, SettingKey};
use crate::error::ConfigError;

/// Seconds the countdown may last.
pub const DELAY_OFF_RANGE: std::ops::RangeInclusive<u32> = 1..=5;
/// Milliseconds the gesture window may last.
pub const DELAY_DOUBLE_CLICK_RANGE: std::ops::RangeInclusive<u32> = 100..=1000;

/// The selected notification sound, stored as `{ soundName, soundPath }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundSelection {
    #[serde(default)]
    pub sound_name: String,
    #[serde(default)]
    pub sound_path: String,
}

/// Application settings.
///
/// Serialized to/from TOML with kebab-case keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default = "default_delay_off")]
    pub delay_off: u32,
    #[serde(default = "default_delay_double_click")]
    pub delay_double_click: u32,
    #[serde(default)]
    pub play_sound: bool,
    /// Program invoked with the sound path as its only argument. Read once
    /// when the daemon starts; edits take effect on the next `run`.
    #[serde(default = "default_sound_player")]
    pub sound_player: String,
    #[serde(default)]
    pub sound_file_map: SoundSelection,
}

fn default_delay_off() -> u32 {
    3
}
fn default_delay_double_click() -> u32 {
    400
}
fn default_sound_player() -> String {
    "paplay".into()
}

impl Default for SoundSelection {
    fn default() -> Self {
        Self {
            sound_name: "complete.oga".into(),
            sound_path: "/usr/share/sounds/freedesktop/stereo/complete.oga".into(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay_off: default_delay_off(),
            delay_double_click: default_delay_double_click(),
            play_sound: false,
            sound_player: default_sound_player(),
            sound_file_map: SoundSelection::default(),
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }
        let mut parts = key.split('.').peekable();

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u32>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as unsigned integer")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Default location of the settings file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or validated,
    /// or if the default settings cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let cfg: Settings = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// The content goes to a sibling temp file first and is renamed over
    /// `path`, so a watcher never observes a truncated file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, content).map_err(|e| save_failed(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            save_failed(e.to_string())
        })
    }

    /// Check every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !DELAY_OFF_RANGE.contains(&self.delay_off) {
            return Err(ConfigError::InvalidValue {
                key: SettingKey::DelayOff.to_string(),
                message: format!(
                    "{} is outside {}..={} seconds",
                    self.delay_off,
                    DELAY_OFF_RANGE.start(),
                    DELAY_OFF_RANGE.end()
                ),
            });
        }
        if !DELAY_DOUBLE_CLICK_RANGE.contains(&self.delay_double_click) {
            return Err(ConfigError::InvalidValue {
                key: SettingKey::DelayDoubleClick.to_string(),
                message: format!(
                    "{} is outside {}..={} milliseconds",
                    self.delay_double_click,
                    DELAY_DOUBLE_CLICK_RANGE.start(),
                    DELAY_DOUBLE_CLICK_RANGE.end()
                ),
            });
        }
        Ok(())
    }

    /// Get a value as string by dot-separated key (`sound-file-map.soundPath`).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Return a copy with `key` set to `value`, validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result is out of range.
    pub fn with(&self, key: &str, value: &str) -> Result<Self, ConfigError> {
        let mut json = serde_json::to_value(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Settings = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        Ok(updated)
    }

    /// Set a value by key and persist to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        *self = self.with(key, value)?;
        self.save()
    }

    /// Numeric value for `key`, if it is a numeric key.
    pub fn uint(&self, key: SettingKey) -> Option<u32> {
        match key {
            SettingKey::DelayOff => Some(self.delay_off),
            SettingKey::DelayDoubleClick => Some(self.delay_double_click),
            SettingKey::PlaySound | SettingKey::SoundFileMap => None,
        }
    }

    /// Boolean value for `key`, if it is a boolean key.
    pub fn boolean(&self, key: SettingKey) -> Option<bool> {
        match key {
            SettingKey::PlaySound => Some(self.play_sound),
            _ => None,
        }
    }

    /// Keys whose values differ between `self` and `other`.
    pub fn changed_keys(&self, other: &Settings) -> Vec<SettingKey> {
        SettingKey::ALL
            .into_iter()
            .filter(|key| match key {
                SettingKey::DelayOff => self.delay_off != other.delay_off,
                SettingKey::DelayDoubleClick => self.delay_double_click != other.delay_double_click,
                SettingKey::PlaySound => self.play_sound != other.play_sound,
                SettingKey::SoundFileMap => self.sound_file_map != other.sound_file_map,
            })
            .collect()
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
