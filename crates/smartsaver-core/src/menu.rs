//! Secondary-button menu.
//!
//! A secondary press never touches gesture state; it opens this menu.
//! Entries open the settings file, launch the desktop privacy settings, or
//! toggle the desktop's own screen-lock setting.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, Result};

const LOCK_SCHEMA: &str = "org.gnome.desktop.screensaver";
const LOCK_KEY: &str = "lock-enabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "kebab-case")]
pub enum MenuEntry {
    Settings,
    SystemSettings,
    Separator,
    /// Switch bound to the desktop's `lock-enabled` value.
    LockDisable { enabled: bool },
}

impl MenuEntry {
    pub fn label(&self) -> &'static str {
        match self {
            MenuEntry::Settings => "Settings",
            MenuEntry::SystemSettings => "System settings",
            MenuEntry::Separator => "",
            MenuEntry::LockDisable { .. } => "Lock disable",
        }
    }
}

/// Entries in display order.
pub fn secondary_menu(lock_enabled: bool) -> Vec<MenuEntry> {
    vec![
        MenuEntry::Settings,
        MenuEntry::SystemSettings,
        MenuEntry::Separator,
        MenuEntry::LockDisable {
            enabled: lock_enabled,
        },
    ]
}

/// Open the settings file with the default application.
pub fn open_settings(path: &Path) -> Result<()> {
    info!(path = %path.display(), "opening settings");
    open::that(path)?;
    Ok(())
}

/// Launch the desktop privacy settings panel.
pub fn open_system_settings() -> Result<()> {
    Command::new("gnome-control-center").arg("privacy").spawn()?;
    Ok(())
}

/// Read `org.gnome.desktop.screensaver lock-enabled`.
pub fn lock_enabled() -> Result<bool> {
    let output = Command::new("gsettings")
        .args(["get", LOCK_SCHEMA, LOCK_KEY])
        .output()?;
    if !output.status.success() {
        return Err(CoreError::Custom(format!(
            "gsettings get {LOCK_SCHEMA} {LOCK_KEY} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_gsettings_bool(&stdout)
        .ok_or_else(|| CoreError::Custom(format!("unexpected gsettings output: {}", stdout.trim())))
}

/// Write `org.gnome.desktop.screensaver lock-enabled`.
pub fn set_lock_enabled(enabled: bool) -> Result<()> {
    let status = Command::new("gsettings")
        .args(["set", LOCK_SCHEMA, LOCK_KEY, if enabled { "true" } else { "false" }])
        .status()?;
    if !status.success() {
        return Err(CoreError::Custom(format!(
            "gsettings set {LOCK_SCHEMA} {LOCK_KEY} exited with {status}"
        )));
    }
    info!(enabled, "screen lock setting changed");
    Ok(())
}

fn parse_gsettings_bool(output: &str) -> Option<bool> {
    match output.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_lists_entries_in_order() {
        let menu = secondary_menu(true);
        assert_eq!(menu.len(), 4);
        assert_eq!(menu[0], MenuEntry::Settings);
        assert_eq!(menu[2], MenuEntry::Separator);
        assert_eq!(menu[3], MenuEntry::LockDisable { enabled: true });
        assert_eq!(menu[3].label(), "Lock disable");
    }

    #[test]
    fn menu_serializes_with_entry_tag() {
        let json = serde_json::to_string(&secondary_menu(false)).unwrap();
        assert_eq!(
            json,
            r#"[{"entry":"settings"},{"entry":"system-settings"},{"entry":"separator"},{"entry":"lock-disable","enabled":false}]"#
        );
    }

    #[test]
    fn parses_gsettings_output() {
        assert_eq!(parse_gsettings_bool("true\n"), Some(true));
        assert_eq!(parse_gsettings_bool(" false "), Some(false));
        assert_eq!(parse_gsettings_bool("No such schema"), None);
    }
}
