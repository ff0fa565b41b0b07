use clap::{Subcommand, ValueEnum};
use smartsaver_core::menu;
use smartsaver_core::Settings;

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum MenuAction {
    /// Print the menu entries as JSON
    List,
    /// Open the settings file
    Settings,
    /// Open the desktop privacy settings
    SystemSettings,
    /// Turn the desktop screen lock on or off
    LockDisable {
        #[arg(value_enum)]
        state: Switch,
    },
}

/// The menu as JSON, with the current lock state if it can be read.
pub fn menu_json() -> Result<String, serde_json::Error> {
    let lock_enabled = menu::lock_enabled().unwrap_or_else(|e| {
        tracing::warn!("cannot read screen lock setting: {e}");
        false
    });
    serde_json::to_string(&menu::secondary_menu(lock_enabled))
}

pub fn run(action: MenuAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        MenuAction::List => println!("{}", menu_json()?),
        MenuAction::Settings => menu::open_settings(&Settings::path()?)?,
        MenuAction::SystemSettings => menu::open_system_settings()?,
        MenuAction::LockDisable { state } => {
            menu::set_lock_enabled(matches!(state, Switch::On))?;
            println!("ok");
        }
    }
    Ok(())
}
