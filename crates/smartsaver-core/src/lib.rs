//! # Monitor Smart Saver Core Library
//!
//! This library provides the core logic of Monitor Smart Saver, a panel
//! control that starts the screensaver or locks the screen only after a
//! deliberate, cancelable click gesture. The `smartsaver` binary is a thin
//! host over the same library.
//!
//! ## Architecture
//!
//! - **Controller**: the click-gesture state machine. It owns the gesture
//!   session and talks to everything else through injected collaborators
//! - **Settings**: TOML-based settings with a pull + subscribe store and
//!   live reload of the file
//! - **Timers**: one-shot timer handles, on tokio or on a virtual clock
//! - **Desktop**: notifications, the GNOME screensaver over D-Bus, sound
//! - **Runtime**: the single-threaded event loop the daemon runs
//!
//! ## Key Components
//!
//! - [`SmartSaver`]: click-gesture state machine
//! - [`Settings`]: application settings
//! - [`SettingsStore`]: settings access used by the controller
//! - [`Simulation`]: deterministic virtual-time harness

pub mod controller;
pub mod desktop;
pub mod error;
pub mod events;
pub mod menu;
pub mod runtime;
pub mod settings;
pub mod simulation;
pub mod timer;

pub use controller::{Collaborators, GestureState, SmartSaver};
pub use desktop::{LockActuator, Notifier, SoundPlayer};
pub use error::{ConfigError, CoreError};
pub use events::{Event, LockMode};
pub use menu::MenuEntry;
pub use runtime::{Button, LoopEvent};
pub use settings::{FileSettings, MemorySettings, SettingKey, Settings, SettingsStore};
pub use simulation::Simulation;
pub use timer::{TimerHandle, TimerService};
