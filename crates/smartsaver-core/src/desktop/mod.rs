//! Desktop-facing collaborators of the controller.
//!
//! The traits are what the controller calls; the adapters talk to the
//! freedesktop notification service, the GNOME screensaver over the session
//! bus, and an external sound player.

mod notifier;
mod screensaver;
mod sound;

pub use notifier::DesktopNotifier;
pub use screensaver::ScreenSaverActuator;
pub use sound::CommandSoundPlayer;

use std::path::Path;

/// Shows one transient message at a time.
pub trait Notifier {
    /// Show `text`, replacing any message this notifier currently displays.
    fn show(&mut self, text: &str);

    /// Remove the current message, if any.
    fn clear(&mut self);
}

/// Screensaver control. Both calls are fire-and-forget; failures are
/// logged by the implementation.
pub trait LockActuator {
    fn set_active(&self);

    fn lock(&self);
}

/// Fire-and-forget sound playback.
pub trait SoundPlayer {
    fn play_from_file(&self, path: &Path);
}
