//! Click-gesture state machine.
//!
//! Turns primary-button presses into a delayed, cancelable screensaver
//! activation. Timers are armed through the injected [`TimerService`]; the
//! host hands every fired [`TimerHandle`] back via
//! [`SmartSaver::on_timer_fired`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> AwaitingResolution -> CountdownArmed(mode) -> Idle
//!                                      |
//!                      (3rd counted press) -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut saver = SmartSaver::new(parts, listener);
//! saver.on_primary_press();
//! // when a timer fires:
//! saver.on_timer_fired(handle);
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::desktop::{LockActuator, Notifier, SoundPlayer};
use crate::events::{Event, LockMode};
use crate::settings::{ChangeListener, SettingKey, SettingsStore, SubscriptionId};
use crate::timer::{TimerHandle, TimerService};

/// Presses in one window that make a double click.
pub const DOUBLE_CLICKS: u32 = 2;
/// Counted presses that cancel an armed countdown.
pub const CLICKS_CANCEL: u32 = 3;

pub const CANCELED_MESSAGE: &str = "Screensaver activation canceled!";

/// Observable state, derived from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "mode", rename_all = "snake_case")]
pub enum GestureState {
    Idle,
    AwaitingResolution,
    CountdownArmed(LockMode),
}

/// The external services the controller drives.
pub struct Collaborators {
    pub settings: Box<dyn SettingsStore>,
    pub timers: Box<dyn TimerService>,
    pub notifier: Box<dyn Notifier>,
    pub actuator: Box<dyn LockActuator>,
    pub sound: Box<dyn SoundPlayer>,
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    handle: TimerHandle,
    mode: LockMode,
}

/// Mutable interaction state. Reset, never recreated, between gestures.
#[derive(Debug)]
struct GestureSession {
    click_count: u32,
    window_timer: Option<TimerHandle>,
    countdown: Option<Countdown>,
    double_click_threshold_ms: u32,
    countdown_secs: u32,
}

/// The click-gesture controller.
pub struct SmartSaver {
    parts: Collaborators,
    session: GestureSession,
    subscription: Option<SubscriptionId>,
    torn_down: bool,
}

impl SmartSaver {
    /// Read the live settings and subscribe `listener` to their changes.
    ///
    /// The listener is expected to route each key back into
    /// [`SmartSaver::on_settings_changed`] on the controller's thread.
    pub fn new(parts: Collaborators, listener: ChangeListener) -> Self {
        let session = GestureSession {
            click_count: 0,
            window_timer: None,
            countdown: None,
            double_click_threshold_ms: parts.settings.get_uint(SettingKey::DelayDoubleClick),
            countdown_secs: parts.settings.get_uint(SettingKey::DelayOff),
        };
        let subscription = Some(parts.settings.subscribe(listener));
        Self {
            parts,
            session,
            subscription,
            torn_down: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> GestureState {
        if let Some(countdown) = self.session.countdown {
            GestureState::CountdownArmed(countdown.mode)
        } else if self.session.window_timer.is_some() {
            GestureState::AwaitingResolution
        } else {
            GestureState::Idle
        }
    }

    pub fn click_count(&self) -> u32 {
        self.session.click_count
    }

    pub fn double_click_threshold_ms(&self) -> u32 {
        self.session.double_click_threshold_ms
    }

    pub fn countdown_secs(&self) -> u32 {
        self.session.countdown_secs
    }

    pub fn window_timer(&self) -> Option<TimerHandle> {
        self.session.window_timer
    }

    pub fn countdown_timer(&self) -> Option<TimerHandle> {
        self.session.countdown.map(|c| c.handle)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Handle one primary-button press.
    pub fn on_primary_press(&mut self) -> Option<Event> {
        if self.torn_down {
            warn!("press after teardown ignored");
            return None;
        }

        let mut opened = None;
        if self.session.window_timer.is_none() {
            let threshold = self.session.double_click_threshold_ms;
            let handle = self
                .parts
                .timers
                .after(Duration::from_millis(u64::from(threshold)));
            debug!(%handle, threshold, "gesture window opened");
            self.session.window_timer = Some(handle);
            opened = Some(Event::GestureWindowOpened {
                threshold_ms: threshold,
                at: Utc::now(),
            });
        }

        self.session.click_count += 1;
        debug!(click_count = self.session.click_count, "press counted");

        if self.session.click_count >= CLICKS_CANCEL {
            if let Some(countdown) = self.session.countdown.take() {
                return Some(self.cancel_countdown(countdown));
            }
        }

        opened
    }

    /// Dispatch a fired timer. Handles the controller no longer owns are
    /// ignored, so a canceled timer never runs its callback.
    pub fn on_timer_fired(&mut self, handle: TimerHandle) -> Option<Event> {
        if self.torn_down {
            return None;
        }
        if self.session.window_timer == Some(handle) {
            self.session.window_timer = None;
            return self.resolve_gesture();
        }
        match self.session.countdown {
            Some(countdown) if countdown.handle == handle => {
                self.session.countdown = None;
                Some(self.fire_countdown(countdown.mode))
            }
            _ => {
                debug!(%handle, "stale timer ignored");
                None
            }
        }
    }

    /// Re-read a changed setting. In-flight timers keep their durations.
    pub fn on_settings_changed(&mut self, key: SettingKey) -> Option<Event> {
        if self.torn_down {
            return None;
        }
        let value = match key {
            SettingKey::DelayDoubleClick => {
                let value = self.parts.settings.get_uint(key);
                self.session.double_click_threshold_ms = value;
                value
            }
            SettingKey::DelayOff => {
                let value = self.parts.settings.get_uint(key);
                self.session.countdown_secs = value;
                value
            }
            // Read when the countdown fires.
            SettingKey::PlaySound | SettingKey::SoundFileMap => return None,
        };
        info!(%key, value, "setting reloaded");
        Some(Event::SettingReloaded {
            key,
            value,
            at: Utc::now(),
        })
    }

    /// Cancel all timers, clear the notification and unsubscribe from
    /// settings. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.session.window_timer.take() {
            self.parts.timers.cancel(handle);
        }
        if let Some(countdown) = self.session.countdown.take() {
            self.parts.timers.cancel(countdown.handle);
        }
        if let Some(id) = self.subscription.take() {
            self.parts.settings.unsubscribe(id);
        }
        if !self.torn_down {
            self.parts.notifier.clear();
            self.torn_down = true;
            debug!("controller torn down");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn resolve_gesture(&mut self) -> Option<Event> {
        let click_count = self.session.click_count;
        // A countdown that fired while this window was open reset the count.
        if click_count == 0 {
            debug!("gesture window closed without presses");
            return None;
        }
        let mode = if click_count >= DOUBLE_CLICKS {
            LockMode::Lock
        } else {
            LockMode::Activate
        };

        if self.session.countdown.is_some() {
            debug!(?mode, "countdown already armed");
            return None;
        }

        let secs = self.session.countdown_secs;
        let handle = self
            .parts
            .timers
            .after(Duration::from_secs(u64::from(secs)));
        self.session.countdown = Some(Countdown { handle, mode });
        self.parts.notifier.show(&countdown_message(mode, secs));
        info!(?mode, click_count, secs, "countdown armed");

        Some(Event::GestureResolved {
            mode,
            click_count,
            countdown_secs: secs,
            at: Utc::now(),
        })
    }

    fn cancel_countdown(&mut self, countdown: Countdown) -> Event {
        self.parts.timers.cancel(countdown.handle);
        if let Some(handle) = self.session.window_timer.take() {
            self.parts.timers.cancel(handle);
        }
        self.session.click_count = 0;
        self.parts.notifier.show(CANCELED_MESSAGE);
        info!(mode = ?countdown.mode, "countdown canceled");
        Event::CountdownCanceled {
            mode: countdown.mode,
            at: Utc::now(),
        }
    }

    fn fire_countdown(&mut self, mode: LockMode) -> Event {
        let settings = self.parts.settings.snapshot();
        let mut sound_played = false;
        if settings.play_sound {
            let path = settings.sound_file_map.sound_path;
            if path.is_empty() {
                warn!("sound enabled but no sound file selected");
            } else {
                self.parts.sound.play_from_file(Path::new(&path));
                sound_played = true;
            }
        }

        match mode {
            LockMode::Lock => self.parts.actuator.lock(),
            LockMode::Activate => self.parts.actuator.set_active(),
        }
        self.session.click_count = 0;
        info!(?mode, "countdown fired");

        Event::CountdownFired {
            mode,
            sound_played,
            at: Utc::now(),
        }
    }
}

impl Drop for SmartSaver {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Message shown when a countdown is armed.
pub fn countdown_message(mode: LockMode, secs: u32) -> String {
    let unit = if secs == 1 { "second" } else { "seconds" };
    match mode {
        LockMode::Lock => format!("Screensaver will lock the screen in {secs} {unit}!"),
        LockMode::Activate => format!("The screensaver will start in {secs} {unit}!"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Actuation, Notice, Simulation};
    use crate::settings::Settings;

    fn settings(threshold_ms: u32, countdown_secs: u32) -> Settings {
        Settings {
            delay_double_click: threshold_ms,
            delay_off: countdown_secs,
            ..Settings::default()
        }
    }

    #[test]
    fn single_press_arms_activate_countdown() {
        let mut sim = Simulation::new(settings(400, 2));
        sim.press_at(0);
        assert_eq!(sim.state(), GestureState::AwaitingResolution);

        sim.run_until(500);
        assert_eq!(sim.state(), GestureState::CountdownArmed(LockMode::Activate));
        assert_eq!(
            sim.log().notices,
            vec![Notice::Shown("The screensaver will start in 2 seconds!".into())]
        );

        sim.run_until(2_399);
        assert!(sim.log().actuations.is_empty());
        sim.run_until(2_400);
        assert_eq!(sim.log().actuations, vec![Actuation::SetActive]);
        assert_eq!(sim.state(), GestureState::Idle);
        assert_eq!(sim.saver().click_count(), 0);
    }

    #[test]
    fn two_presses_arm_lock_countdown() {
        let mut sim = Simulation::new(settings(400, 2));
        sim.press_at(0);
        sim.press_at(100);
        sim.run_until(400);
        assert_eq!(sim.state(), GestureState::CountdownArmed(LockMode::Lock));
        assert_eq!(
            sim.log().notices,
            vec![Notice::Shown("Screensaver will lock the screen in 2 seconds!".into())]
        );

        sim.run_until(10_000);
        assert_eq!(sim.log().actuations, vec![Actuation::Lock]);
    }

    #[test]
    fn third_press_cancels_lock_countdown() {
        let mut sim = Simulation::new(settings(400, 2));
        sim.press_at(0);
        sim.press_at(100);
        sim.run_until(500);

        sim.press_at(600);
        assert_eq!(sim.state(), GestureState::Idle);
        assert_eq!(sim.saver().click_count(), 0);
        assert_eq!(sim.saver().window_timer(), None);
        assert_eq!(
            sim.log().notices.last(),
            Some(&Notice::Shown(CANCELED_MESSAGE.into()))
        );

        sim.run_until(10_000);
        assert!(sim.log().actuations.is_empty());
    }

    #[test]
    fn single_mode_needs_two_more_presses_to_cancel() {
        let mut sim = Simulation::new(settings(400, 3));
        sim.press_at(0);
        sim.run_until(400);
        sim.press_at(1_000);
        assert_eq!(sim.state(), GestureState::CountdownArmed(LockMode::Activate));
        sim.press_at(1_050);
        assert_eq!(sim.state(), GestureState::Idle);
        sim.run_until(20_000);
        assert!(sim.log().actuations.is_empty());
    }

    #[test]
    fn resolution_during_countdown_does_not_rearm() {
        let mut sim = Simulation::new(settings(400, 3));
        sim.press_at(0);
        sim.run_until(400);
        let countdown = sim.saver().countdown_timer();

        sim.press_at(1_000);
        sim.run_until(1_400);
        assert_eq!(sim.saver().countdown_timer(), countdown);
        assert_eq!(sim.saver().click_count(), 2);

        sim.run_until(3_400);
        assert_eq!(sim.log().actuations, vec![Actuation::SetActive]);
        assert_eq!(sim.saver().click_count(), 0);
    }

    #[test]
    fn window_left_open_by_fire_resolves_to_nothing() {
        let mut sim = Simulation::new(settings(1_000, 1));
        sim.press_at(0);
        sim.run_until(1_000);
        // Countdown fires at 2000 while this window is still open.
        sim.press_at(1_500);
        sim.run_until(2_000);
        assert_eq!(sim.log().actuations, vec![Actuation::SetActive]);
        assert_eq!(sim.state(), GestureState::AwaitingResolution);

        sim.run_until(2_500);
        assert_eq!(sim.state(), GestureState::Idle);
        sim.run_until(10_000);
        assert_eq!(sim.log().actuations, vec![Actuation::SetActive]);
    }

    #[test]
    fn presses_in_one_window_arm_a_single_window_timer() {
        let mut sim = Simulation::new(settings(400, 2));
        sim.press_at(0);
        let window = sim.saver().window_timer();
        sim.press_at(0);
        assert_eq!(sim.saver().window_timer(), window);
        assert_eq!(sim.timers().armed(), 1);
    }

    #[test]
    fn sound_plays_before_actuation_when_enabled() {
        let mut cfg = settings(400, 1);
        cfg.play_sound = true;
        let mut sim = Simulation::new(cfg);
        sim.press_at(0);
        sim.run_until(5_000);
        let log = sim.log();
        assert_eq!(
            log.sounds,
            vec![std::path::PathBuf::from(
                "/usr/share/sounds/freedesktop/stereo/complete.oga"
            )]
        );
        assert_eq!(log.actuations, vec![Actuation::SetActive]);
    }

    #[test]
    fn empty_sound_path_is_skipped() {
        let mut cfg = settings(400, 1);
        cfg.play_sound = true;
        cfg.sound_file_map.sound_path.clear();
        let mut sim = Simulation::new(cfg);
        sim.press_at(0);
        sim.run_until(5_000);
        assert!(sim.log().sounds.is_empty());
        assert_eq!(sim.log().actuations, vec![Actuation::SetActive]);
    }

    #[test]
    fn delay_change_applies_to_next_countdown_only() {
        let mut sim = Simulation::new(settings(400, 2));
        sim.press_at(0);
        sim.run_until(400);
        let armed = sim.saver().countdown_timer().unwrap();
        assert_eq!(sim.timers().deadline(armed), Some(2_400));

        sim.set("delay-off", "5").unwrap();
        assert_eq!(sim.saver().countdown_secs(), 5);
        assert_eq!(sim.timers().deadline(armed), Some(2_400));

        sim.run_until(2_400);
        assert_eq!(sim.log().actuations.len(), 1);

        sim.press_at(3_000);
        sim.run_until(3_400);
        let next = sim.saver().countdown_timer().unwrap();
        assert_eq!(sim.timers().deadline(next), Some(8_400));
    }

    #[test]
    fn threshold_change_applies_to_next_window() {
        let mut sim = Simulation::new(settings(400, 2));
        sim.press_at(0);
        let window = sim.saver().window_timer().unwrap();
        sim.set("delay-double-click", "800").unwrap();
        assert_eq!(sim.timers().deadline(window), Some(400));
        assert_eq!(sim.saver().double_click_threshold_ms(), 800);
    }

    #[test]
    fn teardown_cancels_everything_and_is_idempotent() {
        let mut sim = Simulation::new(settings(400, 2));
        sim.press_at(0);
        sim.run_until(400);
        sim.press_at(500);
        assert_eq!(sim.timers().armed(), 2);

        sim.teardown();
        sim.teardown();
        assert_eq!(sim.timers().armed(), 0);
        assert_eq!(sim.settings().subscriber_count(), 0);
        assert_eq!(
            sim.log().notices.iter().filter(|n| **n == Notice::Cleared).count(),
            1
        );

        sim.run_until(10_000);
        assert!(sim.log().actuations.is_empty());
        assert!(sim.saver_mut().on_primary_press().is_none());
    }

    #[test]
    fn stale_handle_is_ignored() {
        let mut sim = Simulation::new(settings(400, 2));
        assert!(sim.saver_mut().on_timer_fired(TimerHandle(77)).is_none());
        assert_eq!(sim.state(), GestureState::Idle);
    }

    #[test]
    fn countdown_message_pluralizes() {
        assert_eq!(
            countdown_message(LockMode::Activate, 1),
            "The screensaver will start in 1 second!"
        );
        assert_eq!(
            countdown_message(LockMode::Lock, 4),
            "Screensaver will lock the screen in 4 seconds!"
        );
    }
}
