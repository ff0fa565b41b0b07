//! Single-threaded event loop for the daemon.
//!
//! Presses, setting changes and fired timers all arrive as [`LoopEvent`]s
//! on one unbounded channel; the loop is the only code that touches the
//! controller, so callbacks never interleave.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::controller::SmartSaver;
use crate::events::Event;
use crate::settings::{ChangeListener, SettingKey};
use crate::timer::{TimerHandle, TimerService};

/// Pointer button of a press on the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
    Other(u8),
}

impl FromStr for Button {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "left" | "1" => Ok(Button::Primary),
            "secondary" | "right" | "3" => Ok(Button::Secondary),
            other => other
                .parse::<u8>()
                .map(Button::Other)
                .map_err(|_| format!("unknown button: {other}")),
        }
    }
}

/// Input of the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Press(Button),
    SettingChanged(SettingKey),
    TimerFired(TimerHandle),
    Shutdown,
}

/// Settings listener that forwards changes into the loop.
pub fn forward_changes(tx: UnboundedSender<LoopEvent>) -> ChangeListener {
    Box::new(move |key| {
        let _ = tx.send(LoopEvent::SettingChanged(key));
    })
}

/// [`TimerService`] backed by tokio sleeps that post
/// [`LoopEvent::TimerFired`] into the loop. Cancel aborts the sleep.
pub struct TokioTimers {
    tx: UnboundedSender<LoopEvent>,
    next_id: u64,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(tx: UnboundedSender<LoopEvent>) -> Self {
        Self {
            tx,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }
}

impl TimerService for TokioTimers {
    fn after(&mut self, delay: Duration) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(LoopEvent::TimerFired(handle));
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

fn log_event(event: &Event) {
    match event {
        Event::GestureWindowOpened { threshold_ms, .. } => debug!(threshold_ms, "gesture window opened"),
        Event::GestureResolved { mode, countdown_secs, .. } => {
            info!(?mode, countdown_secs, "gesture resolved")
        }
        Event::CountdownCanceled { mode, .. } => info!(?mode, "countdown canceled"),
        Event::CountdownFired { mode, sound_played, .. } => {
            info!(?mode, sound_played, "countdown fired")
        }
        Event::SettingReloaded { key, value, .. } => info!(%key, value, "setting reloaded"),
    }
}

/// Drive `saver` until [`LoopEvent::Shutdown`] arrives or every sender is
/// dropped, then tear it down. Secondary presses go to `on_secondary`;
/// every controller event goes to `on_event`.
pub async fn run_loop<S, E>(
    saver: &mut SmartSaver,
    rx: &mut UnboundedReceiver<LoopEvent>,
    mut on_secondary: S,
    mut on_event: E,
) where
    S: FnMut(),
    E: FnMut(&Event),
{
    info!("event loop started");
    while let Some(input) = rx.recv().await {
        let event = match input {
            LoopEvent::Press(Button::Primary) => saver.on_primary_press(),
            LoopEvent::Press(Button::Secondary) => {
                on_secondary();
                None
            }
            LoopEvent::Press(Button::Other(button)) => {
                debug!(button, "press ignored");
                None
            }
            LoopEvent::SettingChanged(key) => saver.on_settings_changed(key),
            LoopEvent::TimerFired(handle) => saver.on_timer_fired(handle),
            LoopEvent::Shutdown => break,
        };
        if let Some(event) = event {
            log_event(&event);
            on_event(&event);
        }
    }
    saver.teardown();
    info!("event loop stopped");
}
