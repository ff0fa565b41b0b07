use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use notify_rust::{Notification, NotificationHandle};
use tracing::{debug, warn};

use super::Notifier;
use crate::error::Result;

pub const NOTIFICATION_SUMMARY: &str = "Monitor Smart Saver";
const NOTIFICATION_ICON: &str = "dialog-information";

enum Command {
    Show(String),
    Clear,
}

/// Freedesktop notifications through notify-rust.
///
/// The notification calls block on the session bus, so they run on a
/// dedicated thread that owns the currently displayed notification.
/// Dropping the notifier drains the queued commands and joins the thread.
pub struct DesktopNotifier {
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl DesktopNotifier {
    pub fn spawn() -> Result<Self> {
        Self::spawn_with(
            |body: &str| {
                Notification::new()
                    .summary(NOTIFICATION_SUMMARY)
                    .body(body)
                    .icon(NOTIFICATION_ICON)
                    .show()
                    .map_err(|e| warn!("failed to show notification: {e}"))
                    .ok()
            },
            NotificationHandle::close,
        )
    }

    /// Run the command loop over any show/close pair. At most one shown
    /// value is held at a time; every command closes it first.
    fn spawn_with<H, S, C>(mut show: S, mut close: C) -> Result<Self>
    where
        H: 'static,
        S: FnMut(&str) -> Option<H> + Send + 'static,
        C: FnMut(H) + Send + 'static,
    {
        let (commands, rx) = mpsc::channel::<Command>();
        let worker = std::thread::Builder::new()
            .name("smartsaver-notify".into())
            .spawn(move || {
                let mut current: Option<H> = None;
                for command in rx {
                    if let Some(handle) = current.take() {
                        close(handle);
                    }
                    if let Command::Show(body) = command {
                        current = show(&body);
                    }
                }
                debug!("notifier thread stopped");
            })?;
        Ok(Self {
            commands: Some(commands),
            worker: Some(worker),
        })
    }

    fn send(&self, command: Command) {
        let delivered = self
            .commands
            .as_ref()
            .is_some_and(|tx| tx.send(command).is_ok());
        if !delivered {
            warn!("notifier thread is gone");
        }
    }
}

impl Notifier for DesktopNotifier {
    fn show(&mut self, text: &str) {
        self.send(Command::Show(text.to_string()));
    }

    fn clear(&mut self) {
        self.send(Command::Clear);
    }
}

impl Drop for DesktopNotifier {
    fn drop(&mut self) {
        // Closing the channel ends the loop once the queue is empty.
        self.commands.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("notifier thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<String>>>;

    fn recording_notifier() -> (DesktopNotifier, Calls) {
        let calls: Calls = Arc::default();
        let shown = Arc::clone(&calls);
        let closed = Arc::clone(&calls);
        let notifier = DesktopNotifier::spawn_with(
            move |body: &str| {
                shown.lock().unwrap().push(format!("show {body}"));
                Some(body.to_string())
            },
            move |handle: String| closed.lock().unwrap().push(format!("close {handle}")),
        )
        .unwrap();
        (notifier, calls)
    }

    #[test]
    fn drop_runs_queued_clear_before_returning() {
        let (mut notifier, calls) = recording_notifier();
        notifier.show("The screensaver will start in 3 seconds!");
        notifier.clear();
        drop(notifier);

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "show The screensaver will start in 3 seconds!".to_string(),
                "close The screensaver will start in 3 seconds!".to_string(),
            ]
        );
    }

    #[test]
    fn show_replaces_previous_notification() {
        let (mut notifier, calls) = recording_notifier();
        notifier.show("first");
        notifier.show("second");
        drop(notifier);

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["show first", "close first", "show second"]
        );
    }
}
