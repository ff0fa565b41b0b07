//! Deterministic simulation harness for the gesture controller.
//!
//! Wires a [`SmartSaver`] to virtual timers, in-memory settings and
//! recording collaborators so a press sequence can be replayed to the
//! millisecond. Used by the test suite and by `smartsaver simulate`.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::controller::{Collaborators, GestureState, SmartSaver};
use crate::desktop::{LockActuator, Notifier, SoundPlayer};
use crate::error::ConfigError;
use crate::events::Event;
use crate::settings::{MemorySettings, SettingKey, Settings};
use crate::timer::VirtualTimers;

/// A notifier call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Notice {
    Shown(String),
    Cleared,
}

/// An actuator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actuation {
    SetActive,
    Lock,
}

/// Everything the recording collaborators were asked to do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationLog {
    pub notices: Vec<Notice>,
    pub actuations: Vec<Actuation>,
    pub sounds: Vec<PathBuf>,
}

/// Notifier, actuator and sound player that only record calls.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<SimulationLog>>,
}

impl Recorder {
    pub fn log(&self) -> Ref<'_, SimulationLog> {
        self.log.borrow()
    }
}

impl Notifier for Recorder {
    fn show(&mut self, text: &str) {
        self.log.borrow_mut().notices.push(Notice::Shown(text.to_string()));
    }

    fn clear(&mut self) {
        self.log.borrow_mut().notices.push(Notice::Cleared);
    }
}

impl LockActuator for Recorder {
    fn set_active(&self) {
        self.log.borrow_mut().actuations.push(Actuation::SetActive);
    }

    fn lock(&self) {
        self.log.borrow_mut().actuations.push(Actuation::Lock);
    }
}

impl SoundPlayer for Recorder {
    fn play_from_file(&self, path: &Path) {
        self.log.borrow_mut().sounds.push(path.to_path_buf());
    }
}

/// An event with the virtual time it happened at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    pub t_ms: u64,
    pub event: Event,
}

/// A controller running on virtual time.
pub struct Simulation {
    saver: SmartSaver,
    timers: VirtualTimers,
    settings: MemorySettings,
    recorder: Recorder,
    changes: Arc<Mutex<VecDeque<SettingKey>>>,
    events: Vec<TimedEvent>,
}

impl Simulation {
    pub fn new(settings: Settings) -> Self {
        let timers = VirtualTimers::new();
        let store = MemorySettings::new(settings);
        let recorder = Recorder::default();
        let changes = Arc::new(Mutex::new(VecDeque::new()));

        let queue = Arc::clone(&changes);
        let saver = SmartSaver::new(
            Collaborators {
                settings: Box::new(store.clone()),
                timers: Box::new(timers.clone()),
                notifier: Box::new(recorder.clone()),
                actuator: Box::new(recorder.clone()),
                sound: Box::new(recorder.clone()),
            },
            Box::new(move |key| {
                queue
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push_back(key)
            }),
        );

        Self {
            saver,
            timers,
            settings: store,
            recorder,
            changes,
            events: Vec::new(),
        }
    }

    /// Run timers up to `at_ms`, then press the primary button.
    pub fn press_at(&mut self, at_ms: u64) {
        self.run_until(at_ms);
        let event = self.saver.on_primary_press();
        self.record(at_ms.max(self.timers.now_ms()), event);
    }

    /// Fire every timer due at or before `until_ms`, in deadline order.
    pub fn run_until(&mut self, until_ms: u64) {
        loop {
            self.flush_changes();
            match self.timers.pop_due(until_ms) {
                Some((deadline, handle)) => {
                    let event = self.saver.on_timer_fired(handle);
                    self.record(deadline, event);
                }
                None => break,
            }
        }
        self.timers.set_now(until_ms);
    }

    /// Change a setting and deliver the change notification.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.settings.set(key, value)?;
        self.flush_changes();
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.saver.teardown();
    }

    fn flush_changes(&mut self) {
        loop {
            let next = self
                .changes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front();
            let Some(key) = next else { break };
            let event = self.saver.on_settings_changed(key);
            self.record(self.timers.now_ms(), event);
        }
    }

    fn record(&mut self, t_ms: u64, event: Option<Event>) {
        if let Some(event) = event {
            self.events.push(TimedEvent { t_ms, event });
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn saver(&self) -> &SmartSaver {
        &self.saver
    }

    pub fn saver_mut(&mut self) -> &mut SmartSaver {
        &mut self.saver
    }

    pub fn state(&self) -> GestureState {
        self.saver.state()
    }

    pub fn timers(&self) -> &VirtualTimers {
        &self.timers
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn log(&self) -> Ref<'_, SimulationLog> {
        self.recorder.log()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }
}
