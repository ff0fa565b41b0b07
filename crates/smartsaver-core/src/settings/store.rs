//! Settings stores: get/subscribe access to [`Settings`].
//!
//! The controller only pulls values and subscribes to change notifications.
//! [`MemorySettings`] keeps everything in process; [`FileSettings`] is backed
//! by the TOML file and reloads it when it changes on disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use super::{SettingKey, Settings, SoundSelection};
use crate::error::{ConfigError, Result};

/// Callback invoked once per changed key.
pub type ChangeListener = Box<dyn Fn(SettingKey) + Send + Sync>;

/// Identifies a subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Pull + subscribe access to the settings.
pub trait SettingsStore {
    /// Current values.
    fn snapshot(&self) -> Settings;

    /// Register a change listener.
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    fn get_uint(&self, key: SettingKey) -> u32 {
        self.snapshot().uint(key).unwrap_or_else(|| {
            warn!(%key, "not a numeric setting");
            0
        })
    }

    fn get_bool(&self, key: SettingKey) -> bool {
        self.snapshot().boolean(key).unwrap_or_else(|| {
            warn!(%key, "not a boolean setting");
            false
        })
    }

    /// The structured `sound-file-map` value.
    fn get_sound(&self) -> SoundSelection {
        self.snapshot().sound_file_map
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, ChangeListener)>>,
}

impl Listeners {
    fn add(&self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.entries).push((id, listener));
        id
    }

    fn remove(&self, id: SubscriptionId) {
        lock(&self.entries).retain(|(entry, _)| *entry != id);
    }

    fn emit(&self, keys: &[SettingKey]) {
        let entries = lock(&self.entries);
        for key in keys {
            for (_, listener) in entries.iter() {
                listener(*key);
            }
        }
    }

    fn len(&self) -> usize {
        lock(&self.entries).len()
    }
}

/// Replace `current` with `next` and notify listeners about changed keys.
fn apply(current: &Mutex<Settings>, listeners: &Listeners, next: Settings) -> Vec<SettingKey> {
    let changed = {
        let mut guard = lock(current);
        let changed = guard.changed_keys(&next);
        *guard = next;
        changed
    };
    if !changed.is_empty() {
        debug!(?changed, "settings changed");
        listeners.emit(&changed);
    }
    changed
}

/// In-process settings store. Clones share the same values and listeners.
#[derive(Clone, Default)]
pub struct MemorySettings {
    current: Arc<Mutex<Settings>>,
    listeners: Arc<Listeners>,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            current: Arc::new(Mutex::new(settings)),
            listeners: Arc::default(),
        }
    }

    /// Set `key` (dot-path) to `value`, notifying listeners if it changed.
    pub fn set(&self, key: &str, value: &str) -> Result<Vec<SettingKey>, ConfigError> {
        let next = lock(&self.current).with(key, value)?;
        Ok(apply(&self.current, &self.listeners, next))
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl SettingsStore for MemorySettings {
    fn snapshot(&self) -> Settings {
        lock(&self.current).clone()
    }

    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}

/// Settings backed by the TOML file.
///
/// Call [`FileSettings::watch`] to reload automatically when the file is
/// written; a file that no longer parses or validates is logged and the
/// previous values stay in effect.
pub struct FileSettings {
    path: PathBuf,
    current: Arc<Mutex<Settings>>,
    listeners: Arc<Listeners>,
    watcher: Option<RecommendedWatcher>,
}

impl FileSettings {
    /// Load from `path`, writing defaults if the file is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let settings = Settings::load_from(&path)?;
        Ok(Self {
            path,
            current: Arc::new(Mutex::new(settings)),
            listeners: Arc::default(),
            watcher: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and notify listeners about changed keys.
    pub fn reload(&self) -> Result<Vec<SettingKey>, ConfigError> {
        reload_from(&self.path, &self.current, &self.listeners)
    }

    /// Start watching the file's directory for writes to the file.
    pub fn watch(&mut self) -> Result<()> {
        let path = self.path.clone();
        let current = Arc::clone(&self.current);
        let listeners = Arc::clone(&self.listeners);
        let file_name = path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("settings watcher error: {e}");
                    return;
                }
            };
            let touches_file = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if !touches_file {
                return;
            }
            use notify::EventKind;
            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) => {
                    if let Err(e) = reload_from(&path, &current, &listeners) {
                        warn!("keeping previous settings: {e}");
                    }
                }
                _ => {}
            }
        })?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!(path = %self.path.display(), "watching settings file");
        self.watcher = Some(watcher);
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}

fn reload_from(
    path: &Path,
    current: &Mutex<Settings>,
    listeners: &Listeners,
) -> Result<Vec<SettingKey>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    // Seen mid-write from editors that truncate before writing.
    if content.trim().is_empty() {
        return Err(ConfigError::ParseFailed(format!(
            "{} is empty",
            path.display()
        )));
    }
    let next = Settings::parse(&content)?;
    Ok(apply(current, listeners, next))
}

impl SettingsStore for FileSettings {
    fn snapshot(&self) -> Settings {
        lock(&self.current).clone()
    }

    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}
