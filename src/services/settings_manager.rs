// SettingsManager Service
// Handles persistence of the theme collection and the selected theme

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::Settings;
use crate::services::{emit_event, EventSink, SETTINGS_CHANGED_EVENT};

const SETTINGS_FILE_NAME: &str = "settings.json";
const WATCH_DEBOUNCE: Duration = Duration::from_secs(1);

/// Errors that can occur while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write settings: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persisted key-value configuration shared by the settings screen
///
/// `set` replaces the whole settings value in one step and notifies observers.
pub trait ConfigStore: Send + Sync {
    fn get(&self) -> Result<Settings, SettingsError>;
    fn set(&self, settings: Settings) -> Result<(), SettingsError>;
    fn observe(&self, observer: Arc<dyn EventSink>);
}

/// Payload of the `settings_changed` event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsChanged {
    pub selected_theme: String,
    pub theme_count: usize,
    pub source: &'static str,
}

/// Manages settings.json storage and retrieval
pub struct SettingsManager {
    settings_path: PathBuf,
    cache: RwLock<Option<Settings>>,
    observers: RwLock<Vec<Arc<dyn EventSink>>>,
    last_local_write: RwLock<Option<Instant>>,
}

impl SettingsManager {
    /// Create a new SettingsManager with the given app data directory
    pub fn new(app_data_dir: &Path) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE_NAME),
            cache: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
            last_local_write: RwLock::new(None),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load(&self) -> Result<Settings, SettingsError> {
        // Check cache first
        if let Ok(cache) = self.cache.read() {
            if let Some(ref settings) = *cache {
                return Ok(settings.clone());
            }
        }

        let settings = if self.settings_path.exists() {
            let content =
                std::fs::read_to_string(&self.settings_path).map_err(SettingsError::Read)?;
            let mut user_value: Value = serde_json::from_str(&content)?;

            let defaults_value = serde_json::to_value(Settings::default())?;
            let mut changed = merge_missing_settings(&mut user_value, &defaults_value);

            let mut settings: Settings = serde_json::from_value(user_value)?;
            if settings.ensure_default_theme() {
                log::warn!("Built-in theme was missing from settings, restored it");
                changed = true;
            }

            if changed {
                self.save_internal(&settings)?;
            }

            settings
        } else {
            // Return defaults and save them
            let defaults = Settings::default();
            self.save_internal(&defaults)?;
            defaults
        };

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(settings.clone());
        }

        Ok(settings)
    }

    /// Save settings to disk and notify observers
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        self.save_internal(settings)?;

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(settings.clone());
        }

        self.notify_observers(settings, "local");
        Ok(())
    }

    /// Drop the cached copy so the next load reads from disk
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
    }

    /// Watch settings.json for edits made outside this process.
    ///
    /// External changes invalidate the cache and emit `settings_changed`, at most once per second.
    pub fn start_watcher(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        let watch_dir = match self.settings_path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => {
                log::warn!("Settings path has no parent directory, not watching for changes");
                return;
            }
        };

        thread::spawn(move || {
            let (tx, rx) = std::sync::mpsc::channel();
            let mut watcher = match notify::recommended_watcher(tx) {
                Ok(watcher) => watcher,
                Err(error) => {
                    log::warn!("Settings watcher failed to start: {error}");
                    return;
                }
            };

            if let Err(error) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
                log::warn!("Failed to watch settings directory: {error}");
                return;
            }

            let mut last_update: Option<Instant> = None;
            for event in rx {
                let event = match event {
                    Ok(event) => event,
                    Err(_) => continue,
                };

                let touches_settings = event
                    .paths
                    .iter()
                    .any(|path| path.file_name() == manager.settings_path.file_name());
                if !touches_settings || manager.recently_written() {
                    continue;
                }

                let now = Instant::now();
                if matches!(last_update, Some(last) if now.duration_since(last) < WATCH_DEBOUNCE) {
                    continue;
                }
                last_update = Some(now);

                log::info!("settings.json changed on disk, reloading");
                manager.invalidate();
                match manager.load() {
                    Ok(settings) => manager.notify_observers(&settings, "external"),
                    Err(e) => log::warn!("Failed to reload settings after external change: {e}"),
                }
            }
        });
    }

    fn recently_written(&self) -> bool {
        self.last_local_write
            .read()
            .ok()
            .and_then(|last| *last)
            .map(|last| last.elapsed() < WATCH_DEBOUNCE)
            .unwrap_or(false)
    }

    fn notify_observers(&self, settings: &Settings, source: &'static str) {
        let payload = SettingsChanged {
            selected_theme: settings.selected_theme.clone(),
            theme_count: settings.themes_presets.len(),
            source,
        };

        if let Ok(observers) = self.observers.read() {
            for observer in observers.iter() {
                emit_event(observer.as_ref(), SETTINGS_CHANGED_EVENT, &payload);
            }
        }
    }

    /// Internal save without cache update. Writes a temp file and renames it into place.
    fn save_internal(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent).map_err(SettingsError::Write)?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        let tmp = self.settings_path.with_extension("json.tmp");

        if let Ok(mut last) = self.last_local_write.write() {
            *last = Some(Instant::now());
        }

        std::fs::write(&tmp, content).map_err(SettingsError::Write)?;
        std::fs::rename(&tmp, &self.settings_path).map_err(SettingsError::Write)
    }
}

impl ConfigStore for SettingsManager {
    fn get(&self) -> Result<Settings, SettingsError> {
        self.load()
    }

    fn set(&self, settings: Settings) -> Result<(), SettingsError> {
        self.save(&settings)
    }

    fn observe(&self, observer: Arc<dyn EventSink>) {
        if let Ok(mut observers) = self.observers.write() {
            observers.push(observer);
        }
    }
}

fn merge_missing_settings(target: &mut Value, defaults: &Value) -> bool {
    match (target, defaults) {
        (Value::Object(target_map), Value::Object(defaults_map)) => {
            let mut changed = false;
            for (key, default_value) in defaults_map {
                match target_map.get_mut(key) {
                    Some(target_value) => {
                        if merge_missing_settings(target_value, default_value) {
                            changed = true;
                        }
                    }
                    None => {
                        target_map.insert(key.clone(), default_value.clone());
                        changed = true;
                    }
                }
            }
            changed
        }
        _ => false,
    }
}
