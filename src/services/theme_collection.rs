// ThemeCollection Service
// Ordered list of theme presets kept in the settings store

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;

use crate::models::{Settings, Theme, ThemeSummary, DEFAULT_THEME_ID};
use crate::services::{ConfigStore, SettingsError};

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("The built-in theme cannot be deleted")]
    ReservedTheme,

    #[error("Theme '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Result of changing the selected theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOutcome {
    pub previous: String,
    pub selected: String,
    /// The `general` group changed, which only fully applies after an app restart
    pub restart_required: bool,
}

/// Theme presets stored in settings.
///
/// Every write is a single `ConfigStore::set` of the whole settings value, and
/// writes are serialized so concurrent updates cannot drop each other.
pub struct ThemeCollection {
    store: Arc<dyn ConfigStore>,
    write_lock: Mutex<()>,
}

impl ThemeCollection {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn themes(&self) -> Result<Vec<Theme>, CollectionError> {
        Ok(self.store.get()?.themes_presets)
    }

    pub fn list(&self) -> Result<Vec<ThemeSummary>, CollectionError> {
        let settings = self.store.get()?;
        Ok(settings
            .themes_presets
            .iter()
            .map(|theme| theme.summary(&settings.selected_theme))
            .collect())
    }

    /// First theme with the given id
    pub fn get(&self, id: &str) -> Result<Theme, CollectionError> {
        self.store
            .get()?
            .find_theme(id)
            .cloned()
            .ok_or_else(|| CollectionError::NotFound(id.to_string()))
    }

    /// The selected theme, or the built-in one if the selection no longer exists
    pub fn active(&self) -> Result<Theme, CollectionError> {
        let settings = self.store.get()?;
        Ok(active_theme(&settings))
    }

    /// Append a theme, even when another theme already uses its id
    pub fn append(&self, theme: Theme) -> Result<(), CollectionError> {
        self.update(|settings| {
            log::info!(
                "Adding theme '{}' ({}) to collection",
                theme.metadata.name,
                theme.id
            );
            settings.themes_presets.push(theme);
            Ok(())
        })
    }

    /// Duplicate the theme with the given id and append the copy
    pub fn duplicate(&self, id: &str) -> Result<Theme, CollectionError> {
        let copy = self.get(id)?.duplicate();
        self.append(copy.clone())?;
        Ok(copy)
    }

    /// Start a new theme from the built-in one
    pub fn create_from_default(&self) -> Result<Theme, CollectionError> {
        let mut theme = Theme::builtin_default().duplicate();
        theme.metadata.name = "Untitled Theme".to_string();
        theme.metadata.author = String::new();
        self.append(theme.clone())?;
        Ok(theme)
    }

    /// Remove every theme with the given id. Returns how many were removed.
    ///
    /// Deleting the selected theme moves the selection back to the built-in theme.
    pub fn delete(&self, id: &str) -> Result<usize, CollectionError> {
        if id == DEFAULT_THEME_ID {
            log::warn!("Refusing to delete the built-in theme");
            return Err(CollectionError::ReservedTheme);
        }

        self.update(|settings| {
            let before = settings.themes_presets.len();
            settings.themes_presets.retain(|theme| theme.id != id);
            let removed = before - settings.themes_presets.len();
            if removed == 0 {
                return Err(CollectionError::NotFound(id.to_string()));
            }

            if settings.selected_theme == id {
                settings.selected_theme = DEFAULT_THEME_ID.to_string();
            }
            log::info!("Deleted {removed} theme(s) with id '{id}'");
            Ok(removed)
        })
    }

    /// Make the theme with the given id the active one
    pub fn select(&self, id: &str) -> Result<SelectOutcome, CollectionError> {
        self.update(|settings| {
            let next = settings
                .find_theme(id)
                .cloned()
                .ok_or_else(|| CollectionError::NotFound(id.to_string()))?;
            let previous = active_theme(settings);

            let outcome = SelectOutcome {
                previous: settings.selected_theme.clone(),
                selected: next.id.clone(),
                restart_required: previous.general != next.general,
            };
            settings.selected_theme = next.id;

            if outcome.restart_required {
                log::info!("Theme '{id}' changes general settings, restart required");
            }
            Ok(outcome)
        })
    }

    fn update<T>(
        &self,
        apply: impl FnOnce(&mut Settings) -> Result<T, CollectionError>,
    ) -> Result<T, CollectionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut settings = self.store.get()?;
        let result = apply(&mut settings)?;
        self.store.set(settings)?;
        Ok(result)
    }
}

fn active_theme(settings: &Settings) -> Theme {
    settings
        .find_theme(&settings.selected_theme)
        .or_else(|| settings.find_theme(DEFAULT_THEME_ID))
        .cloned()
        .unwrap_or_else(Theme::builtin_default)
}
