// Settings Model
// Persisted theme collection and selection

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{Theme, DEFAULT_THEME_ID};

fn default_themes_presets() -> Vec<Theme> {
    vec![Theme::builtin_default()]
}

fn default_selected_theme() -> String {
    DEFAULT_THEME_ID.to_string()
}

/// Settings owned by the settings subsystem
///
/// Keys this crate does not interpret are kept in `other` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_themes_presets")]
    pub themes_presets: Vec<Theme>,

    #[serde(default = "default_selected_theme")]
    pub selected_theme: String,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            themes_presets: default_themes_presets(),
            selected_theme: default_selected_theme(),
            other: Map::new(),
        }
    }
}

impl Settings {
    /// Re-insert the built-in theme at the front if it went missing.
    /// Returns true when the settings were changed.
    pub fn ensure_default_theme(&mut self) -> bool {
        if self.themes_presets.iter().any(Theme::is_default) {
            return false;
        }
        self.themes_presets.insert(0, Theme::builtin_default());
        true
    }

    pub fn find_theme(&self, id: &str) -> Option<&Theme> {
        self.themes_presets.iter().find(|theme| theme.id == id)
    }
}
