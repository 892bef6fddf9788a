// Theme Model
// Visual configuration bundle stored in settings and carried in theme archives

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id of the built-in theme. Always present, never deleted, never replaced by an import.
pub const DEFAULT_THEME_ID: &str = "default";

/// A light/dark pair of hex colors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    pub light: String,
    pub dark: String,
}

impl ColorScheme {
    pub fn new(light: &str, dark: &str) -> Self {
        Self {
            light: light.to_string(),
            dark: dark.to_string(),
        }
    }
}

/// A light/dark pair of asset file names in the theme asset directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePair {
    pub light: String,
    pub dark: String,
}

/// Background of a style group: either a flat color or a pair of images
///
/// Serialized externally tagged: `{"color": {...}}` or `{"img": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThemeBackground {
    Color(ColorScheme),
    Img(ImagePair),
}

impl ThemeBackground {
    /// Asset files this background needs on disk
    pub fn asset_file_names(&self) -> Vec<&str> {
        match self {
            ThemeBackground::Color(_) => Vec::new(),
            ThemeBackground::Img(pair) => vec![pair.light.as_str(), pair.dark.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontTheme {
    pub size: f64,
    pub bold: bool,
    pub color: ColorScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub author: String,
    pub icon: String,
    pub color: String,
}

/// App-wide chrome. Changing it requires an app restart to fully apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralTheme {
    pub accent_color: ColorScheme,
    pub modals_bg: ColorScheme,
    pub tab_bar_bg: ColorScheme,
    pub nav_panel_bg: ColorScheme,
}

impl Default for GeneralTheme {
    fn default() -> Self {
        Self {
            accent_color: ColorScheme::new("#0A84FF", "#0A84FF"),
            modals_bg: ColorScheme::new("#F2F2F7", "#1C1C1E"),
            tab_bar_bg: ColorScheme::new("#F9F9F9", "#121212"),
            nav_panel_bg: ColorScheme::new("#FFFFFF", "#000000"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostLinkTheme {
    pub bg: ThemeBackground,
    pub title_text: FontTheme,
    pub body_text: FontTheme,
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTheme {
    pub bg: ThemeBackground,
    pub title_text: FontTheme,
    pub body_text: FontTheme,
    pub comment_text: FontTheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsTheme {
    pub bg: ThemeBackground,
    pub foreground: ColorScheme,
    pub divider: ColorScheme,
}

/// A complete theme, as stored in settings and as `theme.json` inside an archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub metadata: ThemeMetadata,
    #[serde(default)]
    pub general: GeneralTheme,
    pub post_links: PostLinkTheme,
    pub posts: PostTheme,
    pub lists: ListsTheme,
}

impl Theme {
    /// The built-in theme every collection starts with
    pub fn builtin_default() -> Self {
        let primary_text = FontTheme {
            size: 16.0,
            bold: true,
            color: ColorScheme::new("#000000", "#FFFFFF"),
        };
        let secondary_text = FontTheme {
            size: 15.0,
            bold: false,
            color: ColorScheme::new("#3C3C43", "#EBEBF5"),
        };
        let page_bg = ThemeBackground::Color(ColorScheme::new("#F2F2F7", "#000000"));
        let card_bg = ThemeBackground::Color(ColorScheme::new("#FFFFFF", "#1C1C1E"));

        Self {
            id: DEFAULT_THEME_ID.to_string(),
            metadata: ThemeMetadata {
                name: "Default".to_string(),
                description: "The built-in theme".to_string(),
                author: "Built-in".to_string(),
                icon: "paintbrush.fill".to_string(),
                color: "#0A84FF".to_string(),
            },
            general: GeneralTheme::default(),
            post_links: PostLinkTheme {
                bg: card_bg.clone(),
                title_text: primary_text.clone(),
                body_text: secondary_text.clone(),
                corner_radius: 20.0,
            },
            posts: PostTheme {
                bg: card_bg,
                title_text: primary_text,
                body_text: secondary_text.clone(),
                comment_text: secondary_text,
            },
            lists: ListsTheme {
                bg: page_bg,
                foreground: ColorScheme::new("#FFFFFF", "#1C1C1E"),
                divider: ColorScheme::new("#C6C6C8", "#38383A"),
            },
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_THEME_ID
    }

    /// Deep copy under a freshly generated id
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4().to_string();
        copy
    }

    /// Backgrounds of the style groups that may reference image assets
    pub fn backgrounds(&self) -> [(&'static str, &ThemeBackground); 3] {
        [
            ("postLinks", &self.post_links.bg),
            ("posts", &self.posts.bg),
            ("lists", &self.lists.bg),
        ]
    }

    /// Every asset file referenced by an image background, in group order, without repeats
    pub fn asset_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (_, bg) in self.backgrounds() {
            for name in bg.asset_file_names() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    pub fn summary(&self, selected_id: &str) -> ThemeSummary {
        ThemeSummary {
            id: self.id.clone(),
            name: self.metadata.name.clone(),
            author: self.metadata.author.clone(),
            icon: self.metadata.icon.clone(),
            color: self.metadata.color.clone(),
            source: if self.is_default() { "builtin" } else { "custom" }.to_string(),
            selected: self.id == selected_id,
        }
    }
}

// Theme summary for display in UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub id: String,
    pub name: String,
    pub author: String,
    pub icon: String,
    pub color: String,
    pub source: String,
    pub selected: bool,
}
