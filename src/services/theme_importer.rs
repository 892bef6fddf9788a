// ThemeImporter Service
// Installs a theme archive: unpack, validate manifest, move assets, append theme

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Theme, DEFAULT_THEME_ID};
use crate::services::theme_archive::{self, ArchiveError, MANIFEST_FILE_NAME};
use crate::services::{validate_asset_name, AccessBroker, AssetStore, CollectionError, ThemeCollection};

/// Errors that can occur during theme import
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Read access to {0:?} was not granted")]
    AccessDenied(PathBuf),

    #[error("Failed to unpack theme archive: {0}")]
    UnzipFailed(#[source] ArchiveError),

    #[error("Invalid theme manifest: {0}")]
    InvalidManifest(String),

    #[error("Failed to install theme asset '{name}': {source}")]
    AssetRelocationFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to add theme to collection: {0}")]
    CollectionUpdateFailed(#[from] CollectionError),
}

impl ImportError {
    /// Errors the settings screen should not surface to the user
    pub fn is_silent(&self) -> bool {
        matches!(self, ImportError::AccessDenied(_))
    }
}

/// Theme Importer Service
pub struct ThemeImporter {
    assets: AssetStore,
    broker: Arc<dyn AccessBroker>,
}

impl ThemeImporter {
    pub fn new(assets: AssetStore, broker: Arc<dyn AccessBroker>) -> Self {
        Self { assets, broker }
    }

    /// Import an archive and append its theme to `collection`.
    pub fn import_theme(
        &self,
        archive_path: &Path,
        collection: &ThemeCollection,
    ) -> Result<Theme, ImportError> {
        let theme = self.install(archive_path)?;
        collection.append(theme.clone())?;
        Ok(theme)
    }

    /// Everything up to, but not including, the collection append.
    ///
    /// On success the theme's assets are in the asset store and the returned
    /// theme is ready to append. Nothing is installed unless the manifest is valid.
    /// If moving an asset fails, assets moved before it stay installed.
    pub fn install(&self, archive_path: &Path) -> Result<Theme, ImportError> {
        let _grant = self
            .broker
            .acquire(archive_path)
            .ok_or_else(|| ImportError::AccessDenied(archive_path.to_path_buf()))?;

        log::info!("Importing theme archive {:?}", archive_path);

        let workdir = tempfile::Builder::new()
            .prefix("theme-import-")
            .tempdir()
            .map_err(|e| ImportError::UnzipFailed(ArchiveError::Io(e)))?;
        let files = theme_archive::unzip(archive_path, workdir.path())
            .map_err(ImportError::UnzipFailed)?;

        let manifest_path = workdir.path().join(MANIFEST_FILE_NAME);
        let mut theme = read_manifest(&manifest_path)?;

        if theme.id.trim().is_empty() || theme.id == DEFAULT_THEME_ID {
            let fresh = Uuid::new_v4().to_string();
            log::info!("Imported theme uses reserved id '{}', assigning '{fresh}'", theme.id);
            theme.id = fresh;
        }

        let assets: Vec<(&PathBuf, String)> = files
            .iter()
            .filter(|path| *path != &manifest_path)
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_string();
                Some((path, name))
            })
            .collect();

        for referenced in theme.asset_file_names() {
            if !assets.iter().any(|(_, name)| *name == referenced) {
                log::warn!(
                    "Theme '{}' references asset '{referenced}' that is not in the archive",
                    theme.metadata.name
                );
            }
        }

        let mut installed: Vec<&str> = Vec::with_capacity(assets.len());
        for (path, name) in &assets {
            if let Err(source) = self.assets.relocate(path, name) {
                if !installed.is_empty() {
                    log::warn!(
                        "Theme import stopped after installing assets {:?}; they were left in place",
                        installed
                    );
                }
                return Err(ImportError::AssetRelocationFailed {
                    name: name.clone(),
                    source,
                });
            }
            installed.push(name);
        }

        log::info!(
            "Theme '{}' ({}) unpacked with {} asset(s)",
            theme.metadata.name,
            theme.id,
            installed.len()
        );
        Ok(theme)
    }
}

fn read_manifest(path: &Path) -> Result<Theme, ImportError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ImportError::InvalidManifest(format!("{MANIFEST_FILE_NAME} not readable: {e}")))?;
    let theme: Theme = serde_json::from_str(&content)
        .map_err(|e| ImportError::InvalidManifest(format!("Invalid theme JSON: {e}")))?;
    validate_manifest(&theme)?;
    Ok(theme)
}

fn validate_manifest(theme: &Theme) -> Result<(), ImportError> {
    if theme.metadata.name.trim().is_empty() {
        return Err(ImportError::InvalidManifest("Theme name is required".to_string()));
    }

    for name in theme.asset_file_names() {
        validate_asset_name(&name).map_err(ImportError::InvalidManifest)?;
        if name == MANIFEST_FILE_NAME {
            return Err(ImportError::InvalidManifest(format!(
                "Asset name '{MANIFEST_FILE_NAME}' is reserved for the manifest"
            )));
        }
    }

    Ok(())
}
