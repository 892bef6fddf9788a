// ThemeExporter Service
// Packages a theme and its assets into a portable archive

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Theme;
use crate::services::theme_archive::{self, ArchiveEntry, ArchiveError, MANIFEST_FILE_NAME};
use crate::services::{sanitize_filename, AssetStore};

/// Errors that can occur during theme export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to package theme: {0}")]
    PackagingFailed(#[from] ArchiveError),
}

/// Theme Exporter Service
pub struct ThemeExporter {
    assets: AssetStore,
}

impl ThemeExporter {
    pub fn new(assets: AssetStore) -> Self {
        Self { assets }
    }

    /// Write `theme` and the named assets to a new archive in a fresh temporary directory.
    ///
    /// The manifest is written from a duplicate of the theme. Moving the archive
    /// somewhere permanent is up to the caller; on failure nothing is left behind.
    pub fn export_theme(
        &self,
        theme: &Theme,
        asset_file_names: &[String],
    ) -> Result<PathBuf, ExportError> {
        let manifest = serde_json::to_vec_pretty(&theme.duplicate()).map_err(ArchiveError::from)?;

        let mut asset_paths = Vec::with_capacity(asset_file_names.len());
        for name in asset_file_names {
            if name == MANIFEST_FILE_NAME {
                return Err(ArchiveError::InvalidAssetName(name.clone()).into());
            }
            let path = self
                .assets
                .path_for(name)
                .map_err(ArchiveError::InvalidAssetName)?;
            if !path.is_file() {
                return Err(ArchiveError::MissingAsset(name.clone()).into());
            }
            asset_paths.push((name.as_str(), path));
        }

        let staging = tempfile::Builder::new()
            .prefix("theme-export-")
            .tempdir()
            .map_err(ArchiveError::from)?;
        let archive_name = format!("{}.zip", sanitize_filename(&theme.metadata.name));
        let archive_path = staging.path().join(archive_name);

        let mut entries = Vec::with_capacity(asset_paths.len() + 1);
        entries.push(ArchiveEntry::Bytes {
            name: MANIFEST_FILE_NAME,
            data: &manifest,
        });
        for (name, path) in &asset_paths {
            entries.push(ArchiveEntry::File { name, path });
        }

        theme_archive::zip(&archive_path, &entries)?;

        // The caller owns the staging directory from here on
        let _ = staging.into_path();
        log::info!(
            "Exported theme '{}' with {} asset(s) to {:?}",
            theme.metadata.name,
            asset_paths.len(),
            archive_path
        );
        Ok(archive_path)
    }
}
