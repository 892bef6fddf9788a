// AssetStore Service
// Flat directory holding the image assets referenced by installed themes

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::services::validate_asset_name;

/// Persistent asset directory. One file per asset name; a new file replaces an old one.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    /// Create an AssetStore under the given app data directory
    pub fn new(app_data_dir: &Path) -> Self {
        let dir = app_data_dir.join("theme-assets");
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("Failed to create theme asset directory {:?}: {e}", dir);
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an asset lives at, after checking the name stays inside the directory
    pub fn path_for(&self, name: &str) -> Result<PathBuf, String> {
        validate_asset_name(name)?;
        Ok(self.dir.join(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).map(|path| path.is_file()).unwrap_or(false)
    }

    /// Asset names currently stored, sorted
    pub fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Move `source` into the store as `name`.
    ///
    /// An existing asset with the same name is deleted first. When a plain rename
    /// is not possible (e.g. the source is on another filesystem) the file is
    /// copied and the source removed.
    pub fn relocate(&self, source: &Path, name: &str) -> io::Result<PathBuf> {
        let dest = self
            .path_for(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        fs::create_dir_all(&self.dir)?;

        if dest.exists() {
            log::debug!("Replacing existing theme asset {name:?}");
            fs::remove_file(&dest)?;
        }

        if let Err(rename_err) = fs::rename(source, &dest) {
            log::debug!("Rename of {:?} failed ({rename_err}), falling back to copy", source);
            fs::copy(source, &dest)?;
            fs::remove_file(source)?;
        }

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_creates_directory() {
        let temp = tempdir().unwrap();
        let store = AssetStore::new(temp.path());
        assert!(store.dir().is_dir());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_relocate_moves_file() {
        let temp = tempdir().unwrap();
        let store = AssetStore::new(temp.path());
        let source = temp.path().join("incoming.png");
        fs::write(&source, b"new").unwrap();

        let dest = store.relocate(&source, "bg.png").unwrap();

        assert_eq!(dest, store.dir().join("bg.png"));
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"new");
        assert!(store.contains("bg.png"));
    }

    #[test]
    fn test_relocate_overwrites_existing_asset() {
        let temp = tempdir().unwrap();
        let store = AssetStore::new(temp.path());
        fs::write(store.dir().join("bg.png"), b"old").unwrap();
        let source = temp.path().join("bg.png");
        fs::write(&source, b"new").unwrap();

        store.relocate(&source, "bg.png").unwrap();

        assert_eq!(store.list(), vec!["bg.png".to_string()]);
        assert_eq!(fs::read(store.dir().join("bg.png")).unwrap(), b"new");
    }

    #[test]
    fn test_relocate_rejects_traversal_names() {
        let temp = tempdir().unwrap();
        let store = AssetStore::new(temp.path());
        let source = temp.path().join("x.png");
        fs::write(&source, b"x").unwrap();

        let err = store.relocate(&source, "../x.png").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(source.exists());
    }

    #[test]
    fn test_relocate_missing_source_fails() {
        let temp = tempdir().unwrap();
        let store = AssetStore::new(temp.path());
        let result = store.relocate(&temp.path().join("missing.png"), "missing.png");
        assert!(result.is_err());
        assert!(!store.contains("missing.png"));
    }
}
