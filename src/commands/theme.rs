// Theme Commands
// Handlers the settings screen calls for theme management

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::models::{Theme, ThemeSummary};
use crate::services::{
    AccessBroker, AssetStore, ConfigStore, EventSink, SelectOutcome, SettingsManager,
    ThemeCollection, ThemeExporter, ThemeImporter,
};

/// Shared state behind the theme commands
pub struct ThemeState {
    pub settings: Arc<SettingsManager>,
    pub collection: Arc<ThemeCollection>,
    pub importer: Arc<ThemeImporter>,
    pub exporter: Arc<ThemeExporter>,
    pub assets: AssetStore,
    /// Only one import or export runs at a time
    transfer: AsyncMutex<()>,
}

impl ThemeState {
    pub fn new(app_data_dir: &Path, broker: Arc<dyn AccessBroker>) -> Self {
        let settings = Arc::new(SettingsManager::new(app_data_dir));
        let assets = AssetStore::new(app_data_dir);
        let store: Arc<dyn ConfigStore> = settings.clone();

        Self {
            collection: Arc::new(ThemeCollection::new(store)),
            importer: Arc::new(ThemeImporter::new(assets.clone(), broker)),
            exporter: Arc::new(ThemeExporter::new(assets.clone())),
            settings,
            assets,
            transfer: AsyncMutex::new(()),
        }
    }

    /// Register an observer for `settings_changed` events
    pub fn observe(&self, observer: Arc<dyn EventSink>) {
        self.settings.observe(observer);
    }
}

pub fn list_themes(state: &ThemeState) -> Result<Vec<ThemeSummary>, String> {
    state.collection.list().map_err(|e| e.to_string())
}

pub fn get_active_theme(state: &ThemeState) -> Result<Theme, String> {
    state.collection.active().map_err(|e| e.to_string())
}

/// Import a theme archive picked by the user.
///
/// Unpacking runs on the blocking pool; the collection append happens back on
/// the calling task. Returns `Ok(None)` when read access to the file was not granted.
pub async fn import_theme(
    state: &ThemeState,
    archive_path: PathBuf,
) -> Result<Option<ThemeSummary>, String> {
    let _transfer = state.transfer.lock().await;

    let importer = Arc::clone(&state.importer);
    let installed = tokio::task::spawn_blocking(move || importer.install(&archive_path))
        .await
        .map_err(|e| format!("Theme import task failed: {e}"))?;

    let theme = match installed {
        Ok(theme) => theme,
        Err(e) if e.is_silent() => {
            log::info!("Theme import skipped: {e}");
            return Ok(None);
        }
        Err(e) => {
            log::error!("Theme import failed: {e}");
            return Err(e.to_string());
        }
    };

    let summary = theme.summary("");
    state.collection.append(theme).map_err(|e| {
        log::error!("Theme import failed: {e}");
        e.to_string()
    })?;

    Ok(Some(summary))
}

/// Export the theme with the given id to a temporary archive and return its path
pub async fn export_theme(state: &ThemeState, theme_id: String) -> Result<PathBuf, String> {
    let _transfer = state.transfer.lock().await;

    let theme = state.collection.get(&theme_id).map_err(|e| e.to_string())?;
    let asset_file_names = theme.asset_file_names();

    let exporter = Arc::clone(&state.exporter);
    tokio::task::spawn_blocking(move || exporter.export_theme(&theme, &asset_file_names))
        .await
        .map_err(|e| format!("Theme export task failed: {e}"))?
        .map_err(|e| {
            log::error!("Theme export failed: {e}");
            e.to_string()
        })
}

pub fn duplicate_theme(state: &ThemeState, theme_id: &str) -> Result<ThemeSummary, String> {
    state
        .collection
        .duplicate(theme_id)
        .map(|theme| theme.summary(""))
        .map_err(|e| e.to_string())
}

pub fn create_theme(state: &ThemeState) -> Result<ThemeSummary, String> {
    state
        .collection
        .create_from_default()
        .map(|theme| theme.summary(""))
        .map_err(|e| e.to_string())
}

pub fn delete_theme(state: &ThemeState, theme_id: &str) -> Result<(), String> {
    state
        .collection
        .delete(theme_id)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

pub fn select_theme(state: &ThemeState, theme_id: &str) -> Result<SelectOutcome, String> {
    state.collection.select(theme_id).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImagePair, ThemeBackground, DEFAULT_THEME_ID};
    use crate::services::{
        AccessGrant, FsAccessBroker, RecordingEventSink, MANIFEST_FILE_NAME,
        SETTINGS_CHANGED_EVENT,
    };
    use std::fs;
    use tempfile::tempdir;

    struct DenyAll;

    impl AccessBroker for DenyAll {
        fn acquire(&self, _path: &Path) -> Option<AccessGrant> {
            None
        }
    }

    fn image_theme(state: &ThemeState) -> Theme {
        fs::write(state.assets.dir().join("links-light.jpg"), b"light").unwrap();
        fs::write(state.assets.dir().join("links-dark.jpg"), b"dark").unwrap();
        let mut theme = Theme::builtin_default().duplicate();
        theme.metadata.name = "Link Wall".to_string();
        theme.post_links.bg = ThemeBackground::Img(ImagePair {
            light: "links-light.jpg".to_string(),
            dark: "links-dark.jpg".to_string(),
        });
        theme
    }

    #[tokio::test]
    async fn test_export_then_import_into_another_install() {
        let source_dir = tempdir().unwrap();
        let source = ThemeState::new(source_dir.path(), Arc::new(FsAccessBroker));
        let theme = image_theme(&source);
        source.collection.append(theme.clone()).unwrap();

        let archive = export_theme(&source, theme.id.clone()).await.unwrap();
        assert!(archive.exists());

        let target_dir = tempdir().unwrap();
        let target = ThemeState::new(target_dir.path(), Arc::new(FsAccessBroker));
        let sink = Arc::new(RecordingEventSink::new());
        target.observe(sink.clone());

        let summary = import_theme(&target, archive.clone()).await.unwrap().unwrap();

        assert_eq!(summary.name, "Link Wall");
        assert_eq!(list_themes(&target).unwrap().len(), 2);
        assert_eq!(
            target.assets.list(),
            vec!["links-dark.jpg".to_string(), "links-light.jpg".to_string()]
        );
        assert!(sink
            .events()
            .iter()
            .any(|(event, _)| event == SETTINGS_CHANGED_EVENT));

        fs::remove_dir_all(archive.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_import_without_access_is_silent() {
        let temp = tempdir().unwrap();
        let state = ThemeState::new(temp.path(), Arc::new(DenyAll));

        let result = import_theme(&state, temp.path().join("picked.zip")).await;

        assert_eq!(result, Ok(None));
        assert_eq!(list_themes(&state).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_invalid_archive_reports_error() {
        let temp = tempdir().unwrap();
        let state = ThemeState::new(temp.path(), Arc::new(FsAccessBroker));
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"broken").unwrap();

        let err = import_theme(&state, archive).await.unwrap_err();

        assert!(err.contains("unpack"));
        assert_eq!(list_themes(&state).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_unknown_theme() {
        let temp = tempdir().unwrap();
        let state = ThemeState::new(temp.path(), Arc::new(FsAccessBroker));

        let err = export_theme(&state, "missing".to_string()).await.unwrap_err();
        assert!(err.contains("not found"));
    }

    #[tokio::test]
    async fn test_export_of_builtin_contains_manifest_only() {
        let temp = tempdir().unwrap();
        let state = ThemeState::new(temp.path(), Arc::new(FsAccessBroker));

        let archive = export_theme(&state, DEFAULT_THEME_ID.to_string()).await.unwrap();
        let file = fs::File::open(&archive).unwrap();
        let zip = zip::ZipArchive::new(file).unwrap();

        assert_eq!(zip.file_names().collect::<Vec<_>>(), vec![MANIFEST_FILE_NAME]);
        fs::remove_dir_all(archive.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_collection_commands() {
        let temp = tempdir().unwrap();
        let state = ThemeState::new(temp.path(), Arc::new(FsAccessBroker));

        let created = create_theme(&state).unwrap();
        let copy = duplicate_theme(&state, &created.id).unwrap();
        assert_ne!(copy.id, created.id);

        let outcome = select_theme(&state, &copy.id).unwrap();
        assert!(!outcome.restart_required);
        assert_eq!(get_active_theme(&state).unwrap().id, copy.id);

        assert!(delete_theme(&state, DEFAULT_THEME_ID).is_err());
        delete_theme(&state, &copy.id).unwrap();
        assert_eq!(get_active_theme(&state).unwrap().id, DEFAULT_THEME_ID);
        assert_eq!(list_themes(&state).unwrap().len(), 2);
    }
}
