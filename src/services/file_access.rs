// File access broker
// Scoped read permission on user-picked files

use std::fs::File;
use std::path::{Path, PathBuf};

/// Grants temporary read access to files chosen outside the app's own storage
pub trait AccessBroker: Send + Sync {
    /// Returns a grant when the file may be read, `None` otherwise.
    fn acquire(&self, path: &Path) -> Option<AccessGrant>;
}

/// Read access to one file. Access is released when the grant is dropped.
pub struct AccessGrant {
    path: PathBuf,
    release: Option<Box<dyn FnOnce(&Path) + Send>>,
}

impl AccessGrant {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            release: None,
        }
    }

    /// Grant that runs `release` when dropped
    #[cfg(test)]
    pub fn with_release(path: &Path, release: impl FnOnce(&Path) + Send + 'static) -> Self {
        Self {
            path: path.to_path_buf(),
            release: Some(Box::new(release)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AccessGrant {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(&self.path);
        }
        log::debug!("Released read access to {:?}", self.path);
    }
}

/// Grants access to any regular file the process can open for reading
pub struct FsAccessBroker;

impl AccessBroker for FsAccessBroker {
    fn acquire(&self, path: &Path) -> Option<AccessGrant> {
        if !path.is_file() {
            log::debug!("Access refused for {:?}: not a regular file", path);
            return None;
        }
        match File::open(path) {
            Ok(_) => Some(AccessGrant::new(path)),
            Err(e) => {
                log::debug!("Access refused for {:?}: {e}", path);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_fs_broker_grants_readable_files() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("bundle.zip");
        std::fs::write(&file, b"zip").unwrap();

        let grant = FsAccessBroker.acquire(&file).unwrap();
        assert_eq!(grant.path(), file.as_path());
    }

    #[test]
    fn test_fs_broker_refuses_missing_and_directories() {
        let temp = tempdir().unwrap();
        assert!(FsAccessBroker.acquire(&temp.path().join("missing.zip")).is_none());
        assert!(FsAccessBroker.acquire(temp.path()).is_none());
    }

    #[test]
    fn test_grant_releases_on_drop() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let grant = AccessGrant::with_release(Path::new("bundle.zip"), move |_| {
            flag.store(true, Ordering::SeqCst);
        });

        assert!(!released.load(Ordering::SeqCst));
        drop(grant);
        assert!(released.load(Ordering::SeqCst));
    }
}
