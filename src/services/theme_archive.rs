// Theme Archive Service
// Zip packing and unpacking for theme bundles

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the manifest inside every theme archive
pub const MANIFEST_FILE_NAME: &str = "theme.json";

/// Archive entries produced by archivers that carry no theme content
const IGNORED_PREFIXES: [&str; 1] = ["__MACOSX/"];
const IGNORED_FILE_NAMES: [&str; 2] = [".DS_Store", "Thumbs.db"];

/// Errors that can occur while reading or writing a theme archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Archive entry '{0}' escapes the extraction directory")]
    UnsafeEntry(String),

    #[error("Invalid asset name: {0}")]
    InvalidAssetName(String),

    #[error("Asset '{0}' not found in theme asset storage")]
    MissingAsset(String),
}

/// One file to be written into an archive
pub enum ArchiveEntry<'a> {
    /// In-memory content, e.g. the serialized manifest
    Bytes { name: &'a str, data: &'a [u8] },
    /// Content copied from a file on disk
    File { name: &'a str, path: &'a Path },
}

impl ArchiveEntry<'_> {
    fn name(&self) -> &str {
        match self {
            ArchiveEntry::Bytes { name, .. } | ArchiveEntry::File { name, .. } => name,
        }
    }
}

/// Extract a zip archive into `dest_dir`.
///
/// Returns the extracted files that sit at the root of the archive, sorted by path.
/// Nested entries are extracted but not returned.
pub fn unzip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    log::debug!(
        "Extracting {} entries from {:?} to {:?}",
        archive.len(),
        archive_path,
        dest_dir
    );

    std::fs::create_dir_all(dest_dir)?;
    let mut root_files = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let raw_name = entry.name().to_string();

        if should_skip_entry(&raw_name) {
            log::debug!("Skipping archive metadata entry {raw_name:?}");
            continue;
        }

        let relative = entry
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| ArchiveError::UnsafeEntry(raw_name.clone()))?;
        let dest_path = dest_dir.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut outfile = File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut outfile)?;

        if relative.components().count() == 1 {
            root_files.push(dest_path);
        } else {
            log::debug!("Ignoring nested archive entry {raw_name:?}");
        }
    }

    root_files.sort();
    log::debug!("Extracted {} root files", root_files.len());
    Ok(root_files)
}

/// Write `entries` into a new zip archive at `dest`.
///
/// Entries are stored at the archive root. Repeated names are written once.
pub fn zip(dest: &Path, entries: &[ArchiveEntry<'_>]) -> Result<(), ArchiveError> {
    let file = File::create(dest)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut written: Vec<&str> = Vec::with_capacity(entries.len());

    for entry in entries {
        let name = entry.name();
        if written.contains(&name) {
            log::debug!("Skipping repeated archive entry {name:?}");
            continue;
        }

        writer.start_file(name, options)?;
        match entry {
            ArchiveEntry::Bytes { data, .. } => writer.write_all(data)?,
            ArchiveEntry::File { path, .. } => {
                let mut source = File::open(path)?;
                std::io::copy(&mut source, &mut writer)?;
            }
        }
        written.push(name);
    }

    writer.finish()?;
    log::debug!("Wrote {} entries to {:?}", written.len(), dest);
    Ok(())
}

fn should_skip_entry(name: &str) -> bool {
    if IGNORED_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        return true;
    }
    let file_name = name.rsplit('/').next().unwrap_or(name);
    IGNORED_FILE_NAMES.contains(&file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn write_raw_zip(path: &Path, files: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_unzip_returns_root_files_only() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("bundle.zip");
        write_raw_zip(
            &archive,
            &[
                (MANIFEST_FILE_NAME, "{}"),
                ("bg.png", "png"),
                ("extras/readme.txt", "hi"),
                ("__MACOSX/._bg.png", "junk"),
                (".DS_Store", "junk"),
            ],
        );

        let out = temp.path().join("out");
        let files = unzip(&archive, &out).unwrap();

        assert_eq!(files, vec![out.join("bg.png"), out.join(MANIFEST_FILE_NAME)]);
        assert!(out.join("extras/readme.txt").exists());
        assert!(!out.join("__MACOSX").exists());
        assert!(!out.join(".DS_Store").exists());
    }

    #[test]
    fn test_unzip_rejects_escaping_entries() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("evil.zip");
        write_raw_zip(&archive, &[("../escape.txt", "nope")]);

        let result = unzip(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(ArchiveError::UnsafeEntry(_))));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_unzip_rejects_non_zip_input() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("not-a-zip.zip");
        std::fs::write(&archive, b"plain text").unwrap();

        let result = unzip(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(ArchiveError::Zip(_))));
    }

    #[test]
    fn test_zip_writes_bytes_and_files_once() {
        let temp = tempdir().unwrap();
        let asset = temp.path().join("bg.png");
        std::fs::write(&asset, b"png-bytes").unwrap();
        let dest = temp.path().join("theme.zip");

        zip(
            &dest,
            &[
                ArchiveEntry::Bytes { name: MANIFEST_FILE_NAME, data: b"{\"id\":\"x\"}" },
                ArchiveEntry::File { name: "bg.png", path: &asset },
                ArchiveEntry::File { name: "bg.png", path: &asset },
            ],
        )
        .unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("bg.png")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "png-bytes");
    }

    #[test]
    fn test_zip_fails_on_missing_source_file() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("missing.png");

        let result = zip(
            &temp.path().join("theme.zip"),
            &[ArchiveEntry::File { name: "missing.png", path: &missing }],
        );
        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }
}
