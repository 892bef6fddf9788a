// Theme Bundle Services
// Business logic layer

mod asset_store;
mod events;
mod file_access;
mod path_validator;
mod settings_manager;
pub mod theme_archive;
mod theme_collection;
mod theme_exporter;
mod theme_importer;

pub use asset_store::*;
pub use events::*;
pub use file_access::*;
pub use path_validator::*;
pub use settings_manager::*;
pub use theme_archive::{ArchiveEntry, ArchiveError, MANIFEST_FILE_NAME};
pub use theme_collection::*;
pub use theme_exporter::*;
pub use theme_importer::*;
