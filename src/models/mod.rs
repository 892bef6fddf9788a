// Theme Bundle Models
// Data structures for themes and their persisted settings

mod settings;
mod theme;

pub use settings::*;
pub use theme::*;
