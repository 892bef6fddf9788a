// Theme Bundle Commands
// Entry points for the settings screen

mod theme;

pub use theme::*;
