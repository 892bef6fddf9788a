// Theme Bundle
// Theme archive import/export and theme preset management

pub mod commands;
pub mod models;
pub mod services;
