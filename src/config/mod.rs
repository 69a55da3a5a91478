/// Database configuration and connection management
pub mod database;

/// Application settings loading from sharaf.toml
pub mod settings;
