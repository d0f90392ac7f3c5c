/// Application configuration loading from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Seeding rooms and settings from the configuration
pub mod seed;
