/// Database configuration and connection management
pub mod database;

/// Range reference dataset loading from data.toml
pub mod refdata;

/// Runtime settings (channels, timeouts, Mapbox token) from environment variables
pub mod settings;
