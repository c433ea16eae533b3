//! Unified error types for Opso Bot.
//!
//! Every fallible operation in the crate returns [`Result`]. Collaborator
//! failures at the commit boundary are caught by the completion handler and
//! converted into user/operator notices rather than propagated.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or validation failed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what went wrong
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (reference data file, image buffers)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A range id that is not present in the reference dataset
    #[error("There is a problem with this range ('{id}')")]
    UnknownRange {
        /// The range id that failed to resolve
        id: String,
    },

    /// An airframe id that is not present in the reference dataset
    #[error("No SCL data for airframe '{id}'")]
    UnknownAirframe {
        /// The airframe id that failed to resolve
        id: String,
    },

    /// The interacting member carries no role mapped to a callsign
    #[error("None of your roles map to a flight callsign")]
    UnknownCallsign,

    /// A serial that does not match any stored record
    #[error("No record found for serial '{serial}'")]
    RecordNotFound {
        /// The serial that was looked up
        serial: String,
    },

    /// A cancellation attempt by someone other than the record owner
    #[error("Record '{serial}' belongs to another member")]
    NotOwner {
        /// The serial of the record that was targeted
        serial: String,
    },

    /// Route planning (Mapbox) failure
    #[error("Routing error: {message}")]
    Routing {
        /// Human-readable description of the routing failure
        message: String,
    },

    /// HTTP error from the Mapbox client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Error::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
