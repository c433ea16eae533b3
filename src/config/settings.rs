//! Runtime settings loaded from environment variables.
//!
//! Channel ids, the idle timeout, and the optional Mapbox token are read from
//! the environment (usually via `.env`). The flow-level settings derived here
//! are injected into the step catalog rather than read ambiently.

use crate::errors::{Error, Result};
use std::time::Duration;

/// Settings that gate the step catalog's branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    /// Whether the routing-choice step is offered at all
    pub allow_auto_route: bool,
}

/// Process-wide runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Channel where completed plans are posted with their cancel button
    pub flight_plan_channel: u64,
    /// Channel receiving collaborator-failure diagnostics
    pub operator_channel: u64,
    /// Idle window after which an in-progress flow auto-cancels
    pub idle_timeout: Duration,
    /// Whether auto-routing is offered to air-to-ground flights
    pub allow_auto_route: bool,
    /// Mapbox access token; auto-routing is disabled when absent
    pub mapbox_token: Option<String>,
}

impl Settings {
    /// The subset of settings the step catalog needs.
    #[must_use]
    pub const fn flow(&self) -> FlowSettings {
        FlowSettings {
            allow_auto_route: self.allow_auto_route && self.mapbox_token.is_some(),
        }
    }
}

fn channel_var(name: &str) -> Result<u64> {
    std::env::var(name)
        .map_err(|_| Error::Config {
            message: format!("{name} is not set"),
        })?
        .parse()
        .map_err(|_| Error::Config {
            message: format!("{name} is not a valid channel id"),
        })
}

/// Loads [`Settings`] from the environment.
///
/// `FLIGHT_PLAN_CHANNEL_ID` and `OPERATOR_CHANNEL_ID` are required.
/// `IDLE_TIMEOUT_SECS` defaults to 30, `ALLOW_AUTO_ROUTE` defaults to true,
/// and `MAPBOX_TOKEN` is optional.
///
/// # Errors
/// Returns [`Error::Config`] when a required variable is missing or malformed.
pub fn load_settings() -> Result<Settings> {
    let idle_secs = std::env::var("IDLE_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    let allow_auto_route = std::env::var("ALLOW_AUTO_ROUTE")
        .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
        .unwrap_or(true);

    Ok(Settings {
        flight_plan_channel: channel_var("FLIGHT_PLAN_CHANNEL_ID")?,
        operator_channel: channel_var("OPERATOR_CHANNEL_ID")?,
        idle_timeout: Duration::from_secs(idle_secs),
        allow_auto_route,
        mapbox_token: std::env::var("MAPBOX_TOKEN").ok(),
    })
}
