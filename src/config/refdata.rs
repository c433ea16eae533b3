//! Range reference dataset loading from data.toml
//!
//! The dataset (zones, complexes, ranges, altitude blocks, callsigns,
//! departures/approaches/transits, SCL lists) is loaded once at process start
//! and injected wherever it is needed. Nothing mutates it afterwards.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// A generic label/value pair as rendered into a select-menu option
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Choice {
    /// Text shown to the user
    pub label: String,
    /// Underlying value recorded into the session fields
    pub value: String,
}

/// A decimal coordinate pair
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Coords {
    /// Latitude, decimal degrees
    pub lat: f64,
    /// Longitude, decimal degrees
    pub lon: f64,
}

/// A named point on a range boundary (entry or exit)
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Waypoint {
    /// Point name (e.g. "GATE NORTH")
    pub name: String,
    /// Latitude, decimal degrees
    pub lat: f64,
    /// Longitude, decimal degrees
    pub lon: f64,
    /// Short procedural note shown in the range-info embed
    #[serde(default)]
    pub desc: String,
}

/// A range complex grouping several ranges
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Complex {
    /// Complex id, recorded into session fields
    pub id: String,
    /// Display label
    pub label: String,
}

/// A single range within a complex
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Range {
    /// Range id, recorded into session fields and reservations
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning complex id
    pub complex: String,
    /// Radio channel number
    pub frequency: u8,
    /// Whether a JTAC is available on this range
    pub jtac: bool,
    /// Whether the range is currently usable at all
    pub active: bool,
    /// Ids of the altitude blocks available on this range
    pub blocks: Vec<String>,
    /// Free-text restrictions shown in the range-info embed
    #[serde(default)]
    pub restrictions: Vec<String>,
    /// Hold fix inside the range, used by the auto-router
    pub navfix: Coords,
    /// Entry points
    pub entries: Vec<Waypoint>,
    /// Exit points
    pub exits: Vec<Waypoint>,
}

/// An altitude block
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Block {
    /// Block id, recorded into session fields and reservations
    pub id: String,
    /// Display label (e.g. "FL180-FL240")
    pub label: String,
}

/// Maps a Discord role to a flight callsign and airframe
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Callsign {
    /// Discord role name
    pub role: String,
    /// Callsign prefix (e.g. "VIPER")
    pub callsign: String,
    /// Airframe id, keys into the SCL table
    pub airframe: String,
    /// Tasked unit designation, used in the ATO header
    pub unit: String,
}

/// A routing from a departure or approach procedure to one range
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProcedureRouting {
    /// Range id this routing serves
    pub range: String,
    /// Ordered transit ids between the transition point and the range
    pub route: Vec<String>,
}

/// A departure or approach procedure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Procedure {
    /// Procedure id, recorded into session fields
    pub id: String,
    /// Display label
    pub label: String,
    /// The transition point where the procedure joins the route
    pub transition: Coords,
    /// Routings to the ranges this procedure serves
    pub routings: Vec<ProcedureRouting>,
}

/// A named en-route transit point
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Transit {
    /// Transit id referenced from procedure routings
    pub id: String,
    /// Latitude, decimal degrees
    pub lat: f64,
    /// Longitude, decimal degrees
    pub lon: f64,
}

/// A standard conventional load for one airframe
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Scl {
    /// The load description, used as both label and value
    pub scl: String,
    /// "AA" or "AG"
    #[serde(rename = "type")]
    pub kind: String,
}

/// SCL table for one airframe
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Airframe {
    /// Airframe id (e.g. "F-16C")
    pub id: String,
    /// Standard conventional loads
    pub scls: Vec<Scl>,
}

/// The entire reference dataset, the parsed shape of data.toml
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RangeData {
    /// Tasking select-menu options
    pub taskings: Vec<Choice>,
    /// Zone select-menu options for general-flying taskings
    pub zones: Vec<Choice>,
    /// Duration select-menu options (values are hours)
    pub durations: Vec<Choice>,
    /// Flight element suffixes composed with the callsign prefix
    pub elements: Vec<String>,
    /// Range complexes
    pub complexes: Vec<Complex>,
    /// Ranges
    pub ranges: Vec<Range>,
    /// Altitude blocks
    pub blocks: Vec<Block>,
    /// Role-to-callsign mappings
    pub callsigns: Vec<Callsign>,
    /// Departure procedures
    pub departures: Vec<Procedure>,
    /// Approach procedures
    pub approaches: Vec<Procedure>,
    /// En-route transit points
    pub transits: Vec<Transit>,
    /// Per-airframe SCL tables
    pub airframes: Vec<Airframe>,
}

impl RangeData {
    /// Looks up a range by id.
    ///
    /// # Errors
    /// Returns [`Error::UnknownRange`] when the id is not in the dataset,
    /// so callers can render a distinct error prompt instead of an empty list.
    pub fn range(&self, id: &str) -> Result<&Range> {
        self.ranges
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::UnknownRange { id: id.to_string() })
    }

    /// Display label for an altitude block id; falls back to the id itself
    /// when the block is not in the dataset.
    #[must_use]
    pub fn block_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .map_or(id, |b| b.label.as_str())
    }

    /// Finds the callsign mapped to the first matching role name, if any.
    #[must_use]
    pub fn callsign_for_roles(&self, roles: &[String]) -> Option<&Callsign> {
        self.callsigns
            .iter()
            .find(|c| roles.iter().any(|r| r == &c.role))
    }

    /// Looks up an airframe's SCL table by id.
    ///
    /// # Errors
    /// Returns [`Error::UnknownAirframe`] when the id is not in the dataset.
    pub fn airframe(&self, id: &str) -> Result<&Airframe> {
        self.airframes
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::UnknownAirframe { id: id.to_string() })
    }

    /// Looks up a departure procedure by id.
    #[must_use]
    pub fn departure(&self, id: &str) -> Option<&Procedure> {
        self.departures.iter().find(|d| d.id == id)
    }

    /// Looks up an approach procedure by id.
    #[must_use]
    pub fn approach(&self, id: &str) -> Option<&Procedure> {
        self.approaches.iter().find(|a| a.id == id)
    }

    /// Looks up a transit point by id.
    #[must_use]
    pub fn transit(&self, id: &str) -> Option<&Transit> {
        self.transits.iter().find(|t| t.id == id)
    }
}

/// Loads the reference dataset from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML does not match
/// the [`RangeData`] shape.
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<RangeData> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read range data file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse range data: {e}"),
    })
}

/// Loads the reference dataset from the default location, overridable with
/// the `RANGE_DATA_PATH` environment variable.
///
/// # Errors
/// Same as [`load_data`].
pub fn load_default_data() -> Result<RangeData> {
    let path =
        std::env::var("RANGE_DATA_PATH").unwrap_or_else(|_| "data.toml".to_string());
    load_data(path)
}
