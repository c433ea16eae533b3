//! Discord command implementations (flight plan, ATO, ranges, general).

/// The `/ato` filing flow
pub mod ato;
/// The `/flightplan` filing flow
pub mod flightplan;
/// General utility commands
pub mod general;
/// Range listings and details
pub mod ranges;

pub use ato::ato;
pub use flightplan::flightplan;
pub use general::ping;
pub use ranges::{rangeinfo, ranges};
