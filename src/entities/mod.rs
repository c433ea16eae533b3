//! `SeaORM` entity definitions for database tables.

/// Committed flow records (flight plans and ATOs)
pub mod flight_plan;

pub use flight_plan::Entity as FlightPlan;
