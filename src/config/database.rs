//! Database configuration module for Opso Bot.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! The schema is generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the database always matches the
//! Rust struct definitions without manual SQL.

use crate::entities::FlightPlan;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL`
/// environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
///
/// # Errors
/// Returns a database error when the connection cannot be established.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/opso_bot.sqlite?mode=rwc".to_string());

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
///
/// # Errors
/// Returns a database error when table creation fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let flight_plan_table = schema
        .create_table_from_entity(FlightPlan)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&flight_plan_table)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::flight_plan::Model as PlanModel;
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Querying proves the table exists and matches the entity shape
        let _: Vec<PlanModel> = FlightPlan::find().limit(1).all(&db).await?;
        Ok(())
    }
}
