//! Flight plan persistence over `SeaORM`.
//!
//! A stored row reserves its range/block/flight until it expires or is
//! cancelled. `count_records` deliberately reports the raw row count (the
//! serial-sequencing source behavior); see DESIGN.md for the known
//! duplicate-serial weakness.

use crate::core::collaborators::ReservationStore;
use crate::core::flow::FlowKind;
use crate::core::options::Reservation;
use crate::core::record::{FinalRecord, Owner};
use crate::core::session::Fields;
use crate::entities::{FlightPlan, flight_plan};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, PaginatorTrait, Set, prelude::*};

/// `SeaORM`-backed implementation of the reservation store.
#[derive(Debug, Clone)]
pub struct PlanStore {
    db: DatabaseConnection,
}

impl PlanStore {
    /// Wraps a database connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active (non-cancelled, unexpired) rows for a guild, newest first.
    async fn active_rows(&self, guild: u64) -> Result<Vec<flight_plan::Model>> {
        FlightPlan::find()
            .filter(flight_plan::Column::GuildId.eq(guild.to_string()))
            .filter(flight_plan::Column::Cancelled.eq(false))
            .filter(flight_plan::Column::ExpiresAt.gt(Utc::now()))
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}

fn record_from_model(model: &flight_plan::Model) -> FinalRecord {
    let fields: Fields = serde_json::from_str(&model.fields).unwrap_or_default();
    FinalRecord {
        serial: model.serial.clone(),
        guild: model.guild_id.parse().unwrap_or_default(),
        kind: FlowKind::parse(&model.kind).unwrap_or(FlowKind::FlightPlan),
        owner: Owner {
            id: model.owner_id.parse().unwrap_or_default(),
            name: model.owner_name.clone(),
        },
        fields,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

#[async_trait]
impl ReservationStore for PlanStore {
    async fn active_reservations(&self, guild: u64) -> Result<Vec<Reservation>> {
        Ok(self
            .active_rows(guild)
            .await?
            .iter()
            .map(|m| Reservation {
                range: m.range.clone(),
                complex: m.complex.clone(),
                block: m.block.clone(),
                flight: m.flight.clone(),
                expires_at: m.expires_at,
            })
            .collect())
    }

    async fn count_records(&self, guild: u64, kind: FlowKind) -> Result<u64> {
        FlightPlan::find()
            .filter(flight_plan::Column::GuildId.eq(guild.to_string()))
            .filter(flight_plan::Column::Kind.eq(kind.as_str()))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn commit(&self, record: &FinalRecord) -> Result<()> {
        let fields_json = serde_json::to_string(&record.fields).map_err(|e| Error::Config {
            message: format!("could not encode record fields: {e}"),
        })?;

        let row = flight_plan::ActiveModel {
            serial: Set(record.serial.clone()),
            guild_id: Set(record.guild.to_string()),
            kind: Set(record.kind.as_str().to_string()),
            owner_id: Set(record.owner.id.to_string()),
            owner_name: Set(record.owner.name.clone()),
            range: Set(record.fields.get("range").map(str::to_string)),
            complex: Set(record.fields.get("complex").map(str::to_string)),
            block: Set(record.fields.get("block").map(str::to_string)),
            flight: Set(record.fields.get("flight").map(str::to_string)),
            fields: Set(fields_json),
            created_at: Set(record.created_at),
            expires_at: Set(record.expires_at),
            cancelled: Set(false),
            ..Default::default()
        };

        row.insert(&self.db).await?;
        Ok(())
    }

    async fn cancel(&self, guild: u64, serial: &str, requester: u64) -> Result<FinalRecord> {
        let model = FlightPlan::find()
            .filter(flight_plan::Column::GuildId.eq(guild.to_string()))
            .filter(flight_plan::Column::Serial.eq(serial))
            .filter(flight_plan::Column::Cancelled.eq(false))
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::RecordNotFound {
                serial: serial.to_string(),
            })?;

        if model.owner_id != requester.to_string() {
            return Err(Error::NotOwner {
                serial: serial.to_string(),
            });
        }

        let record = record_from_model(&model);
        let mut row: flight_plan::ActiveModel = model.into();
        row.cancelled = Set(true);
        row.update(&self.db).await?;

        Ok(record)
    }
}
