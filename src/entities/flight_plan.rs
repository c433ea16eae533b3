//! Flight plan entity - one row per committed flow record.
//!
//! Both flow kinds (flight plans and ATOs) land in this table; `kind`
//! discriminates them for serial sequencing. A row whose `expires_at` has
//! passed, or whose `cancelled` flag is set, no longer reserves resources.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Flight plan database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flight_plans")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Generated serial (e.g. "TR202608070"), unique per guild in practice
    pub serial: String,
    /// Discord guild the record belongs to
    pub guild_id: String,
    /// Flow kind: "flight_plan" or "ato"
    pub kind: String,
    /// Discord user id of the owner
    pub owner_id: String,
    /// Display name of the owner at commit time
    pub owner_name: String,
    /// Reserved range id, if the flow selected one
    pub range: Option<String>,
    /// Owning complex of the reserved range
    pub complex: Option<String>,
    /// Reserved altitude block id
    pub block: Option<String>,
    /// Reserved flight label (e.g. "VIPER 1")
    pub flight: Option<String>,
    /// Full frozen field map, JSON-encoded for display and diagnostics
    pub fields: String,
    /// Commit timestamp
    pub created_at: DateTimeUtc,
    /// When the reservation lapses
    pub expires_at: DateTimeUtc,
    /// Set by the cancel control; cancelled rows reserve nothing
    pub cancelled: bool,
}

/// Flight plans relate to nothing else
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
