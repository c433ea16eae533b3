//! Collaborator contracts consumed by the core flow.
//!
//! The storage, notification, and routing collaborators are trait objects so
//! the completion handler can be exercised against recording/failing mocks.
//! The Discord and Mapbox implementations live in `store`, `bot::sink`, and
//! `route`.

use crate::config::refdata::Coords;
use crate::core::flow::FlowKind;
use crate::core::options::Reservation;
use crate::core::record::{FinalRecord, Owner};
use crate::core::session::Fields;
use crate::errors::Result;
use async_trait::async_trait;

/// Storage collaborator owning the reservation set and committed records.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Snapshot of the resource keys held by currently active records.
    async fn active_reservations(&self, guild: u64) -> Result<Vec<Reservation>>;

    /// Current count of stored records for `(guild, kind)`, used for serial
    /// sequencing.
    async fn count_records(&self, guild: u64, kind: FlowKind) -> Result<u64>;

    /// Persists a committed record.
    async fn commit(&self, record: &FinalRecord) -> Result<()>;

    /// Marks a stored record cancelled after verifying `requester` owns it,
    /// returning the cancelled record.
    async fn cancel(&self, guild: u64, serial: &str, requester: u64) -> Result<FinalRecord>;
}

/// The plotted route produced by the routing collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteArtifact {
    /// Serial of the plan this route belongs to
    pub serial: String,
    /// Ordered route points: departure transition, outbound transits, range
    /// entry/fix/exit, inbound transits, approach transition
    pub waypoints: Vec<Coords>,
    /// Coordinate block rendered into the routing-details message
    pub description: String,
    /// PNG plot of the route
    pub image: Vec<u8>,
}

/// Optional routing/geocoding collaborator, only consulted for auto-routes.
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    /// Plans and plots the route for a committed flight plan.
    async fn plan_route(
        &self,
        serial: &str,
        flight: &str,
        range: &str,
        departure: &str,
        approach: &str,
    ) -> Result<RouteArtifact>;

    /// Terrain elevation in feet at a coordinate (ATO ground targets).
    async fn elevation(&self, coords: Coords) -> Result<i64>;
}

/// What the owner is told about their filing.
#[derive(Debug, Clone, Copy)]
pub enum OwnerNotice<'a> {
    /// The record was filed; carries the rendered summary inputs
    Filed {
        /// The committed record
        record: &'a FinalRecord,
        /// Route artifact when auto-routing succeeded
        route: Option<&'a RouteArtifact>,
    },
    /// Auto-routing failed; the plan itself was still filed
    RoutingFailed,
    /// The filing itself failed
    FilingFailed,
}

/// Notification collaborator fanning messages out to Discord.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Direct-messages the owner.
    async fn notify_owner(&self, owner: &Owner, notice: OwnerNotice<'_>) -> Result<()>;

    /// Posts a diagnostic (error plus field dump) to the operator channel.
    async fn notify_operators(&self, context: &str, error: &str, fields: &Fields) -> Result<()>;

    /// Posts the rendered summary to the shared channel with its cancel
    /// control attached.
    async fn post_public(&self, record: &FinalRecord, route: Option<&RouteArtifact>)
        -> Result<()>;
}
