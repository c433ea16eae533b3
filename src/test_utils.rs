//! Shared test fixtures: a small in-code reference dataset and
//! recording/failing mock collaborators for exercising the completion
//! handler without Discord or a database.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use crate::config::refdata::{
    Airframe, Block, Callsign, Choice, Complex, Coords, Procedure, ProcedureRouting, Range,
    RangeData, Scl, Transit, Waypoint,
};
use crate::core::collaborators::{
    NotificationSink, OwnerNotice, ReservationStore, RouteArtifact, RoutePlanner,
};
use crate::core::flow::FlowKind;
use crate::core::options::Reservation;
use crate::core::record::{FinalRecord, Owner};
use crate::core::session::Fields;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

fn choice(label: &str, value: &str) -> Choice {
    Choice {
        label: label.to_string(),
        value: value.to_string(),
    }
}

fn waypoint(name: &str, lat: f64, lon: f64) -> Waypoint {
    Waypoint {
        name: name.to_string(),
        lat,
        lon,
        desc: String::new(),
    }
}

fn range(id: &str, complex: &str, jtac: bool, blocks: &[&str]) -> Range {
    Range {
        id: id.to_string(),
        name: format!("Range {id}"),
        complex: complex.to_string(),
        frequency: 4,
        jtac,
        active: true,
        blocks: blocks.iter().map(|b| (*b).to_string()).collect(),
        restrictions: vec!["No ordnance south of the river".to_string()],
        navfix: Coords { lat: 41.81, lon: 41.77 },
        entries: vec![waypoint("GATE NORTH", 41.95, 41.70)],
        exits: vec![waypoint("GATE SOUTH", 41.60, 41.80)],
    }
}

fn procedure(id: &str, label: &str, routings: &[(&str, &[&str])]) -> Procedure {
    Procedure {
        id: id.to_string(),
        label: label.to_string(),
        transition: Coords { lat: 42.18, lon: 42.48 },
        routings: routings
            .iter()
            .map(|(range, route)| ProcedureRouting {
                range: (*range).to_string(),
                route: route.iter().map(|t| (*t).to_string()).collect(),
            })
            .collect(),
    }
}

fn scl(load: &str, kind: &str) -> Scl {
    Scl {
        scl: load.to_string(),
        kind: kind.to_string(),
    }
}

/// A compact dataset mirroring the shape of data.toml.
pub(crate) fn sample_refdata() -> RangeData {
    RangeData {
        taskings: vec![
            choice("General Flying", "GF"),
            choice("Air to Air", "AA"),
            choice("Air to Ground", "AG"),
            choice("Close Air Support", "CAS"),
            choice("JTAC", "JTAC"),
        ],
        zones: vec![choice("Zone Alpha", "ALPHA"), choice("Zone Bravo", "BRAVO")],
        durations: vec![
            choice("1 hour", "1"),
            choice("2 hours", "2"),
            choice("3 hours", "3"),
            choice("4 hours", "4"),
        ],
        elements: vec!["1".into(), "2".into(), "3".into(), "4".into()],
        complexes: vec![
            Complex {
                id: "EAST".to_string(),
                label: "Eastern Complex".to_string(),
            },
            Complex {
                id: "WEST".to_string(),
                label: "Western Complex".to_string(),
            },
        ],
        ranges: vec![
            range("RANGE7", "EAST", true, &["B1", "B2"]),
            range("RANGE9", "EAST", false, &["B1", "B2", "B3"]),
            range("RANGE12", "WEST", true, &["B3"]),
        ],
        blocks: vec![
            Block {
                id: "B1".to_string(),
                label: "FL180-FL240".to_string(),
            },
            Block {
                id: "B2".to_string(),
                label: "FL240-FL300".to_string(),
            },
            Block {
                id: "B3".to_string(),
                label: "FL300-FL360".to_string(),
            },
        ],
        callsigns: vec![
            Callsign {
                role: "Viper".to_string(),
                callsign: "VIPER".to_string(),
                airframe: "F-16C".to_string(),
                unit: "77th vFS".to_string(),
            },
            Callsign {
                role: "Hog".to_string(),
                callsign: "BOAR".to_string(),
                airframe: "A-10C".to_string(),
                unit: "47th vFS".to_string(),
            },
        ],
        departures: vec![
            procedure("KUT-E", "Kutaisi East", &[("RANGE7", &["T1"]), ("RANGE9", &["T1", "T2"])]),
            procedure("SEN-N", "Senaki North", &[("RANGE12", &["T3"])]),
        ],
        approaches: vec![
            procedure("KUT-W", "Kutaisi West", &[("RANGE7", &["T2"]), ("RANGE9", &["T2"])]),
            procedure("SEN-S", "Senaki South", &[("RANGE12", &["T3"])]),
        ],
        transits: vec![
            Transit { id: "T1".to_string(), lat: 42.05, lon: 41.95 },
            Transit { id: "T2".to_string(), lat: 41.90, lon: 42.10 },
            Transit { id: "T3".to_string(), lat: 42.30, lon: 42.05 },
        ],
        airframes: vec![
            Airframe {
                id: "F-16C".to_string(),
                scls: vec![
                    scl("2xAIM-120C/2xAIM-9X", "AA"),
                    scl("4xAIM-120C/2xAIM-9X", "AA"),
                    scl("6xAIM-120C", "AA"),
                    scl("2xGBU-12/TGP", "AG"),
                    scl("4xGBU-38/TGP", "AG"),
                    scl("2xAGM-88C/HTS", "AG"),
                ],
            },
            Airframe {
                id: "A-10C".to_string(),
                scls: vec![scl("4xGBU-12/TGP", "AG"), scl("AGM-65D x4", "AG")],
            },
        ],
    }
}

/// A reservation snapshot entry for resolver tests.
pub(crate) fn reservation(
    range: &str,
    complex: Option<&str>,
    block: Option<&str>,
    flight: &str,
) -> Reservation {
    Reservation {
        range: Some(range.to_string()),
        complex: complex.map(str::to_string),
        block: block.map(str::to_string),
        flight: Some(flight.to_string()),
        expires_at: Utc::now() + Duration::hours(2),
    }
}

/// What a [`RecordingSink`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkEvent {
    OwnerFiled(String),
    OwnerRoutingFailed,
    OwnerFilingFailed,
    Operators(String, String),
    Public(String),
}

/// A notification sink that records every call.
pub(crate) struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify_owner(&self, _owner: &Owner, notice: OwnerNotice<'_>) -> Result<()> {
        self.push(match notice {
            OwnerNotice::Filed { record, .. } => SinkEvent::OwnerFiled(record.serial.clone()),
            OwnerNotice::RoutingFailed => SinkEvent::OwnerRoutingFailed,
            OwnerNotice::FilingFailed => SinkEvent::OwnerFilingFailed,
        });
        Ok(())
    }

    async fn notify_operators(&self, context: &str, error: &str, _fields: &Fields) -> Result<()> {
        self.push(SinkEvent::Operators(context.to_string(), error.to_string()));
        Ok(())
    }

    async fn post_public(
        &self,
        record: &FinalRecord,
        _route: Option<&RouteArtifact>,
    ) -> Result<()> {
        self.push(SinkEvent::Public(record.serial.clone()));
        Ok(())
    }
}

/// An in-memory reservation store with switchable failure modes.
pub(crate) struct MemoryStore {
    committed: Mutex<Vec<FinalRecord>>,
    base_count: u64,
    fail_commit: bool,
    fail_count: bool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            committed: Mutex::new(Vec::new()),
            base_count: 0,
            fail_commit: false,
            fail_count: false,
        }
    }

    pub(crate) fn with_count(base_count: u64) -> Self {
        Self {
            base_count,
            ..Self::new()
        }
    }

    pub(crate) fn failing_commit() -> Self {
        Self {
            fail_commit: true,
            ..Self::new()
        }
    }

    pub(crate) fn failing_count() -> Self {
        Self {
            fail_count: true,
            ..Self::new()
        }
    }

    pub(crate) fn committed(&self) -> Vec<FinalRecord> {
        self.committed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn active_reservations(&self, guild: u64) -> Result<Vec<Reservation>> {
        Ok(self
            .committed
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.guild == guild)
            .map(|r| Reservation {
                range: r.fields.get("range").map(str::to_string),
                complex: r.fields.get("complex").map(str::to_string),
                block: r.fields.get("block").map(str::to_string),
                flight: r.fields.get("flight").map(str::to_string),
                expires_at: r.expires_at,
            })
            .collect())
    }

    async fn count_records(&self, _guild: u64, _kind: FlowKind) -> Result<u64> {
        if self.fail_count {
            return Err(Error::Config {
                message: "count unavailable".to_string(),
            });
        }
        Ok(self.base_count + self.committed.lock().unwrap().len() as u64)
    }

    async fn commit(&self, record: &FinalRecord) -> Result<()> {
        if self.fail_commit {
            return Err(Error::Config {
                message: "storage write refused".to_string(),
            });
        }
        self.committed.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn cancel(&self, _guild: u64, serial: &str, requester: u64) -> Result<FinalRecord> {
        let mut committed = self.committed.lock().unwrap();
        let position = committed.iter().position(|r| r.serial == serial).ok_or_else(|| {
            Error::RecordNotFound {
                serial: serial.to_string(),
            }
        })?;
        if committed[position].owner.id != requester {
            return Err(Error::NotOwner {
                serial: serial.to_string(),
            });
        }
        Ok(committed.remove(position))
    }
}

/// A route planner stub with a success and a failure mode.
pub(crate) struct StubRouter {
    fail: bool,
    calls: AtomicUsize,
}

impl StubRouter {
    pub(crate) fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutePlanner for StubRouter {
    async fn plan_route(
        &self,
        serial: &str,
        _flight: &str,
        _range: &str,
        _departure: &str,
        _approach: &str,
    ) -> Result<RouteArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Routing {
                message: "tile server unavailable".to_string(),
            });
        }
        Ok(RouteArtifact {
            serial: serial.to_string(),
            waypoints: vec![Coords { lat: 42.18, lon: 42.48 }],
            description: "42.1800 42.4800".to_string(),
            image: vec![0x89, b'P', b'N', b'G'],
        })
    }

    async fn elevation(&self, _coords: Coords) -> Result<i64> {
        if self.fail {
            return Err(Error::Routing {
                message: "tilequery unavailable".to_string(),
            });
        }
        Ok(1200)
    }
}
