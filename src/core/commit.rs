//! Completion handler - terminal-transition fan-out.
//!
//! On a completed session this builds the final record and drives the
//! best-effort commit: optional route planning, persistence, owner DM, and
//! the public post. Every effect is wrapped in its own failure boundary;
//! nothing here returns an error to the caller, and a routing failure never
//! blocks the base commit.

use crate::core::collaborators::{NotificationSink, OwnerNotice, ReservationStore, RoutePlanner, RouteArtifact};
use crate::core::record::{self, FinalRecord, Owner};
use crate::core::session::{FlowStatus, Session};
use chrono::{DateTime, Utc};
use tracing::{error, warn};

/// How a terminated session ended up.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The record was filed; route is present when auto-routing succeeded
    Filed {
        /// The committed record
        record: Box<FinalRecord>,
        /// The plotted route, if one was requested and produced
        route: Option<RouteArtifact>,
    },
    /// The session idle-timed out; nothing was persisted
    Cancelled,
    /// Filing was attempted but the commit fan-out failed; notices were sent
    Failed,
}

/// Drives the terminal fan-out against the injected collaborators.
pub struct CompletionHandler<'a> {
    store: &'a dyn ReservationStore,
    sink: &'a dyn NotificationSink,
    router: Option<&'a dyn RoutePlanner>,
}

impl<'a> CompletionHandler<'a> {
    /// Creates a handler over the given collaborators. `router` is absent
    /// when auto-routing is not configured.
    #[must_use]
    pub const fn new(
        store: &'a dyn ReservationStore,
        sink: &'a dyn NotificationSink,
        router: Option<&'a dyn RoutePlanner>,
    ) -> Self {
        Self { store, sink, router }
    }

    /// Consumes a terminated session and performs the commit fan-out.
    ///
    /// Idle-cancelled sessions produce [`CommitOutcome::Cancelled`] without
    /// touching any collaborator; the caller renders the resubmit notice.
    pub async fn finish(
        &self,
        session: &Session,
        owner: Owner,
        now: DateTime<Utc>,
    ) -> CommitOutcome {
        match session.status() {
            FlowStatus::Complete => self.file(session, owner, now).await,
            FlowStatus::Cancelled => CommitOutcome::Cancelled,
            FlowStatus::Active => {
                warn!(session = session.id(), "finish called on an active session");
                CommitOutcome::Cancelled
            }
        }
    }

    async fn file(&self, session: &Session, owner: Owner, now: DateTime<Utc>) -> CommitOutcome {
        let guild = session.guild();
        let kind = session.kind();

        let count = match self.store.count_records(guild, kind).await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "failed to fetch record count");
                self.report_filing_failure(&owner, &e.to_string(), session.fields())
                    .await;
                return CommitOutcome::Failed;
            }
        };

        let record = record::build_record(kind, guild, owner, session.fields().clone(), count, now);
        let route = self.plan_route_if_requested(&record).await;

        if let Err(e) = self.publish(&record, route.as_ref()).await {
            error!(serial = %record.serial, error = %e, "commit fan-out failed");
            self.report_filing_failure(&record.owner, &e.to_string(), &record.fields)
                .await;
            return CommitOutcome::Failed;
        }

        CommitOutcome::Filed {
            record: Box::new(record),
            route,
        }
    }

    /// Auto-routing is best-effort: a failure notifies the owner and the
    /// operators but the plan is still filed without the artifact.
    async fn plan_route_if_requested(&self, record: &FinalRecord) -> Option<RouteArtifact> {
        if record.fields.get("routing") != Some("1") {
            return None;
        }
        let router = self.router?;
        let flight = record.fields.get("flight")?;
        let range = record.fields.get("range")?;
        let departure = record.fields.get("departure")?;
        let approach = record.fields.get("approach")?;

        match router
            .plan_route(&record.serial, flight, range, departure, approach)
            .await
        {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                error!(serial = %record.serial, error = %e, "auto-route failed");
                if let Err(notify_err) = self
                    .sink
                    .notify_owner(&record.owner, OwnerNotice::RoutingFailed)
                    .await
                {
                    warn!(error = %notify_err, "could not DM owner about routing failure");
                }
                if let Err(notify_err) = self
                    .sink
                    .notify_operators("Mapbox problem", &e.to_string(), &record.fields)
                    .await
                {
                    warn!(error = %notify_err, "could not reach operator channel");
                }
                None
            }
        }
    }

    async fn publish(
        &self,
        record: &FinalRecord,
        route: Option<&RouteArtifact>,
    ) -> crate::errors::Result<()> {
        self.store.commit(record).await?;
        self.sink.post_public(record, route).await?;
        self.sink
            .notify_owner(&record.owner, OwnerNotice::Filed { record, route })
            .await?;
        Ok(())
    }

    async fn report_filing_failure(
        &self,
        owner: &Owner,
        error_text: &str,
        fields: &crate::core::session::Fields,
    ) {
        if let Err(e) = self.sink.notify_owner(owner, OwnerNotice::FilingFailed).await {
            warn!(error = %e, "could not DM owner about filing failure");
        }
        if let Err(e) = self
            .sink
            .notify_operators("Flight plan problem", error_text, fields)
            .await
        {
            warn!(error = %e, "could not reach operator channel");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::FlowSettings;
    use crate::core::flow::FlowKind;
    use crate::core::session::Selection;
    use crate::test_utils::{MemoryStore, RecordingSink, SinkEvent, StubRouter};

    const INITIATOR: u64 = 100;
    const GUILD: u64 = 900;

    fn owner() -> Owner {
        Owner {
            id: INITIATOR,
            name: "Tukool".to_string(),
        }
    }

    fn completed_session(routing: Option<&str>) -> Session {
        let settings = FlowSettings {
            allow_auto_route: routing.is_some(),
        };
        let mut session = Session::new(
            1,
            INITIATOR,
            GUILD,
            FlowKind::FlightPlan,
            settings,
            std::time::Duration::from_secs(30),
            Utc::now(),
        );
        let now = Utc::now();
        let mut steps = vec![
            ("taskings", "AG"),
            ("complex", "EAST"),
            ("range", "RANGE7"),
            ("block", "B1"),
            ("duration", "2"),
            ("flight-size", "2"),
            ("flight", "VIPER 1"),
        ];
        if let Some(choice) = routing {
            steps.push(("routing", choice));
            if choice == "1" {
                steps.push(("departure", "KUT-E"));
                steps.push(("approach", "KUT-W"));
            }
        }
        for (menu, value) in steps {
            session.advance(&Selection::single(menu, value, INITIATOR), now);
        }
        assert_eq!(session.status(), FlowStatus::Complete);
        session
    }

    fn cancelled_session() -> Session {
        let mut session = Session::new(
            1,
            INITIATOR,
            GUILD,
            FlowKind::FlightPlan,
            FlowSettings {
                allow_auto_route: false,
            },
            std::time::Duration::from_secs(30),
            Utc::now(),
        );
        session.cancel();
        session
    }

    #[tokio::test]
    async fn test_successful_commit_persists_posts_and_notifies() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let handler = CompletionHandler::new(&store, &sink, None);
        let session = completed_session(None);

        let outcome = handler.finish(&session, owner(), Utc::now()).await;

        let CommitOutcome::Filed { record, route } = outcome else {
            panic!("expected a filed record");
        };
        assert!(route.is_none());
        assert_eq!(store.committed().len(), 1);
        assert_eq!(store.committed()[0].serial, record.serial);

        let events = sink.events();
        assert!(events.iter().any(|e| matches!(e, SinkEvent::Public(s) if s == &record.serial)));
        assert!(events.iter().any(|e| matches!(e, SinkEvent::OwnerFiled(s) if s == &record.serial)));
    }

    #[tokio::test]
    async fn test_storage_failure_notifies_owner_and_operators() {
        let store = MemoryStore::failing_commit();
        let sink = RecordingSink::new();
        let handler = CompletionHandler::new(&store, &sink, None);
        let session = completed_session(None);

        let outcome = handler.finish(&session, owner(), Utc::now()).await;

        assert!(matches!(outcome, CommitOutcome::Failed));
        assert!(store.committed().is_empty());
        let events = sink.events();
        assert!(events.iter().any(|e| matches!(e, SinkEvent::OwnerFilingFailed)));
        assert!(events.iter().any(|e| matches!(e, SinkEvent::Operators(c, _) if c == "Flight plan problem")));
    }

    #[tokio::test]
    async fn test_routing_failure_still_files_the_plan() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let router = StubRouter::failing();
        let handler = CompletionHandler::new(&store, &sink, Some(&router));
        let session = completed_session(Some("1"));

        let outcome = handler.finish(&session, owner(), Utc::now()).await;

        let CommitOutcome::Filed { route, .. } = outcome else {
            panic!("expected a filed record despite the routing failure");
        };
        assert!(route.is_none());
        assert_eq!(store.committed().len(), 1);
        let events = sink.events();
        assert!(events.iter().any(|e| matches!(e, SinkEvent::OwnerRoutingFailed)));
        assert!(events.iter().any(|e| matches!(e, SinkEvent::Operators(c, _) if c == "Mapbox problem")));
    }

    #[tokio::test]
    async fn test_auto_route_artifact_is_attached() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let router = StubRouter::ok();
        let handler = CompletionHandler::new(&store, &sink, Some(&router));
        let session = completed_session(Some("1"));

        let outcome = handler.finish(&session, owner(), Utc::now()).await;

        let CommitOutcome::Filed { record, route } = outcome else {
            panic!("expected a filed record");
        };
        let route = route.unwrap();
        assert_eq!(route.serial, record.serial);
    }

    #[tokio::test]
    async fn test_manual_route_never_calls_the_router() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let router = StubRouter::failing();
        let handler = CompletionHandler::new(&store, &sink, Some(&router));
        let session = completed_session(Some("2"));

        let outcome = handler.finish(&session, owner(), Utc::now()).await;

        assert!(matches!(outcome, CommitOutcome::Filed { route: None, .. }));
        assert_eq!(router.calls(), 0);
    }

    #[tokio::test]
    async fn test_idle_cancellation_persists_nothing() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let handler = CompletionHandler::new(&store, &sink, None);
        let session = cancelled_session();

        let outcome = handler.finish(&session, owner(), Utc::now()).await;

        assert!(matches!(outcome, CommitOutcome::Cancelled));
        assert!(store.committed().is_empty());
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_count_failure_is_contained() {
        let store = MemoryStore::failing_count();
        let sink = RecordingSink::new();
        let handler = CompletionHandler::new(&store, &sink, None);
        let session = completed_session(None);

        let outcome = handler.finish(&session, owner(), Utc::now()).await;

        assert!(matches!(outcome, CommitOutcome::Failed));
        assert!(sink.events().iter().any(|e| matches!(e, SinkEvent::OwnerFilingFailed)));
    }

    #[tokio::test]
    async fn test_serial_uses_stored_count() {
        let store = MemoryStore::with_count(7);
        let sink = RecordingSink::new();
        let handler = CompletionHandler::new(&store, &sink, None);
        let session = completed_session(None);

        let at = "2026-08-07T12:00:00Z".parse().unwrap();
        let outcome = handler.finish(&session, owner(), at).await;
        let CommitOutcome::Filed { record, .. } = outcome else {
            panic!("expected a filed record");
        };
        assert_eq!(record.serial, "TR202608077");
    }
}
