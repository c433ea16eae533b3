//! Core flow logic - framework-agnostic session, catalog, resolver, and
//! completion handling.
//!
//! Nothing in here touches Discord directly; the bot layer feeds interaction
//! events in and renders whatever comes back, and the collaborators are
//! injected as trait objects.

/// Collaborator contracts (storage, notifications, routing)
pub mod collaborators;
/// Completion handler - terminal fan-out over the collaborators
pub mod commit;
/// Step catalog - the flow state machine
pub mod flow;
/// Option resolver - per-step choice lists filtered against reservations
pub mod options;
/// Final record construction and serial generation
pub mod record;
/// Session lifecycle and field accumulation
pub mod session;
