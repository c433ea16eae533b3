//! Session lifecycle - the per-invocation flow state.
//!
//! A [`Session`] is an explicit state object advanced by discrete calls
//! rather than a collector callback: the Discord layer feeds it one
//! [`Selection`] per interaction event and renders whatever the returned
//! [`Outcome`] asks for. The idle deadline is first-class session state; any
//! accepted interaction refreshes it.

use crate::config::settings::FlowSettings;
use crate::core::flow::{self, FlowKind, Step, Transition};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The accumulated field selections, in insertion order.
///
/// Keys are never overwritten once set, with the single exception of the
/// synthetic `range` derivation applied at commit time via [`Fields::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    /// Creates an empty field map.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Looks up a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Records a field if it is not already present. Returns whether the
    /// value was stored; an existing key is never overwritten.
    pub fn insert(&mut self, key: &str, value: &str) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        self.0.push((key.to_string(), value.to_string()));
        true
    }

    /// Overwrites (or inserts) a field. Reserved for the commit-time range
    /// derivation; flow code uses [`Fields::insert`].
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.0.push((key.to_string(), value.to_string()));
        }
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of recorded fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no fields have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Fields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

/// One discrete selection event delivered by the interaction source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The select-menu custom id the event came from
    pub menu: String,
    /// The chosen values (multiple only for the pilot assignment step)
    pub values: Vec<String>,
    /// The user who interacted
    pub actor: u64,
}

impl Selection {
    /// Convenience constructor for a single-value selection.
    #[must_use]
    pub fn single(menu: &str, value: &str, actor: u64) -> Self {
        Self {
            menu: menu.to_string(),
            values: vec![value.to_string()],
            actor,
        }
    }

    /// The first chosen value; transition decisions key off this.
    #[must_use]
    pub fn value(&self) -> &str {
        self.values.first().map_or("", String::as_str)
    }

    /// All chosen values joined for storage.
    #[must_use]
    pub fn joined(&self) -> String {
        self.values.join(", ")
    }
}

/// Lifecycle state of a session. Exactly one terminal transition occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Awaiting further interactions
    Active,
    /// Terminated by reaching a terminal step
    Complete,
    /// Terminated by the idle timeout
    Cancelled,
}

/// What the caller should do after feeding a selection in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The selection was dropped; session state is unchanged
    Rejected,
    /// Render the prompt for this step
    Prompt(Step),
    /// The flow is complete; hand the session to the completion handler
    Complete,
}

enum Evaluation {
    Rejected,
    Repage(usize),
    Next(Step),
    Complete,
}

/// Per-invocation flow state.
#[derive(Debug, Clone)]
pub struct Session {
    id: u64,
    initiator: u64,
    guild: u64,
    kind: FlowKind,
    step: Step,
    fields: Fields,
    status: FlowStatus,
    deadline: DateTime<Utc>,
    idle_window: Duration,
    settings: FlowSettings,
}

impl Session {
    /// Starts a session at the first step of `kind`, with the idle deadline
    /// running from `now`.
    #[must_use]
    pub fn new(
        id: u64,
        initiator: u64,
        guild: u64,
        kind: FlowKind,
        settings: FlowSettings,
        idle_window: std::time::Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let idle_window =
            Duration::from_std(idle_window).unwrap_or_else(|_| Duration::seconds(30));
        Self {
            id,
            initiator,
            guild,
            kind,
            step: flow::first_step(kind),
            fields: Fields::new(),
            status: FlowStatus::Active,
            deadline: now + idle_window,
            idle_window,
            settings,
        }
    }

    /// Pre-populates a field before the first prompt (ATO command options).
    pub fn seed(&mut self, key: &str, value: &str) {
        self.fields.insert(key, value);
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The only user allowed to advance this session.
    #[must_use]
    pub const fn initiator(&self) -> u64 {
        self.initiator
    }

    /// Guild scope for reservations and serials.
    #[must_use]
    pub const fn guild(&self) -> u64 {
        self.guild
    }

    /// Which step-catalog table applies.
    #[must_use]
    pub const fn kind(&self) -> FlowKind {
        self.kind
    }

    /// The currently active step.
    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    /// The selections recorded so far.
    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> FlowStatus {
        self.status
    }

    /// Whether the idle deadline has passed without an accepted interaction.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    /// Time left until the idle deadline; zero once expired. Rejected
    /// interactions do not refresh the deadline, so the interaction driver
    /// waits on this rather than a fixed window.
    #[must_use]
    pub fn idle_remaining(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.deadline - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }

    fn evaluate(&self, selection: &Selection, now: DateTime<Utc>) -> Evaluation {
        if self.status != FlowStatus::Active
            || selection.actor != self.initiator
            || self.is_expired(now)
            || selection.menu != self.step.menu_id()
        {
            return Evaluation::Rejected;
        }
        match flow::next_step(
            self.kind,
            self.step,
            selection.value(),
            &self.fields,
            self.settings,
        ) {
            Transition::Stay => Evaluation::Rejected,
            Transition::Repage(page) => Evaluation::Repage(page),
            Transition::Next(step) => Evaluation::Next(step),
            Transition::Complete => Evaluation::Complete,
        }
    }

    /// Computes the outcome of a selection without mutating the session.
    ///
    /// Callers that must resolve options for the next prompt (which can fail
    /// on an unknown reference) preview first and [`Session::advance`] only
    /// once the prompt can actually be rendered, so a failed lookup never
    /// advances the flow.
    #[must_use]
    pub fn preview(&self, selection: &Selection, now: DateTime<Utc>) -> Outcome {
        match self.evaluate(selection, now) {
            Evaluation::Rejected => Outcome::Rejected,
            Evaluation::Repage(page) => Outcome::Prompt(Step::Scl { page }),
            Evaluation::Next(step) => Outcome::Prompt(step),
            Evaluation::Complete => Outcome::Complete,
        }
    }

    /// Feeds a selection into the session, mutating state on acceptance.
    pub fn advance(&mut self, selection: &Selection, now: DateTime<Utc>) -> Outcome {
        match self.evaluate(selection, now) {
            Evaluation::Rejected => Outcome::Rejected,
            Evaluation::Repage(page) => {
                // page navigation is not a field selection
                self.step = Step::Scl { page };
                self.deadline = now + self.idle_window;
                Outcome::Prompt(self.step)
            }
            Evaluation::Next(step) => {
                self.fields
                    .insert(self.step.menu_id(), &selection.joined());
                self.step = step;
                self.deadline = now + self.idle_window;
                Outcome::Prompt(step)
            }
            Evaluation::Complete => {
                self.fields
                    .insert(self.step.menu_id(), &selection.joined());
                self.status = FlowStatus::Complete;
                Outcome::Complete
            }
        }
    }

    /// Terminates an active session as idle-cancelled. A session that already
    /// reached a terminal state is left untouched.
    pub fn cancel(&mut self) {
        if self.status == FlowStatus::Active {
            self.status = FlowStatus::Cancelled;
        }
    }
}
