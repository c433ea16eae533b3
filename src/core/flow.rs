//! Step catalog - the flow state machine.
//!
//! Transitions are an exhaustive match over `(flow kind, step, selection)`,
//! so an illegal combination is an explicit [`Transition::Stay`] rather than
//! a silently skipped branch. The tasking selected early in the flow decides
//! the later branches (JTAC and CAS skip the flight-size step, only
//! air-to-ground flights are offered auto-routing).

use crate::config::settings::FlowSettings;
use crate::core::session::Fields;

/// Which step-catalog table applies to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// The interactive flight-plan filing flow
    FlightPlan,
    /// The air-tasking-order filing flow
    Ato,
}

impl FlowKind {
    /// Storage discriminator for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FlightPlan => "flight_plan",
            Self::Ato => "ato",
        }
    }

    /// Parses the storage discriminator back into a kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "flight_plan" => Some(Self::FlightPlan),
            "ato" => Some(Self::Ato),
            _ => None,
        }
    }
}

/// A single prompt/selection stage within a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Tasking selection (GF/AA/AG/CAS/JTAC)
    Tasking,
    /// Zone selection for general-flying taskings
    Zone,
    /// Range complex selection for air-to-ground taskings
    Complex,
    /// Range selection within the chosen complex
    Range,
    /// Altitude block selection on the chosen range
    Block,
    /// JTAC-capable range selection for CAS/JTAC taskings
    JtacRange,
    /// Estimated duration
    Duration,
    /// Number of aircraft in the element
    FlightSize,
    /// Flight callsign selection
    Flight,
    /// Auto vs. manual routing choice
    Routing,
    /// Departure procedure (auto routing only)
    Departure,
    /// Approach procedure (auto routing only)
    Approach,
    /// Paginated SCL selection (ATO flow)
    Scl {
        /// Zero-based page into the airframe's SCL table
        page: usize,
    },
    /// Pilot assignment (ATO flow)
    Pilots,
}

impl Step {
    /// The select-menu custom id for this step; selections are recorded into
    /// the session fields under the same key.
    #[must_use]
    pub const fn menu_id(&self) -> &'static str {
        match self {
            Self::Tasking => "taskings",
            Self::Zone => "zones",
            Self::Complex => "complex",
            Self::Range => "range",
            Self::Block => "block",
            Self::JtacRange => "jtac-range",
            Self::Duration => "duration",
            Self::FlightSize => "flight-size",
            Self::Flight => "flight",
            Self::Routing => "routing",
            Self::Departure => "departure",
            Self::Approach => "approach",
            Self::Scl { .. } => "scl-list",
            Self::Pilots => "pilots",
        }
    }
}

/// Result of feeding one selection into the step catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Advance to the next step, recording the selection
    Next(Step),
    /// Re-render the SCL menu at another page without recording anything
    Repage(usize),
    /// The flow is complete; record the selection and terminate
    Complete,
    /// The selection is not meaningful for this step; ignore it
    Stay,
}

/// The first step of a flow.
#[must_use]
pub const fn first_step(kind: FlowKind) -> Step {
    match kind {
        FlowKind::FlightPlan => Step::Tasking,
        FlowKind::Ato => Step::Scl { page: 0 },
    }
}

fn tasking_is(fields: &Fields, value: &str) -> bool {
    fields.get("taskings") == Some(value)
}

/// Whether this flow offers the routing-choice step at all: auto-routing must
/// be enabled and the tasking must have selected a physical range.
#[must_use]
pub fn offers_auto_route(fields: &Fields, settings: FlowSettings) -> bool {
    settings.allow_auto_route && tasking_is(fields, "AG")
}

/// Computes the transition for `(kind, step, selection)`.
///
/// `fields` holds every selection made so far, which is what the branching
/// keys off (the tasking field in particular). `selection` is the value just
/// chosen on `step` and has not been recorded yet.
#[must_use]
pub fn next_step(
    kind: FlowKind,
    step: Step,
    selection: &str,
    fields: &Fields,
    settings: FlowSettings,
) -> Transition {
    match kind {
        FlowKind::FlightPlan => next_flight_plan_step(step, selection, fields, settings),
        FlowKind::Ato => next_ato_step(step, selection),
    }
}

fn next_flight_plan_step(
    step: Step,
    selection: &str,
    fields: &Fields,
    settings: FlowSettings,
) -> Transition {
    match step {
        Step::Tasking => match selection {
            "GF" => Transition::Next(Step::Zone),
            "AA" => Transition::Next(Step::Duration),
            "AG" => Transition::Next(Step::Complex),
            "CAS" | "JTAC" => Transition::Next(Step::JtacRange),
            _ => Transition::Stay,
        },
        Step::Zone | Step::JtacRange | Step::Block => Transition::Next(Step::Duration),
        Step::Complex => Transition::Next(Step::Range),
        Step::Range => Transition::Next(Step::Block),
        Step::Duration => {
            // JTAC and CAS fly as single ships; they skip the element-size prompt
            if tasking_is(fields, "CAS") || tasking_is(fields, "JTAC") {
                Transition::Next(Step::Flight)
            } else {
                Transition::Next(Step::FlightSize)
            }
        }
        Step::FlightSize => Transition::Next(Step::Flight),
        Step::Flight => {
            if offers_auto_route(fields, settings) {
                Transition::Next(Step::Routing)
            } else {
                Transition::Complete
            }
        }
        Step::Routing => {
            if selection == "1" {
                Transition::Next(Step::Departure)
            } else {
                Transition::Complete
            }
        }
        Step::Departure => Transition::Next(Step::Approach),
        Step::Approach => Transition::Complete,
        Step::Scl { .. } | Step::Pilots => Transition::Stay,
    }
}

fn next_ato_step(step: Step, selection: &str) -> Transition {
    match step {
        Step::Scl { .. } => {
            // Navigation sentinels carry a bare page index; SCL values never do
            if let Ok(page) = selection.parse::<usize>() {
                Transition::Repage(page)
            } else {
                Transition::Next(Step::Pilots)
            }
        }
        Step::Pilots => Transition::Complete,
        _ => Transition::Stay,
    }
}
