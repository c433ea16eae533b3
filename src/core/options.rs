//! Option resolver - computes the selectable choices for a step.
//!
//! The resolver works from a fresh reservation snapshot every time it is
//! called; snapshots are never cached across steps because another session
//! may commit (or a plan may lapse) between prompts. Steps with a fixed
//! option set (duration, flight size, routing choice) bypass the snapshot.

use crate::config::refdata::{Callsign, RangeData};
use crate::core::flow::Step;
use crate::core::session::Fields;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Discord renders at most this many options per select menu.
pub const MENU_LIMIT: usize = 25;

/// SCL pages leave one slot for the navigation sentinel.
pub const SCL_PAGE: usize = MENU_LIMIT - 1;

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuChoice {
    /// Text shown to the user
    pub label: String,
    /// Underlying value delivered back on selection
    pub value: String,
    /// Optional sublabel
    pub description: Option<String>,
}

impl MenuChoice {
    /// A plain label/value option.
    #[must_use]
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            description: None,
        }
    }

    fn described(label: &str, value: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            description: Some(description.to_string()),
        }
    }
}

/// The resource keys held by one currently active record, as read back from
/// the reservation store. A snapshot, not a live view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Reserved range id (or zone value for general-flying plans)
    pub range: Option<String>,
    /// Owning complex of the reserved range
    pub complex: Option<String>,
    /// Reserved altitude block id
    pub block: Option<String>,
    /// Reserved flight label
    pub flight: Option<String>,
    /// When the reservation lapses
    pub expires_at: DateTime<Utc>,
}

fn reserved_ranges(reservations: &[Reservation]) -> HashSet<&str> {
    reservations
        .iter()
        .filter_map(|r| r.range.as_deref())
        .collect()
}

/// Resolves the option list for each step against the reference dataset.
pub struct OptionResolver<'a> {
    data: &'a RangeData,
}

impl<'a> OptionResolver<'a> {
    /// Creates a resolver over the injected reference dataset.
    #[must_use]
    pub const fn new(data: &'a RangeData) -> Self {
        Self { data }
    }

    /// Produces the ordered, reservation-filtered options for `step`.
    ///
    /// `callsign` is required for the flight and SCL steps; `roster` supplies
    /// the pilot names for the ATO pilot-assignment step.
    ///
    /// # Errors
    /// [`Error::UnknownRange`] / [`Error::UnknownAirframe`] when a field
    /// references an id missing from the dataset (the caller renders a
    /// distinct error prompt), [`Error::UnknownCallsign`] when a step needs a
    /// callsign and none was supplied.
    pub fn resolve(
        &self,
        step: Step,
        fields: &Fields,
        reservations: &[Reservation],
        callsign: Option<&Callsign>,
        roster: &[String],
    ) -> Result<Vec<MenuChoice>> {
        match step {
            Step::Tasking => Ok(self
                .data
                .taskings
                .iter()
                .map(|c| MenuChoice::new(&c.label, &c.value))
                .collect()),
            Step::Zone => {
                let taken = reserved_ranges(reservations);
                Ok(self
                    .data
                    .zones
                    .iter()
                    .filter(|z| !taken.contains(z.value.as_str()))
                    .map(|z| MenuChoice::new(&z.label, &z.value))
                    .collect())
            }
            Step::Complex => Ok(self.complexes(reservations)),
            Step::Range => self.ranges(fields, reservations),
            Step::Block => self.blocks(fields, reservations),
            Step::JtacRange => {
                let taken = reserved_ranges(reservations);
                Ok(self
                    .data
                    .ranges
                    .iter()
                    .filter(|r| r.jtac && r.active && !taken.contains(r.id.as_str()))
                    .map(|r| MenuChoice::new(&r.name, &r.id))
                    .collect())
            }
            Step::Duration => Ok(self
                .data
                .durations
                .iter()
                .map(|d| MenuChoice::new(&d.label, &d.value))
                .collect()),
            Step::FlightSize => Ok(["1", "2", "3", "4"]
                .iter()
                .map(|n| MenuChoice::new(n, n))
                .collect()),
            Step::Flight => self.flights(reservations, callsign),
            Step::Routing => Ok(vec![
                MenuChoice::described(
                    "Auto",
                    "1",
                    "Let Opso Bot plan your route auto-magically!",
                ),
                MenuChoice::described("Custom", "2", "Be boring and use Combined Ops..."),
            ]),
            Step::Departure => self.procedures(&self.data.departures, fields),
            Step::Approach => self.procedures(&self.data.approaches, fields),
            Step::Scl { page } => self.scls(fields, callsign, page),
            Step::Pilots => Ok(roster
                .iter()
                .take(MENU_LIMIT)
                .map(|name| MenuChoice::new(name, name))
                .collect()),
        }
    }

    /// A complex stays selectable only while it has at least one free range.
    fn complexes(&self, reservations: &[Reservation]) -> Vec<MenuChoice> {
        let taken = reserved_ranges(reservations);
        self.data
            .complexes
            .iter()
            .filter(|c| {
                self.data
                    .ranges
                    .iter()
                    .any(|r| r.complex == c.id && r.active && !taken.contains(r.id.as_str()))
            })
            .map(|c| MenuChoice::new(&c.label, &c.id))
            .collect()
    }

    fn ranges(&self, fields: &Fields, reservations: &[Reservation]) -> Result<Vec<MenuChoice>> {
        let complex = fields.get("complex").ok_or_else(|| Error::Config {
            message: "range step reached without a complex selection".to_string(),
        })?;
        if !self.data.complexes.iter().any(|c| c.id == complex) {
            return Err(Error::UnknownRange {
                id: complex.to_string(),
            });
        }
        let taken = reserved_ranges(reservations);
        Ok(self
            .data
            .ranges
            .iter()
            .filter(|r| r.complex == complex && r.active && !taken.contains(r.id.as_str()))
            .map(|r| MenuChoice::new(&r.name, &r.id))
            .collect())
    }

    /// Blocks are contended per complex: a block held by any plan in the same
    /// complex is unavailable on every range of that complex.
    fn blocks(&self, fields: &Fields, reservations: &[Reservation]) -> Result<Vec<MenuChoice>> {
        let range_id = fields.get("range").ok_or_else(|| Error::Config {
            message: "block step reached without a range selection".to_string(),
        })?;
        let range = self.data.range(range_id)?;
        let taken: HashSet<&str> = reservations
            .iter()
            .filter(|r| r.complex.as_deref() == Some(range.complex.as_str()))
            .filter_map(|r| r.block.as_deref())
            .collect();
        Ok(range
            .blocks
            .iter()
            .filter(|id| !taken.contains(id.as_str()))
            .map(|id| MenuChoice::new(self.data.block_label(id), id))
            .collect())
    }

    fn flights(
        &self,
        reservations: &[Reservation],
        callsign: Option<&Callsign>,
    ) -> Result<Vec<MenuChoice>> {
        let callsign = callsign.ok_or(Error::UnknownCallsign)?;
        let taken: HashSet<&str> = reservations
            .iter()
            .filter_map(|r| r.flight.as_deref())
            .collect();
        Ok(self
            .data
            .elements
            .iter()
            .map(|element| format!("{} {element}", callsign.callsign))
            .filter(|flight| !taken.contains(flight.as_str()))
            .map(|flight| MenuChoice::new(&flight, &flight))
            .collect())
    }

    fn procedures(
        &self,
        procedures: &[crate::config::refdata::Procedure],
        fields: &Fields,
    ) -> Result<Vec<MenuChoice>> {
        let range_id = fields.get("range").ok_or_else(|| Error::Config {
            message: "routing step reached without a range selection".to_string(),
        })?;
        // surfaces an unknown id as a distinct error, not an empty list
        let range = self.data.range(range_id)?;
        Ok(procedures
            .iter()
            .filter(|p| p.routings.iter().any(|r| r.range == range.id))
            .map(|p| MenuChoice::new(&p.label, &p.id))
            .collect())
    }

    /// Select menus hold at most 25 items; SCL pages carry 24 plus a prompt
    /// to load the next page or start over.
    fn scls(
        &self,
        fields: &Fields,
        callsign: Option<&Callsign>,
        page: usize,
    ) -> Result<Vec<MenuChoice>> {
        let callsign = callsign.ok_or(Error::UnknownCallsign)?;
        let airframe = self.data.airframe(&callsign.airframe)?;
        let wanted = fields.get("scl-type").unwrap_or("AG");
        let scls: Vec<&str> = airframe
            .scls
            .iter()
            .filter(|s| s.kind == wanted)
            .map(|s| s.scl.as_str())
            .collect();

        let mut sliced: Vec<MenuChoice> = scls
            .iter()
            .skip(page * SCL_PAGE)
            .take(SCL_PAGE)
            .map(|scl| MenuChoice::new(scl, scl))
            .collect();

        if (page + 1) * SCL_PAGE < scls.len() {
            sliced.push(MenuChoice::new(
                "Show more SCLs",
                &(page + 1).to_string(),
            ));
        } else {
            sliced.push(MenuChoice::new("Back to top", "0"));
        }
        Ok(sliced)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{reservation, sample_refdata};

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        let mut fields = Fields::new();
        for (k, v) in pairs {
            fields.insert(k, v);
        }
        fields
    }

    #[test]
    fn test_reserved_ranges_are_excluded() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        let reservations = vec![reservation("RANGE7", Some("EAST"), Some("B1"), "VIPER 1")];

        let session_fields = fields(&[("taskings", "AG"), ("complex", "EAST")]);
        let choices = resolver
            .resolve(Step::Range, &session_fields, &reservations, None, &[])
            .unwrap();

        let reserved: HashSet<&str> = reservations
            .iter()
            .filter_map(|r| r.range.as_deref())
            .collect();
        assert!(choices.iter().all(|c| !reserved.contains(c.value.as_str())));
        assert!(choices.iter().any(|c| c.value == "RANGE9"));
    }

    #[test]
    fn test_complex_with_no_free_range_is_excluded() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        // WEST holds a single range; reserving it empties the complex
        let reservations = vec![reservation("RANGE12", Some("WEST"), None, "BOAR 1")];

        let choices = resolver
            .resolve(Step::Complex, &Fields::new(), &reservations, None, &[])
            .unwrap();
        assert!(choices.iter().any(|c| c.value == "EAST"));
        assert!(!choices.iter().any(|c| c.value == "WEST"));
    }

    #[test]
    fn test_blocks_filtered_within_complex() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        // a plan on another EAST range holding B1 blocks it here too
        let reservations = vec![reservation("RANGE9", Some("EAST"), Some("B1"), "VIPER 2")];

        let session_fields = fields(&[("range", "RANGE7")]);
        let choices = resolver
            .resolve(Step::Block, &session_fields, &reservations, None, &[])
            .unwrap();
        assert!(!choices.iter().any(|c| c.value == "B1"));
        assert!(choices.iter().any(|c| c.value == "B2"));
        // labels come from the block table, values stay ids
        assert_eq!(
            choices.iter().find(|c| c.value == "B2").unwrap().label,
            "FL240-FL300"
        );
    }

    #[test]
    fn test_unknown_range_is_an_error_not_an_empty_list() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        let session_fields = fields(&[("range", "RANGE99")]);

        let result = resolver.resolve(Step::Block, &session_fields, &[], None, &[]);
        assert!(matches!(result, Err(Error::UnknownRange { id }) if id == "RANGE99"));
    }

    #[test]
    fn test_flights_compose_callsign_and_skip_reserved() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        let callsign = data.callsigns[0].clone();
        let reservations = vec![reservation("RANGE7", Some("EAST"), Some("B1"), "VIPER 1")];

        let choices = resolver
            .resolve(Step::Flight, &Fields::new(), &reservations, Some(&callsign), &[])
            .unwrap();
        let values: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
        assert!(!values.contains(&"VIPER 1"));
        assert!(values.contains(&"VIPER 2"));

        // no mapped role, no flight menu
        assert!(matches!(
            resolver.resolve(Step::Flight, &Fields::new(), &[], None, &[]),
            Err(Error::UnknownCallsign)
        ));
    }

    #[test]
    fn test_fixed_steps_ignore_reservations() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        let reservations = vec![reservation("RANGE7", Some("EAST"), Some("B1"), "VIPER 1")];

        let durations = resolver
            .resolve(Step::Duration, &Fields::new(), &reservations, None, &[])
            .unwrap();
        assert_eq!(durations.len(), data.durations.len());

        let sizes = resolver
            .resolve(Step::FlightSize, &Fields::new(), &reservations, None, &[])
            .unwrap();
        assert_eq!(sizes.len(), 4);

        let routings = resolver
            .resolve(Step::Routing, &Fields::new(), &reservations, None, &[])
            .unwrap();
        assert_eq!(routings.len(), 2);
        assert_eq!(routings[0].value, "1");
    }

    #[test]
    fn test_scl_pagination_with_fifty_candidates() {
        let mut data = sample_refdata();
        data.airframes[0].scls = (0..50)
            .map(|i| crate::config::refdata::Scl {
                scl: format!("LOAD-{i:02}"),
                kind: "AG".to_string(),
            })
            .collect();
        let resolver = OptionResolver::new(&data);
        let callsign = data.callsigns[0].clone();
        let session_fields = fields(&[("scl-type", "AG")]);

        let page0 = resolver
            .resolve(Step::Scl { page: 0 }, &session_fields, &[], Some(&callsign), &[])
            .unwrap();
        assert_eq!(page0.len(), 25);
        assert_eq!(page0.last().unwrap().label, "Show more SCLs");
        assert_eq!(page0.last().unwrap().value, "1");

        let page1 = resolver
            .resolve(Step::Scl { page: 1 }, &session_fields, &[], Some(&callsign), &[])
            .unwrap();
        assert_eq!(page1.len(), 25);
        assert_eq!(page1.last().unwrap().value, "2");

        let page2 = resolver
            .resolve(Step::Scl { page: 2 }, &session_fields, &[], Some(&callsign), &[])
            .unwrap();
        assert_eq!(page2.len(), 3);
        assert_eq!(page2.last().unwrap().label, "Back to top");
        assert_eq!(page2.last().unwrap().value, "0");
    }

    #[test]
    fn test_scl_kind_filter() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        let callsign = data.callsigns[0].clone();

        let aa = resolver
            .resolve(
                Step::Scl { page: 0 },
                &fields(&[("scl-type", "AA")]),
                &[],
                Some(&callsign),
                &[],
            )
            .unwrap();
        // every real option is an AA load; the sentinel has no kind
        assert!(aa.len() > 1);
        assert!(
            aa[..aa.len() - 1]
                .iter()
                .all(|c| data.airframes[0]
                    .scls
                    .iter()
                    .any(|s| s.scl == c.value && s.kind == "AA"))
        );
    }

    #[test]
    fn test_departures_filtered_by_range_routing() {
        let data = sample_refdata();
        let resolver = OptionResolver::new(&data);
        let session_fields = fields(&[("range", "RANGE7")]);

        let choices = resolver
            .resolve(Step::Departure, &session_fields, &[], None, &[])
            .unwrap();
        assert!(choices.iter().any(|c| c.value == "KUT-E"));
        assert!(!choices.iter().any(|c| c.value == "SEN-N"));
    }
}
