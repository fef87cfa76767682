use std::cell::Cell;
use std::collections::BTreeMap;

use serde::Serialize;
use tembo_core::EventKind;
use tembo_core::index::IndexSizes;

/// Per-query lookup counters.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) nearest: Cell<u64>,
    pub(crate) drought_history: Cell<u64>,
    pub(crate) events_by_year: Cell<u64>,
    pub(crate) events_in_range: Cell<u64>,
    pub(crate) events_for_elephant: Cell<u64>,
    pub(crate) events_by_kind: Cell<u64>,
    pub(crate) elephants_named: Cell<u64>,
    pub(crate) timeline: Cell<u64>,
    pub(crate) migration_alerts: Cell<u64>,
    pub(crate) events_near: Cell<u64>,
    pub(crate) elephants_born: Cell<u64>,
    pub(crate) herds_named: Cell<u64>,
    pub(crate) visit_history: Cell<u64>,
}

pub(crate) fn bump(counter: &Cell<u64>) {
    counter.set(counter.get().saturating_add(1));
}

impl Counters {
    pub(crate) fn snapshot(&self) -> LookupCounts {
        LookupCounts {
            nearest: self.nearest.get(),
            drought_history: self.drought_history.get(),
            events_by_year: self.events_by_year.get(),
            events_in_range: self.events_in_range.get(),
            events_for_elephant: self.events_for_elephant.get(),
            events_by_kind: self.events_by_kind.get(),
            elephants_named: self.elephants_named.get(),
            timeline: self.timeline.get(),
            migration_alerts: self.migration_alerts.get(),
            events_near: self.events_near.get(),
            elephants_born: self.elephants_born.get(),
            herds_named: self.herds_named.get(),
            visit_history: self.visit_history.get(),
        }
    }
}

/// How often each query ran on one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LookupCounts {
    pub nearest: u64,
    pub drought_history: u64,
    pub events_by_year: u64,
    pub events_in_range: u64,
    pub events_for_elephant: u64,
    pub events_by_kind: u64,
    pub elephants_named: u64,
    pub timeline: u64,
    pub migration_alerts: u64,
    pub events_near: u64,
    /// Birth-year lookups, single year and range together.
    pub elephants_born: u64,
    pub herds_named: u64,
    pub visit_history: u64,
}

impl LookupCounts {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.nearest
            + self.drought_history
            + self.events_by_year
            + self.events_in_range
            + self.events_for_elephant
            + self.events_by_kind
            + self.elephants_named
            + self.timeline
            + self.migration_alerts
            + self.events_near
            + self.elephants_born
            + self.herds_named
            + self.visit_history
    }
}

/// Index sizes plus lookup counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStats {
    pub indexes: IndexSizes,
    pub herds: usize,
    pub water_sources: usize,
    /// Stored events per kind; kinds with no events are omitted.
    pub events_per_kind: BTreeMap<EventKind, usize>,
    pub lookups: LookupCounts,
}
