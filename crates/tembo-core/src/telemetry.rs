//! Counters describing how much the archive currently holds.
//!
//! The archive reports its own figures through [`Archive::counters`]. Host
//! figures (resident memory and the like) come from a [`HostSampler`], which
//! the core only knows as a trait; [`NullSampler`] is the stand-in when no host
//! sampler is wired up. A [`TelemetryLog`] keeps labelled snapshots so two
//! stages of a run can be compared.

#![allow(clippy::cast_possible_wrap)]

use std::mem::size_of;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive::Archive;
use crate::lifecycle::LifecycleState;
use crate::model::{Elephant, ElephantId, Event, Herd, HerdId, WaterSource};

/// Figures the archive reports about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveCounters {
    /// Elephants, herds, events and water sources currently stored.
    pub live_entities: usize,
    pub live_elephants: usize,
    pub orphaned: usize,
    pub collected_total: u64,
    /// Stored relation links between entities.
    pub relation_links: usize,
    /// Rough size of the entity storage, in bytes.
    pub approx_heap_bytes: usize,
}

impl Archive {
    /// Every stored entity of every kind.
    #[must_use]
    pub fn live_entity_count(&self) -> usize {
        self.elephants.len() + self.herds.len() + self.events.len() + self.water_sources.len()
    }

    #[must_use]
    pub fn live_elephant_count(&self) -> usize {
        self.elephants.len()
    }

    #[must_use]
    pub fn orphaned_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == LifecycleState::Orphaned)
            .count()
    }

    /// Elephants purged over this archive's lifetime (since the last reset).
    #[must_use]
    pub const fn collected_total(&self) -> u64 {
        self.collected_total
    }

    /// Stored links: child entries, parent slots, herd memberships (counted
    /// once per side) and event references.
    #[must_use]
    pub fn relation_link_count(&self) -> usize {
        let family: usize = self
            .elephants
            .values()
            .map(|e| e.family_edges().count())
            .sum();
        let herds: usize = self.herds.values().map(|h| h.members.len()).sum();
        let herd_back_refs = self.elephants.values().filter(|e| e.herd.is_some()).count();
        let events: usize = self
            .events
            .values()
            .map(|e| e.elephants.len() + e.herds.len())
            .sum();
        family + herds + herd_back_refs + events
    }

    /// Estimate of the bytes held by entity storage and the relation lists.
    ///
    /// Counts struct sizes plus heap payloads (names, id lists, availability
    /// records, visit logs). Index and hash-table overhead is not included.
    #[must_use]
    pub fn approx_heap_bytes(&self) -> usize {
        let elephants: usize = self
            .elephants
            .values()
            .map(|e| {
                size_of::<Elephant>()
                    + e.name.capacity()
                    + e.children.capacity() * size_of::<ElephantId>()
            })
            .sum();
        let herds: usize = self
            .herds
            .values()
            .map(|h| {
                size_of::<Herd>()
                    + h.name.capacity()
                    + h.territory.capacity()
                    + h.members.len() * size_of::<ElephantId>()
            })
            .sum();
        let events: usize = self
            .events
            .values()
            .map(|e| {
                size_of::<Event>()
                    + e.description.capacity()
                    + e.elephants.capacity() * size_of::<ElephantId>()
                    + e.herds.capacity() * size_of::<HerdId>()
            })
            .sum();
        let sources: usize = self
            .water_sources
            .values()
            .map(|s| {
                size_of::<WaterSource>()
                    + s.name.capacity()
                    + s.availability.len() * 24
                    + s.visits
                        .values()
                        .map(|v| size_of::<i32>() + v.capacity() * size_of::<ElephantId>())
                        .sum::<usize>()
            })
            .sum();
        elephants + herds + events + sources + self.tombstones.len() * size_of::<ElephantId>()
    }

    #[must_use]
    pub fn counters(&self) -> ArchiveCounters {
        ArchiveCounters {
            live_entities: self.live_entity_count(),
            live_elephants: self.live_elephant_count(),
            orphaned: self.orphaned_count(),
            collected_total: self.collected_total,
            relation_links: self.relation_link_count(),
            approx_heap_bytes: self.approx_heap_bytes(),
        }
    }
}

/// Figures sampled from the host process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostSample {
    pub resident_bytes: Option<u64>,
    pub peak_resident_bytes: Option<u64>,
    pub virtual_bytes: Option<u64>,
}

/// Source of host process figures.
pub trait HostSampler {
    /// Short name shown next to the figures.
    fn name(&self) -> &'static str;

    /// Take a sample. Fields the host cannot provide stay `None`.
    fn sample(&self) -> HostSample;
}

/// Sampler that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSampler;

impl HostSampler for NullSampler {
    fn name(&self) -> &'static str {
        "none"
    }

    fn sample(&self) -> HostSample {
        HostSample::default()
    }
}

/// One labelled reading of archive and host figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub label: String,
    pub taken_at: DateTime<Utc>,
    pub archive: ArchiveCounters,
    pub host: HostSample,
}

/// Signed differences between two snapshots (`to - from`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDelta {
    pub live_entities: i64,
    pub live_elephants: i64,
    pub orphaned: i64,
    pub collected: i64,
    pub relation_links: i64,
    pub approx_heap_bytes: i64,
    pub resident_bytes: Option<i64>,
}

/// Ordered list of labelled snapshots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetryLog {
    snapshots: Vec<TelemetrySnapshot>,
}

impl TelemetryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current figures under `label` and return them.
    pub fn take(
        &mut self,
        label: impl Into<String>,
        archive: &Archive,
        sampler: &dyn HostSampler,
    ) -> &TelemetrySnapshot {
        let snapshot = TelemetrySnapshot {
            label: label.into(),
            taken_at: Utc::now(),
            archive: archive.counters(),
            host: sampler.sample(),
        };
        tracing::debug!(
            label = %snapshot.label,
            live_entities = snapshot.archive.live_entities,
            orphaned = snapshot.archive.orphaned,
            "telemetry snapshot"
        );
        self.snapshots.push(snapshot);
        &self.snapshots[self.snapshots.len() - 1]
    }

    #[must_use]
    pub fn snapshots(&self) -> &[TelemetrySnapshot] {
        &self.snapshots
    }

    /// Most recent snapshot with this label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&TelemetrySnapshot> {
        self.snapshots.iter().rev().find(|s| s.label == label)
    }

    /// Difference between the snapshots labelled `from` and `to`.
    #[must_use]
    pub fn compare(&self, from: &str, to: &str) -> Option<SnapshotDelta> {
        Some(delta(self.get(from)?, self.get(to)?))
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

fn diff(to: usize, from: usize) -> i64 {
    to as i64 - from as i64
}

/// `to - from` for every figure.
#[must_use]
pub fn delta(from: &TelemetrySnapshot, to: &TelemetrySnapshot) -> SnapshotDelta {
    let (a, b) = (&from.archive, &to.archive);
    SnapshotDelta {
        live_entities: diff(b.live_entities, a.live_entities),
        live_elephants: diff(b.live_elephants, a.live_elephants),
        orphaned: diff(b.orphaned, a.orphaned),
        collected: b.collected_total as i64 - a.collected_total as i64,
        relation_links: diff(b.relation_links, a.relation_links),
        approx_heap_bytes: diff(b.approx_heap_bytes, a.approx_heap_bytes),
        resident_bytes: from
            .host
            .resident_bytes
            .zip(to.host.resident_bytes)
            .map(|(x, y)| y as i64 - x as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::BreakScope;
    use crate::model::{ElephantAttrs, EventAttrs, EventKind, Gender, HerdAttrs};

    fn populated() -> (Archive, ElephantId, ElephantId) {
        let mut a = Archive::default();
        let mother = a
            .create_elephant(ElephantAttrs::new("Ella", Gender::Female, 1970), None, None)
            .unwrap_or_else(|e| panic!("{e}"));
        let calf = a
            .create_elephant(
                ElephantAttrs::new("Eli", Gender::Male, 1990),
                Some(mother),
                None,
            )
            .unwrap_or_else(|e| panic!("{e}"));
        let herd = a.create_herd(HerdAttrs::new("Herd_A_1", "Delta Region"));
        assert!(a.assign_herd(mother, herd).is_ok());
        assert!(a
            .create_event(EventAttrs::new(EventKind::Birth, 1990).involving([calf]))
            .is_ok());
        (a, mother, calf)
    }

    #[test]
    fn counts_every_kind() {
        let (a, _, _) = populated();
        assert_eq!(a.live_entity_count(), 4);
        assert_eq!(a.live_elephant_count(), 2);
        // child entry + mother slot + herd both sides + event reference
        assert_eq!(a.relation_link_count(), 5);
        assert!(a.approx_heap_bytes() > 0);
    }

    #[test]
    fn tombstones_count_as_elephant_ids() {
        let mut a = Archive::default();
        assert_eq!(a.approx_heap_bytes(), 0);
        let lone = a
            .create_elephant(ElephantAttrs::new("Ella", Gender::Female, 1970), None, None)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(a.break_references(BreakScope::Elephants(vec![lone])).is_ok());
        a.run_collection();
        assert_eq!(a.approx_heap_bytes(), size_of::<ElephantId>());
    }

    #[test]
    fn log_compares_stages() {
        let (mut a, mother, _) = populated();
        let mut log = TelemetryLog::new();
        log.take("populated", &a, &NullSampler);
        assert!(a.break_references(BreakScope::Family(mother)).is_ok());
        log.take("broken", &a, &NullSampler);
        a.run_collection();
        log.take("collected", &a, &NullSampler);

        let broken = log.compare("populated", "broken");
        assert_eq!(broken.map(|d| (d.orphaned, d.live_elephants)), Some((2, 0)));

        let collected = log.compare("populated", "collected");
        assert_eq!(
            collected.map(|d| (d.live_elephants, d.collected, d.orphaned)),
            Some((-2, 2, 0))
        );
        assert_eq!(collected.and_then(|d| d.resident_bytes), None);
        assert!(log.compare("populated", "missing").is_none());
        assert_eq!(log.snapshots().len(), 3);
    }
}
