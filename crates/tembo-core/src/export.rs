//! Serializable snapshot of a whole archive.
//!
//! Relations are written as ids and every list is id-sorted, so two exports
//! of equal archives are byte-identical JSON.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::archive::Archive;
use crate::lifecycle::LifecycleState;
use crate::model::{
    Availability, Capacity, ElephantId, EventId, EventKind, EventLocation, Gender, HerdId, Point,
    WaterSourceId,
};
use crate::telemetry::ArchiveCounters;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveSnapshot {
    pub elephants: Vec<ElephantRecord>,
    pub herds: Vec<HerdRecord>,
    pub events: Vec<EventRecord>,
    pub water_sources: Vec<WaterSourceRecord>,
    pub roots: Vec<ElephantId>,
    pub counters: ArchiveCounters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElephantRecord {
    pub id: ElephantId,
    pub name: String,
    pub gender: Gender,
    pub birth_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i32>,
    pub mother: Option<ElephantId>,
    pub father: Option<ElephantId>,
    pub children: Vec<ElephantId>,
    pub herd: Option<HerdId>,
    pub lifecycle: LifecycleState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HerdRecord {
    pub id: HerdId,
    pub name: String,
    pub territory: String,
    pub members: Vec<ElephantId>,
    pub matriarch: Option<ElephantId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: EventId,
    pub kind: EventKind,
    pub year: i32,
    pub description: String,
    pub elephants: Vec<ElephantId>,
    pub herds: Vec<HerdId>,
    pub location: Option<EventLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterSourceRecord {
    pub id: WaterSourceId,
    pub name: String,
    pub position: Point,
    pub capacity: Capacity,
    pub availability: BTreeMap<i32, Availability>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub visits: BTreeMap<i32, Vec<ElephantId>>,
}

impl Archive {
    /// Snapshot every stored entity for serialization.
    #[must_use]
    pub fn export(&self) -> ArchiveSnapshot {
        let elephants = self
            .elephant_ids()
            .into_iter()
            .filter_map(|id| self.elephants.get(&id))
            .map(|e| ElephantRecord {
                id: e.id,
                name: e.name.clone(),
                gender: e.gender,
                birth_year: e.birth_year,
                death_year: e.death_year,
                mother: e.mother,
                father: e.father,
                children: e.children.clone(),
                herd: e.herd,
                lifecycle: self
                    .states
                    .get(&e.id)
                    .copied()
                    .unwrap_or(LifecycleState::Linked),
            })
            .collect();

        let herds = self
            .herd_ids()
            .into_iter()
            .filter_map(|id| self.herds.get(&id))
            .map(|h| HerdRecord {
                id: h.id,
                name: h.name.clone(),
                territory: h.territory.clone(),
                members: h.members.iter().copied().collect(),
                matriarch: self.matriarch(h.id).ok().flatten(),
            })
            .collect();

        let events = self
            .event_ids()
            .into_iter()
            .filter_map(|id| self.events.get(&id))
            .map(|e| EventRecord {
                id: e.id,
                kind: e.kind,
                year: e.year,
                description: e.description.clone(),
                elephants: e.elephants.clone(),
                herds: e.herds.clone(),
                location: e.location,
            })
            .collect();

        let water_sources = self
            .water_source_ids()
            .into_iter()
            .filter_map(|id| self.water_sources.get(&id))
            .map(|s| WaterSourceRecord {
                id: s.id,
                name: s.name.clone(),
                position: s.position,
                capacity: s.capacity,
                availability: s.availability.clone(),
                visits: s.visits.clone(),
            })
            .collect();

        ArchiveSnapshot {
            elephants,
            herds,
            events,
            water_sources,
            roots: self.roots.iter().copied().collect(),
            counters: self.counters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::BreakScope;
    use crate::model::{ElephantAttrs, EventAttrs, WaterSourceAttrs};

    #[test]
    fn export_is_sorted_and_tagged() {
        let mut a = Archive::default();
        let mother = a
            .create_elephant(ElephantAttrs::new("Ella", Gender::Female, 1970), None, None)
            .unwrap_or_else(|e| panic!("{e}"));
        let loner = a
            .create_elephant(ElephantAttrs::new("Otto", Gender::Male, 1975), None, None)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(a.break_references(BreakScope::Elephants(vec![loner])).is_ok());
        let source = a
            .create_water_source(WaterSourceAttrs::new("Savuti Channel", 1.0, 2.0).record(2019, false))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(a
            .create_event(
                EventAttrs::new(EventKind::Drought, 2019)
                    .at(EventLocation::WaterSource(source))
                    .involving([mother])
            )
            .is_ok());
        assert_eq!(a.record_visit(source, 2018, mother), Ok(true));

        let snap = a.export();
        let ids: Vec<_> = snap.elephants.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![mother, loner]);
        assert_eq!(snap.elephants[1].lifecycle, LifecycleState::Orphaned);
        assert_eq!(snap.roots, vec![mother]);

        let json = serde_json::to_value(&snap).unwrap_or_default();
        assert_eq!(json["elephants"][0]["gender"], "female");
        assert_eq!(json["water_sources"][0]["availability"]["2019"], false);
        assert_eq!(json["water_sources"][0]["visits"]["2018"][0], mother.get());
        assert_eq!(json["counters"]["orphaned"], 1);
    }
}
