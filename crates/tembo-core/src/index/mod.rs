//! Derived lookup structures kept in step with the entity graph.
//!
//! ## Submodules
//!
//! - [`year`]: year → event ids, insertion ordered.
//! - [`births`]: birth year → elephant ids.
//! - [`name`]: elephant name → ids, and herd name → ids.
//! - [`spatial`]: fixed-size grid over water source coordinates.
//! - [`locations`]: fixed-size grid over event positions.
//! - [`participants`]: elephant id → referencing event ids.
//! - [`visits`]: elephant id → water sources that logged it.
//!
//! Every mutation on [`Archive`](crate::archive::Archive) updates the
//! affected structures in the same call; nothing here is ever rebuilt from
//! scratch. Agreement with the graph is checked by
//! [`verify::check_archive`](crate::verify::check_archive).

pub mod births;
pub mod locations;
pub mod name;
pub mod participants;
pub mod spatial;
pub mod visits;
pub mod year;

use serde::Serialize;

pub use births::BirthYearIndex;
pub use locations::LocationGrid;
pub use name::NameIndex;
pub use participants::ParticipantIndex;
pub use spatial::{CellKey, NearestHit, SpatialGrid, suggest_cell_size};
pub use visits::VisitorIndex;
pub use year::YearIndex;

use crate::model::{
    Elephant, ElephantId, Event, EventId, Herd, HerdId, Point, WaterSource, WaterSourceId,
};

/// All indexes owned by one archive.
#[derive(Debug, Clone)]
pub struct IndexManager {
    pub(crate) years: YearIndex,
    pub(crate) births: BirthYearIndex,
    pub(crate) names: NameIndex,
    pub(crate) herd_names: NameIndex<HerdId>,
    pub(crate) spatial: SpatialGrid,
    pub(crate) locations: LocationGrid,
    pub(crate) participants: ParticipantIndex,
    pub(crate) visitors: VisitorIndex,
}

/// Sizes of every index, for stats output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexSizes {
    pub year_entries: usize,
    pub years_covered: usize,
    pub name_entries: usize,
    pub distinct_names: usize,
    pub spatial_entries: usize,
    pub spatial_cells: usize,
    pub spatial_average_occupancy: f64,
    pub participant_entries: usize,
    pub elephants_with_events: usize,
    pub birth_entries: usize,
    pub birth_years_covered: usize,
    pub herd_name_entries: usize,
    pub location_entries: usize,
    pub location_cells: usize,
    pub visitor_entries: usize,
}

impl IndexManager {
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        Self {
            years: YearIndex::default(),
            births: BirthYearIndex::default(),
            names: NameIndex::default(),
            herd_names: NameIndex::default(),
            spatial: SpatialGrid::new(cell_size),
            locations: LocationGrid::new(cell_size),
            participants: ParticipantIndex::default(),
            visitors: VisitorIndex::default(),
        }
    }

    #[must_use]
    pub const fn years(&self) -> &YearIndex {
        &self.years
    }

    #[must_use]
    pub const fn births(&self) -> &BirthYearIndex {
        &self.births
    }

    #[must_use]
    pub const fn names(&self) -> &NameIndex {
        &self.names
    }

    #[must_use]
    pub const fn herd_names(&self) -> &NameIndex<HerdId> {
        &self.herd_names
    }

    #[must_use]
    pub const fn locations(&self) -> &LocationGrid {
        &self.locations
    }

    #[must_use]
    pub const fn visitors(&self) -> &VisitorIndex {
        &self.visitors
    }

    #[must_use]
    pub const fn spatial(&self) -> &SpatialGrid {
        &self.spatial
    }

    #[must_use]
    pub const fn participants(&self) -> &ParticipantIndex {
        &self.participants
    }

    pub(crate) fn elephant_added(&mut self, elephant: &Elephant) {
        self.names.insert(&elephant.name, elephant.id);
        self.births.insert(elephant.birth_year, elephant.id);
    }

    /// Remove a purged elephant. Returns the events that still mention it
    /// and the water sources that logged it.
    pub(crate) fn elephant_purged(
        &mut self,
        elephant: &Elephant,
    ) -> (Vec<EventId>, Vec<WaterSourceId>) {
        self.names.remove(&elephant.name, elephant.id);
        self.births.remove(elephant.birth_year, elephant.id);
        let events = self.participants.remove_elephant(elephant.id);
        let sources = self.visitors.remove_elephant(elephant.id);
        (events, sources.into_iter().collect())
    }

    pub(crate) fn herd_added(&mut self, herd: &Herd) {
        self.herd_names.insert(&herd.name, herd.id);
    }

    /// `position` is where the event happened, if it has a place at all.
    pub(crate) fn event_added(&mut self, event: &Event, position: Option<Point>) {
        self.years.insert(event.year, event.id);
        for elephant in &event.elephants {
            self.participants.insert(*elephant, event.id);
        }
        if let Some(p) = position {
            self.locations.insert(event.id, p);
        }
    }

    pub(crate) fn visit_recorded(&mut self, source: WaterSourceId, elephant: ElephantId) {
        self.visitors.insert(elephant, source);
    }

    pub(crate) fn water_source_added(&mut self, source: &WaterSource) {
        self.spatial.insert(source.id, source.position);
    }

    /// Whether `id` is referenced by any indexed event.
    #[must_use]
    pub fn has_events(&self, id: ElephantId) -> bool {
        !self.participants.get(id).is_empty()
    }

    #[must_use]
    pub fn sizes(&self) -> IndexSizes {
        IndexSizes {
            year_entries: self.years.len(),
            years_covered: self.years.years(),
            name_entries: self.names.len(),
            distinct_names: self.names.distinct_names(),
            spatial_entries: self.spatial.len(),
            spatial_cells: self.spatial.occupied_cells(),
            spatial_average_occupancy: self.spatial.average_occupancy(),
            participant_entries: self.participants.len(),
            elephants_with_events: self.participants.elephants(),
            birth_entries: self.births.len(),
            birth_years_covered: self.births.years(),
            herd_name_entries: self.herd_names.len(),
            location_entries: self.locations.len(),
            location_cells: self.locations.occupied_cells(),
            visitor_entries: self.visitors.len(),
        }
    }
}
