//! Query entry point.
//!
//! Every query reads the archive and its indexes only. Lookups by year,
//! name and participant are single hash lookups; nearest-source search walks
//! the spatial grid outward from the query cell and radius search over event
//! positions reads only the cells the circle overlaps. Drought history and
//! per-kind listing scan the relevant entities once.

use std::collections::BTreeMap;

use serde::Serialize;
use tembo_core::config::SearchConfig;
use tembo_core::{
    Archive, ArchiveError, Availability, ElephantId, Event, EventId, EventKind, HerdId, Point,
    Result, WaterSourceId,
};
use tracing::debug;

use crate::stats::{Counters, SearchStats, bump};

/// Result of [`SearchEngine::nearest_water_source`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestWater {
    pub id: WaterSourceId,
    pub name: String,
    pub position: Point,
    pub distance: f64,
    pub rings_scanned: u32,
    /// Sources looked at before settling on this one.
    pub examined: usize,
}

/// One recorded drought.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DroughtEntry {
    pub source: WaterSourceId,
    pub year: i32,
    pub availability: Availability,
}

/// Drought records in a year range, ordered by source id then year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DroughtHistory {
    pub from: i32,
    pub to: i32,
    pub entries: Vec<DroughtEntry>,
}

impl DroughtHistory {
    /// Drought years grouped per source.
    #[must_use]
    pub fn by_source(&self) -> BTreeMap<WaterSourceId, Vec<i32>> {
        let mut grouped: BTreeMap<WaterSourceId, Vec<i32>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(entry.source).or_default().push(entry.year);
        }
        grouped
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An event found by [`SearchEngine::events_near`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearbyEvent {
    pub event: EventId,
    pub distance: f64,
}

/// Elephants logged at one source in one year, in recording order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitYear {
    pub year: i32,
    pub elephants: Vec<ElephantId>,
}

/// A migration whose anniversary falls on the queried year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationAlert {
    pub event: EventId,
    pub year: i32,
    pub years_ago: i32,
    pub message: String,
}

/// Read-only query engine over one archive.
#[derive(Debug)]
pub struct SearchEngine<'a> {
    pub(crate) archive: &'a Archive,
    pub(crate) config: SearchConfig,
    pub(crate) counters: Counters,
}

impl<'a> SearchEngine<'a> {
    /// Engine using the archive's own search settings.
    #[must_use]
    pub fn new(archive: &'a Archive) -> Self {
        Self::with_config(archive, archive.config().search.clone())
    }

    #[must_use]
    pub fn with_config(archive: &'a Archive, config: SearchConfig) -> Self {
        Self {
            archive,
            config,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub const fn archive(&self) -> &'a Archive {
        self.archive
    }

    /// Closest water source available in `year`.
    ///
    /// Distance is Euclidean; ties go to the smaller id. The search stops at
    /// `search.max_radius`.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::InvalidParameter`] for non-finite coordinates.
    /// - [`ArchiveError::NotFound`] when no available source lies within the
    ///   search radius.
    pub fn nearest_water_source(&self, x: f64, y: f64, year: i32) -> Result<NearestWater> {
        bump(&self.counters.nearest);
        let query = Point::new(x, y);
        if !query.is_finite() {
            return Err(ArchiveError::parameter("query coordinates must be finite"));
        }

        let spatial = self.archive.indexes().spatial();
        let max_rings = spatial.rings_for_radius(self.config.max_radius);
        let hit = spatial
            .nearest(query, max_rings, |id| {
                self.archive
                    .water_source(id)
                    .is_ok_and(|s| s.available_in(year))
            })
            .filter(|hit| hit.distance <= self.config.max_radius)
            .ok_or_else(|| {
                ArchiveError::not_found("available water source", format!("near {query} in {year}"))
            })?;

        let source = self.archive.water_source(hit.id)?;
        debug!(%query, year, source = %hit.id, distance = hit.distance, examined = hit.examined, "nearest water source");
        Ok(NearestWater {
            id: hit.id,
            name: source.name().to_string(),
            position: source.position(),
            distance: hit.distance,
            rings_scanned: hit.rings_scanned,
            examined: hit.examined,
        })
    }

    /// Every drought recorded between `from` and `to` inclusive.
    ///
    /// Years without a record are not droughts.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidRange`] when `from > to`.
    pub fn drought_history(&self, from: i32, to: i32) -> Result<DroughtHistory> {
        bump(&self.counters.drought_history);
        ArchiveError::check_range(from, to)?;
        let mut entries = Vec::new();
        for id in self.archive.water_source_ids() {
            let source = self.archive.water_source(id)?;
            entries.extend(
                source
                    .drought_years(from, to)
                    .map(|(year, availability)| DroughtEntry {
                        source: id,
                        year,
                        availability,
                    }),
            );
        }
        debug!(from, to, droughts = entries.len(), "drought history");
        Ok(DroughtHistory { from, to, entries })
    }

    /// Events recorded for `year`, in creation order.
    #[must_use]
    pub fn events_by_year(&self, year: i32) -> Vec<&'a Event> {
        bump(&self.counters.events_by_year);
        let events = self.resolve(self.archive.indexes().years().get(year));
        debug!(year, events = events.len(), "events by year");
        events
    }

    /// Events from `from` to `to` inclusive, by year then creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidRange`] when `from > to`.
    pub fn events_in_range(&self, from: i32, to: i32) -> Result<Vec<&'a Event>> {
        bump(&self.counters.events_in_range);
        ArchiveError::check_range(from, to)?;
        let ids = self.archive.indexes().years().range(from, to);
        Ok(self.resolve(&ids))
    }

    /// Events that still reference `elephant`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if the elephant is not stored.
    pub fn events_for_elephant(&self, elephant: ElephantId) -> Result<Vec<&'a Event>> {
        bump(&self.counters.events_for_elephant);
        self.archive.elephant(elephant)?;
        Ok(self.resolve(self.archive.indexes().participants().get(elephant)))
    }

    /// Events of one kind, by id.
    #[must_use]
    pub fn events_by_kind(&self, kind: EventKind) -> Vec<&'a Event> {
        bump(&self.counters.events_by_kind);
        let mut events: Vec<&Event> = self
            .archive
            .events()
            .filter(|e| e.kind() == kind)
            .collect();
        events.sort_unstable_by_key(|e| e.id());
        events
    }

    /// Ids of every stored elephant called `name`.
    #[must_use]
    pub fn elephants_named(&self, name: &str) -> Vec<ElephantId> {
        bump(&self.counters.elephants_named);
        self.archive
            .indexes()
            .names()
            .get(name)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids of every herd called `name`.
    #[must_use]
    pub fn herds_named(&self, name: &str) -> Vec<HerdId> {
        bump(&self.counters.herds_named);
        self.archive
            .indexes()
            .herd_names()
            .get(name)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Elephants born in `year`, by id.
    #[must_use]
    pub fn elephants_born_in(&self, year: i32) -> Vec<ElephantId> {
        bump(&self.counters.elephants_born);
        self.archive.indexes().births().get(year).collect()
    }

    /// Elephants born from `from` to `to` inclusive, by year then id.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidRange`] when `from > to`.
    pub fn elephants_born_between(&self, from: i32, to: i32) -> Result<Vec<ElephantId>> {
        bump(&self.counters.elephants_born);
        ArchiveError::check_range(from, to)?;
        Ok(self.archive.indexes().births().range(from, to))
    }

    /// Located events within `radius` of `(x, y)`, closest first, ties by
    /// id. An event at a water source sits at the source's position; events
    /// without a location never match.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] for non-finite coordinates
    /// or a negative or non-finite radius.
    pub fn events_near(&self, x: f64, y: f64, radius: f64) -> Result<Vec<NearbyEvent>> {
        bump(&self.counters.events_near);
        let center = Point::new(x, y);
        if !center.is_finite() {
            return Err(ArchiveError::parameter("query coordinates must be finite"));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(ArchiveError::parameter(format!(
                "radius must be finite and >= 0, got {radius}"
            )));
        }
        let hits: Vec<NearbyEvent> = self
            .archive
            .indexes()
            .locations()
            .within(center, radius)
            .into_iter()
            .map(|(event, distance)| NearbyEvent { event, distance })
            .collect();
        debug!(%center, radius, events = hits.len(), "events near");
        Ok(hits)
    }

    /// Visit log of one water source, oldest year first.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if the source is absent.
    pub fn visit_history(&self, source: WaterSourceId) -> Result<Vec<VisitYear>> {
        bump(&self.counters.visit_history);
        let history: Vec<VisitYear> = self
            .archive
            .water_source(source)?
            .visits()
            .iter()
            .map(|(year, elephants)| VisitYear {
                year: *year,
                elephants: elephants.clone(),
            })
            .collect();
        debug!(%source, years = history.len(), "visit history");
        Ok(history)
    }

    /// Migrations exactly a multiple of `period` years before
    /// `current_year`, most recent first, then by id.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] when `period` is zero.
    pub fn migration_alerts(&self, current_year: i32, period: u32) -> Result<Vec<MigrationAlert>> {
        bump(&self.counters.migration_alerts);
        if period == 0 {
            return Err(ArchiveError::parameter("anniversary period must be > 0"));
        }
        let period = i64::from(period);

        let mut alerts: Vec<MigrationAlert> = self
            .archive
            .events()
            .filter(|e| e.kind() == EventKind::Migration)
            .filter_map(|e| {
                let years_ago = i64::from(current_year) - i64::from(e.year());
                (years_ago > 0 && years_ago % period == 0).then(|| MigrationAlert {
                    event: e.id(),
                    year: e.year(),
                    years_ago: i32::try_from(years_ago).unwrap_or(i32::MAX),
                    message: anniversary_message(years_ago, e),
                })
            })
            .collect();
        alerts.sort_unstable_by_key(|a| (a.years_ago, a.event));
        debug!(current_year, period, alerts = alerts.len(), "migration alerts");
        Ok(alerts)
    }

    /// Index sizes, per-kind event totals and lookup counts so far.
    #[must_use]
    pub fn search_stats(&self) -> SearchStats {
        let mut events_per_kind = BTreeMap::new();
        for event in self.archive.events() {
            *events_per_kind.entry(event.kind()).or_insert(0) += 1;
        }
        SearchStats {
            indexes: self.archive.indexes().sizes(),
            herds: self.archive.herds().count(),
            water_sources: self.archive.water_sources().count(),
            events_per_kind,
            lookups: self.counters.snapshot(),
        }
    }

    fn resolve(&self, ids: &[EventId]) -> Vec<&'a Event> {
        ids.iter()
            .filter_map(|id| self.archive.event(*id).ok())
            .collect()
    }
}

fn anniversary_message(years_ago: i64, event: &Event) -> String {
    if event.description().is_empty() {
        format!("{years_ago}-year anniversary of the {} migration", event.year())
    } else {
        format!("{years_ago}-year anniversary of {}", event.description())
    }
}
