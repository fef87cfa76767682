//! Seeded population of an archive through its public creation API.
//!
//! The generator never touches archive internals: every elephant, herd,
//! event and water source goes through the same `create_*` and
//! `assign_herd` calls a caller would use, so indexes and relation
//! invariants are maintained by the archive itself.
//!
//! Every operation checks its parameters before creating anything, so an
//! out-of-bounds call leaves the archive untouched.


use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tembo_core::{
    Archive, ArchiveError, ElephantAttrs, ElephantId, EventAttrs, EventId, EventKind,
    EventLocation, Gender, HerdAttrs, HerdId, Point, Result, WaterSourceAttrs, WaterSourceId,
};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::names::{ELEPHANT_NAMES, TERRITORIES, WATER_SOURCES};

/// Most generations one family may span.
pub const MAX_GENERATIONS: u32 = 12;
/// Most children drawn for one elephant.
pub const MAX_CHILDREN: u32 = 10;
/// Upper bound on elephants one `generate_families` call may create,
/// assuming every elephant draws the maximum number of children.
pub const MAX_ELEPHANTS_PER_CALL: u64 = 2_000_000;
/// Upper bound on herds, events or water sources per call.
pub const MAX_BATCH: usize = 1_000_000;
/// Longest availability history per water source, in years.
pub const MAX_YEAR_SPAN: u32 = 500;

/// Sizes for [`Generator::generate_dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPlan {
    pub families: usize,
    pub generations: u32,
    pub children_per_elephant: u32,
    pub herds: usize,
    pub events: usize,
    pub water_sources: usize,
    pub year_span: u32,
    /// Water source visits to record; zero records none.
    #[serde(default)]
    pub visits: usize,
}

impl Default for DatasetPlan {
    fn default() -> Self {
        Self {
            families: 5,
            generations: 5,
            children_per_elephant: 3,
            herds: 10,
            events: 1_000,
            water_sources: WATER_SOURCES.len(),
            year_span: 26,
            visits: 200,
        }
    }
}

/// Ids created by one [`Generator::generate_dataset`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub elephants: Vec<ElephantId>,
    pub herds: Vec<HerdId>,
    pub events: Vec<EventId>,
    pub water_sources: Vec<WaterSourceId>,
    /// Visits actually logged; repeats drawn for the same year are dropped.
    pub visits: usize,
}

/// Seeded random population policy.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl Generator {
    /// # Errors
    ///
    /// Returns an error if the config fails validation.
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Create `family_count` independent family trees.
    ///
    /// Each tree has a female founder and `max_generations` levels; every
    /// elephant above the last level gets between one and
    /// `max_children_per_elephant` children. Children fill the mother or
    /// father slot according to the parent's gender.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] for a zero count,
    /// generations or children outside `1..=MAX_*`, or when the worst-case
    /// total exceeds [`MAX_ELEPHANTS_PER_CALL`].
    pub fn generate_families(
        &mut self,
        archive: &mut Archive,
        family_count: usize,
        max_generations: u32,
        max_children_per_elephant: u32,
    ) -> Result<Vec<ElephantId>> {
        if family_count == 0 {
            return Err(ArchiveError::parameter("family_count must be > 0"));
        }
        if !(1..=MAX_GENERATIONS).contains(&max_generations) {
            return Err(ArchiveError::parameter(format!(
                "max_generations must be within 1..={MAX_GENERATIONS}"
            )));
        }
        if !(1..=MAX_CHILDREN).contains(&max_children_per_elephant) {
            return Err(ArchiveError::parameter(format!(
                "max_children_per_elephant must be within 1..={MAX_CHILDREN}"
            )));
        }
        let worst = worst_case_family(max_generations, max_children_per_elephant)
            .zip(u64::try_from(family_count).ok())
            .and_then(|(per, families)| per.checked_mul(families))
            .filter(|total| *total <= MAX_ELEPHANTS_PER_CALL);
        if worst.is_none() {
            return Err(ArchiveError::parameter(format!(
                "{family_count} families of {max_generations} generations could exceed \
                 {MAX_ELEPHANTS_PER_CALL} elephants"
            )));
        }

        let gap = self.config.generation_gap;
        let youngest_birth = year_after(self.config.founder_years.1, gap, max_generations - 1);
        if youngest_birth.is_none() {
            return Err(ArchiveError::parameter(format!(
                "{max_generations} generations {gap} years apart overflow the year range"
            )));
        }

        let mut created = Vec::new();
        for i in 0..family_count {
            let (lo, hi) = self.config.founder_years;
            let founded = self.rng.gen_range(lo..=hi);
            let name = format!("Matriarch_{}_{}", self.pick_name(), i + 1);
            let founder = archive.create_elephant(
                ElephantAttrs::new(name, Gender::Female, founded),
                None,
                None,
            )?;
            created.push(founder);

            // (parent, generation of its children)
            let mut stack = vec![(founder, Gender::Female, 1_u32)];
            while let Some((parent, gender, generation)) = stack.pop() {
                if generation >= max_generations {
                    continue;
                }
                let born = year_after(founded, gap, generation).ok_or_else(|| {
                    ArchiveError::parameter("generation birth year overflows")
                })?;
                let children = self.rng.gen_range(1..=max_children_per_elephant);
                for _ in 0..children {
                    let child_gender = if self.rng.gen_bool(0.5) {
                        Gender::Female
                    } else {
                        Gender::Male
                    };
                    let name = format!(
                        "{}_G{generation}_{}",
                        self.pick_name(),
                        self.rng.gen_range(100..=999)
                    );
                    let (mother, father) = match gender {
                        Gender::Female => (Some(parent), None),
                        Gender::Male => (None, Some(parent)),
                    };
                    let child = archive.create_elephant(
                        ElephantAttrs::new(name, child_gender, born),
                        mother,
                        father,
                    )?;
                    created.push(child);
                    stack.push((child, child_gender, generation + 1));
                }
            }
        }

        info!(
            families = family_count,
            generations = max_generations,
            elephants = created.len(),
            "families generated"
        );
        Ok(created)
    }

    /// Create `count` herds named `Herd_A_1`, `Herd_B_2`, ...
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] for a zero or oversized
    /// count.
    pub fn generate_herds(&mut self, archive: &mut Archive, count: usize) -> Result<Vec<HerdId>> {
        check_batch("herd count", count)?;
        let herds: Vec<HerdId> = (0..count)
            .map(|i| {
                let letter = char::from(b'A' + (i % 26) as u8);
                let territory = TERRITORIES.choose(&mut self.rng).copied().unwrap_or_default();
                archive.create_herd(HerdAttrs::new(format!("Herd_{letter}_{}", i + 1), territory))
            })
            .collect();
        debug!(herds = herds.len(), "herds generated");
        Ok(herds)
    }

    /// Put each elephant into a randomly chosen herd.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::InvalidParameter`] when `herds` is empty.
    /// - [`ArchiveError::NotFound`] if any id is absent; nothing is
    ///   assigned then.
    pub fn assign_to_herds(
        &mut self,
        archive: &mut Archive,
        elephants: &[ElephantId],
        herds: &[HerdId],
    ) -> Result<usize> {
        if herds.is_empty() {
            return Err(ArchiveError::parameter("no herds to assign to"));
        }
        for id in elephants {
            archive.elephant(*id)?;
        }
        for id in herds {
            archive.herd(*id)?;
        }
        for elephant in elephants {
            let herd = herds[self.rng.gen_range(0..herds.len())];
            archive.assign_herd(*elephant, herd)?;
        }
        debug!(elephants = elephants.len(), herds = herds.len(), "herd assignment");
        Ok(elephants.len())
    }

    /// Create `count` events spread over the configured years and region.
    ///
    /// Each involves one to eight live elephants and, when herds exist, one
    /// to three herds.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] for a zero or oversized
    /// count, or when the archive holds no elephants.
    pub fn generate_events(&mut self, archive: &mut Archive, count: usize) -> Result<Vec<EventId>> {
        check_batch("event count", count)?;
        let elephants = archive.elephant_ids();
        if elephants.is_empty() {
            return Err(ArchiveError::parameter("events need at least one live elephant"));
        }
        let herds = archive.herd_ids();
        let region = self.config.region;

        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = EventKind::ALL[self.rng.gen_range(0..EventKind::ALL.len())];
            let year = self.rng.gen_range(self.config.start_year..=self.config.end_year);
            let at = Point::new(
                round2(self.rng.gen_range(region.min_x..region.max_x)),
                round2(self.rng.gen_range(region.min_y..region.max_y)),
            );
            let involved = self.rng.gen_range(1..=8).min(elephants.len());
            let involved: Vec<ElephantId> = elephants
                .choose_multiple(&mut self.rng, involved)
                .copied()
                .collect();
            let herd_count = self.rng.gen_range(1..=3).min(herds.len());
            let involved_herds: Vec<HerdId> = herds
                .choose_multiple(&mut self.rng, herd_count)
                .copied()
                .collect();

            let attrs = EventAttrs::new(kind, year)
                .describe(format!("{kind} at {at} in {year}"))
                .involving(involved)
                .with_herds(involved_herds)
                .at(EventLocation::Coordinates(at));
            events.push(archive.create_event(attrs)?);
        }
        debug!(events = events.len(), "events generated");
        Ok(events)
    }

    /// Create `count` water sources with `year_span` years of availability
    /// starting at the configured start year.
    ///
    /// The first sources use the built-in list of real sites; later ones
    /// reuse those sites with a numbered name and a small positional jitter.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] for a zero or oversized
    /// count or span.
    pub fn generate_water_sources(
        &mut self,
        archive: &mut Archive,
        count: usize,
        year_span: u32,
    ) -> Result<Vec<WaterSourceId>> {
        check_batch("water source count", count)?;
        if !(1..=MAX_YEAR_SPAN).contains(&year_span) {
            return Err(ArchiveError::parameter(format!(
                "year_span must be within 1..={MAX_YEAR_SPAN}"
            )));
        }

        let years = (0..year_span)
            .map(|offset| year_after(self.config.start_year, 1, offset))
            .collect::<Option<Vec<i32>>>()
            .ok_or_else(|| {
                ArchiveError::parameter(format!(
                    "{year_span} years from {} overflow the year range",
                    self.config.start_year
                ))
            })?;

        let mut sources = Vec::with_capacity(count);
        for i in 0..count {
            let (name, lat, lon, capacity) = WATER_SOURCES[i % WATER_SOURCES.len()];
            let round = i / WATER_SOURCES.len();
            let (name, x, y) = if round == 0 {
                (name.to_string(), lon, lat)
            } else {
                (
                    format!("{name} {}", round + 1),
                    lon + self.rng.gen_range(-0.5..0.5),
                    lat + self.rng.gen_range(-0.5..0.5),
                )
            };

            let mut attrs = WaterSourceAttrs::new(name, x, y).capacity(capacity);
            for &year in &years {
                let dry = self.rng.gen_bool(self.config.drought_chance(year));
                attrs = attrs.record(year, !dry);
            }
            sources.push(archive.create_water_source(attrs)?);
        }
        debug!(sources = sources.len(), year_span, "water sources generated");
        Ok(sources)
    }

    /// Log `count` random visits: a live elephant at a water source in a year
    /// of the configured range. Returns how many were new; a draw that
    /// repeats an elephant, source and year is not logged twice.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] for a zero or oversized
    /// count, or when the archive holds no elephants or no water sources.
    pub fn generate_visits(&mut self, archive: &mut Archive, count: usize) -> Result<usize> {
        check_batch("visit count", count)?;
        let elephants = archive.elephant_ids();
        let sources = archive.water_source_ids();
        if elephants.is_empty() || sources.is_empty() {
            return Err(ArchiveError::parameter(
                "visits need at least one live elephant and one water source",
            ));
        }

        let mut logged = 0;
        for _ in 0..count {
            let elephant = elephants[self.rng.gen_range(0..elephants.len())];
            let source = sources[self.rng.gen_range(0..sources.len())];
            let year = self.rng.gen_range(self.config.start_year..=self.config.end_year);
            if archive.record_visit(source, year, elephant)? {
                logged += 1;
            }
        }
        debug!(drawn = count, logged, "visits generated");
        Ok(logged)
    }

    /// Populate a whole archive: families, herds, herd assignment, water
    /// sources, visits, then events.
    ///
    /// # Errors
    ///
    /// Returns the first parameter error; all sizes are checked before
    /// anything is created.
    pub fn generate_dataset(&mut self, archive: &mut Archive, plan: &DatasetPlan) -> Result<Dataset> {
        if plan.families == 0 || plan.herds == 0 || plan.water_sources == 0 || plan.events == 0 {
            return Err(ArchiveError::parameter("every dataset size must be > 0"));
        }
        check_batch("herd count", plan.herds)?;
        check_batch("event count", plan.events)?;
        check_batch("water source count", plan.water_sources)?;
        if plan.visits > 0 {
            check_batch("visit count", plan.visits)?;
        }
        if !(1..=MAX_YEAR_SPAN).contains(&plan.year_span) {
            return Err(ArchiveError::parameter(format!(
                "year_span must be within 1..={MAX_YEAR_SPAN}"
            )));
        }

        let elephants =
            self.generate_families(archive, plan.families, plan.generations, plan.children_per_elephant)?;
        let herds = self.generate_herds(archive, plan.herds)?;
        self.assign_to_herds(archive, &elephants, &herds)?;
        let water_sources = self.generate_water_sources(archive, plan.water_sources, plan.year_span)?;
        let visits = if plan.visits > 0 {
            self.generate_visits(archive, plan.visits)?
        } else {
            0
        };
        let events = self.generate_events(archive, plan.events)?;

        info!(
            elephants = elephants.len(),
            herds = herds.len(),
            events = events.len(),
            water_sources = water_sources.len(),
            visits,
            seed = self.config.seed,
            "dataset generated"
        );
        Ok(Dataset {
            elephants,
            herds,
            events,
            water_sources,
            visits,
        })
    }

    fn pick_name(&mut self) -> &'static str {
        ELEPHANT_NAMES.choose(&mut self.rng).copied().unwrap_or("Ella")
    }
}

/// `base + gap * steps`, or `None` when it leaves the `i32` range.
fn year_after(base: i32, gap: i32, steps: u32) -> Option<i32> {
    i32::try_from(steps)
        .ok()
        .and_then(|steps| gap.checked_mul(steps))
        .and_then(|span| base.checked_add(span))
}

fn check_batch(what: &str, count: usize) -> Result<()> {
    if count == 0 || count > MAX_BATCH {
        return Err(ArchiveError::parameter(format!(
            "{what} must be within 1..={MAX_BATCH}, got {count}"
        )));
    }
    Ok(())
}

/// Elephants in one family if every elephant has `children` children:
/// `1 + c + c^2 + ... + c^(generations - 1)`.
fn worst_case_family(generations: u32, children: u32) -> Option<u64> {
    let c = u64::from(children);
    (0..generations).try_fold(0_u64, |sum, g| sum.checked_add(c.checked_pow(g)?))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tembo_core::Capacity;

    fn generator(seed: u64) -> Generator {
        Generator::new(GeneratorConfig::seeded(seed)).unwrap_or_else(|e| panic!("{e}"))
    }

    /// A generator whose config skipped validation.
    fn unchecked(config: GeneratorConfig) -> Generator {
        let rng = StdRng::seed_from_u64(config.seed);
        Generator { config, rng }
    }

    #[test]
    fn overflowing_generation_years_create_nothing() {
        let mut archive = Archive::default();
        let mut g = unchecked(GeneratorConfig {
            generation_gap: i32::MAX / 2,
            ..GeneratorConfig::default()
        });
        let err = g.generate_families(&mut archive, 1, 4, 1).err();
        assert!(matches!(err, Some(ArchiveError::InvalidParameter(_))));
        assert_eq!(archive.live_entity_count(), 0);
    }

    #[test]
    fn overflowing_availability_years_create_nothing() {
        let mut archive = Archive::default();
        let mut g = unchecked(GeneratorConfig {
            start_year: i32::MAX - 5,
            end_year: i32::MAX,
            ..GeneratorConfig::default()
        });
        let err = g.generate_water_sources(&mut archive, 1, 26).err();
        assert!(matches!(err, Some(ArchiveError::InvalidParameter(_))));
        assert_eq!(archive.live_entity_count(), 0);
    }

    #[test]
    fn year_after_stops_at_the_edge() {
        assert_eq!(year_after(2000, 15, 4), Some(2060));
        assert_eq!(year_after(i32::MAX - 1, 1, 1), Some(i32::MAX));
        assert_eq!(year_after(i32::MAX, 1, 1), None);
        assert_eq!(year_after(0, i32::MAX / 2, 3), None);
    }

    #[test]
    fn worst_case_counts_every_level() {
        assert_eq!(worst_case_family(1, 3), Some(1));
        assert_eq!(worst_case_family(3, 3), Some(13));
        assert_eq!(worst_case_family(12, 10), Some(111_111_111_111));
    }

    #[test]
    fn families_respect_generation_depth() {
        let mut archive = Archive::default();
        let mut g = generator(7);
        let ids = g
            .generate_families(&mut archive, 2, 3, 2)
            .unwrap_or_else(|e| panic!("{e}"));
        // Two founders, each with 1..=2 children, each with 1..=2 children.
        assert!((2 + 2 + 2..=2 + 4 + 8).contains(&ids.len()));
        let founders: Vec<_> = ids
            .iter()
            .filter_map(|id| archive.elephant(*id).ok())
            .filter(|e| e.mother().is_none() && e.father().is_none())
            .collect();
        assert_eq!(founders.len(), 2);
        assert!(founders.iter().all(|f| f.name().starts_with("Matriarch_")));
        let oldest = founders.iter().map(|f| f.birth_year()).min().unwrap_or_default();
        let youngest = ids
            .iter()
            .filter_map(|id| archive.elephant(*id).ok())
            .map(|e| e.birth_year())
            .max()
            .unwrap_or_default();
        assert!(youngest - oldest <= 40 + 2 * 15);
    }

    #[test]
    fn bad_parameters_create_nothing() {
        let mut archive = Archive::default();
        let mut g = generator(1);
        assert!(g.generate_families(&mut archive, 0, 3, 3).is_err());
        assert!(g.generate_families(&mut archive, 1, 0, 3).is_err());
        assert!(g.generate_families(&mut archive, 1, 3, MAX_CHILDREN + 1).is_err());
        assert!(g.generate_families(&mut archive, 10_000, 12, 10).is_err());
        assert!(g.generate_herds(&mut archive, 0).is_err());
        assert!(g.generate_water_sources(&mut archive, 3, 0).is_err());
        assert!(g.generate_events(&mut archive, 5).is_err());
        assert_eq!(archive.live_entity_count(), 0);
    }

    #[test]
    fn herd_names_follow_the_alphabet() {
        let mut archive = Archive::default();
        let herds = generator(3)
            .generate_herds(&mut archive, 3)
            .unwrap_or_else(|e| panic!("{e}"));
        let names: Vec<String> = herds
            .iter()
            .filter_map(|h| archive.herd(*h).ok())
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["Herd_A_1", "Herd_B_2", "Herd_C_3"]);
    }

    #[test]
    fn water_sources_start_with_known_sites() {
        let mut archive = Archive::default();
        let ids = generator(5)
            .generate_water_sources(&mut archive, 12, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        let first = archive.water_source(ids[0]).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(first.name(), "Okavango River");
        assert_eq!(first.position(), Point::new(22.5, -19.0));
        assert_eq!(first.capacity(), Capacity::Large);
        assert_eq!(first.availability().len(), 4);
        let eleventh = archive.water_source(ids[10]).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(eleventh.name(), "Okavango River 2");
        assert_eq!(eleventh.capacity(), Capacity::Large);
    }

    #[test]
    fn visits_land_in_the_configured_years() {
        let mut archive = Archive::default();
        let mut g = generator(5);
        assert!(matches!(
            g.generate_visits(&mut archive, 10),
            Err(ArchiveError::InvalidParameter(_))
        ));
        g.generate_families(&mut archive, 1, 2, 2)
            .unwrap_or_else(|e| panic!("{e}"));
        g.generate_water_sources(&mut archive, 3, 5)
            .unwrap_or_else(|e| panic!("{e}"));

        let logged = g
            .generate_visits(&mut archive, 50)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!((1..=50).contains(&logged));
        let stored: usize = archive
            .water_sources()
            .flat_map(|s| s.visits().iter())
            .map(|(year, visitors)| {
                assert!((2000..=2025).contains(year));
                visitors.len()
            })
            .sum();
        assert_eq!(stored, logged);
        assert!(g.generate_visits(&mut archive, 0).is_err());
    }

    #[test]
    fn events_reference_live_entities() {
        let mut archive = Archive::default();
        let mut g = generator(11);
        let elephants = g
            .generate_families(&mut archive, 1, 2, 3)
            .unwrap_or_else(|e| panic!("{e}"));
        let events = g
            .generate_events(&mut archive, 20)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(events.len(), 20);
        for id in events {
            let event = archive.event(id).unwrap_or_else(|e| panic!("{e}"));
            assert!(!event.elephants().is_empty());
            assert!(event.elephants().len() <= elephants.len().min(8));
            assert!(event.herds().is_empty());
            assert!((2000..=2025).contains(&event.year()));
        }
    }
}
