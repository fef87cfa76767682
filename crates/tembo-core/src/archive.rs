//! The archive: sole owner of every entity, plus the entity-graph mutations.
//!
//! # Ownership
//!
//! Entities live in per-kind maps keyed by id. Relation fields hold ids, so
//! the lifecycle controller can sever or purge a relation without touching
//! the entity on the other side beyond plain id bookkeeping.
//!
//! # Atomicity
//!
//! Every mutation validates its inputs completely before it changes
//! anything. A failed call leaves the archive exactly as it was, and a
//! successful one updates both directions of every relation and every index
//! before returning.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::{debug, info};

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::index::IndexManager;
use crate::lifecycle::LifecycleState;
use crate::model::{
    Availability, Elephant, ElephantAttrs, ElephantId, Event, EventAttrs, EventId, EventLocation,
    Gender, Herd, HerdAttrs, HerdId, IdSeq, WaterSource, WaterSourceAttrs, WaterSourceId,
};

#[derive(Debug, Clone, Copy)]
struct Sequences {
    elephant: IdSeq,
    herd: IdSeq,
    event: IdSeq,
    water: IdSeq,
}

impl Sequences {
    const fn new() -> Self {
        Self {
            elephant: IdSeq::new(),
            herd: IdSeq::new(),
            event: IdSeq::new(),
            water: IdSeq::new(),
        }
    }
}

/// In-memory archive of elephants, herds, events and water sources.
///
/// Create one with [`Archive::default`] or [`Archive::with_config`], clear it
/// with [`Archive::reset`], and drop it to tear it down.
#[derive(Debug, Clone)]
pub struct Archive {
    config: ArchiveConfig,
    pub(crate) elephants: HashMap<ElephantId, Elephant>,
    pub(crate) herds: HashMap<HerdId, Herd>,
    pub(crate) events: HashMap<EventId, Event>,
    pub(crate) water_sources: HashMap<WaterSourceId, WaterSource>,
    pub(crate) indexes: IndexManager,
    /// Lifecycle tag of every stored elephant (Linked or Orphaned).
    pub(crate) states: HashMap<ElephantId, LifecycleState>,
    /// The enumeration list a UI walks; one external root per elephant.
    pub(crate) roots: BTreeSet<ElephantId>,
    /// Ids of purged elephants. The only structure that grows without bound
    /// while the archive lives: one id per collected elephant, cleared by
    /// [`Archive::reset`].
    pub(crate) tombstones: HashSet<ElephantId>,
    pub(crate) collected_total: u64,
    seq: Sequences,
}

impl Default for Archive {
    fn default() -> Self {
        Self::build(ArchiveConfig::default())
    }
}

impl Archive {
    /// Create an empty archive with a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] if the config is invalid.
    pub fn with_config(config: ArchiveConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ArchiveError::parameter(e.to_string()))?;
        Ok(Self::build(config))
    }

    fn build(config: ArchiveConfig) -> Self {
        let indexes = IndexManager::new(config.index.cell_size);
        Self {
            config,
            elephants: HashMap::new(),
            herds: HashMap::new(),
            events: HashMap::new(),
            water_sources: HashMap::new(),
            indexes,
            states: HashMap::new(),
            roots: BTreeSet::new(),
            tombstones: HashSet::new(),
            collected_total: 0,
            seq: Sequences::new(),
        }
    }

    /// Drop every entity, index entry and counter. Ids restart at 1.
    pub fn reset(&mut self) {
        info!(
            elephants = self.elephants.len(),
            herds = self.herds.len(),
            events = self.events.len(),
            water_sources = self.water_sources.len(),
            "archive reset"
        );
        *self = Self::build(self.config.clone());
    }

    #[must_use]
    pub const fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    #[must_use]
    pub const fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Elephants currently on the root list.
    #[must_use]
    pub const fn roots(&self) -> &BTreeSet<ElephantId> {
        &self.roots
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create an elephant, optionally linked to its parents.
    ///
    /// The new elephant starts Linked and is registered on the root list.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if a parent id is absent.
    /// - [`ArchiveError::InvalidRelation`] if the mother is not female or
    ///   the father is not male.
    pub fn create_elephant(
        &mut self,
        attrs: ElephantAttrs,
        mother: Option<ElephantId>,
        father: Option<ElephantId>,
    ) -> Result<ElephantId> {
        if let Some(m) = mother {
            let parent = self.elephant(m)?;
            if parent.gender != Gender::Female {
                return Err(ArchiveError::relation(format!(
                    "mother {m} is not female"
                )));
            }
        }
        if let Some(f) = father {
            let parent = self.elephant(f)?;
            if parent.gender != Gender::Male {
                return Err(ArchiveError::relation(format!("father {f} is not male")));
            }
        }

        let id = ElephantId(self.seq.elephant.next());
        let mut elephant = Elephant::new(id, attrs);
        elephant.mother = mother;
        elephant.father = father;

        for parent in mother.into_iter().chain(father) {
            if let Some(p) = self.elephants.get_mut(&parent) {
                p.children.push(id);
            }
        }

        self.indexes.elephant_added(&elephant);
        debug!(%id, name = %elephant.name, ?mother, ?father, "elephant created");
        self.elephants.insert(id, elephant);
        self.states.insert(id, LifecycleState::Linked);
        self.roots.insert(id);
        Ok(id)
    }

    /// Create an empty herd.
    pub fn create_herd(&mut self, attrs: HerdAttrs) -> HerdId {
        let id = HerdId(self.seq.herd.next());
        debug!(%id, name = %attrs.name, "herd created");
        let herd = Herd::new(id, attrs);
        self.indexes.herd_added(&herd);
        self.herds.insert(id, herd);
        id
    }

    /// Record an event. Duplicate elephant or herd references are collapsed,
    /// keeping first occurrence order.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if a referenced elephant, herd or water
    ///   source is absent.
    /// - [`ArchiveError::InvalidParameter`] for non-finite coordinates.
    pub fn create_event(&mut self, mut attrs: EventAttrs) -> Result<EventId> {
        for elephant in &attrs.elephants {
            self.elephant(*elephant)?;
        }
        for herd in &attrs.herds {
            self.herd(*herd)?;
        }
        let position = match attrs.location {
            Some(EventLocation::WaterSource(source)) => Some(self.water_source(source)?.position),
            Some(EventLocation::Coordinates(p)) if !p.is_finite() => {
                return Err(ArchiveError::parameter("event coordinates must be finite"));
            }
            Some(EventLocation::Coordinates(p)) => Some(p),
            None => None,
        };

        dedup_in_order(&mut attrs.elephants);
        dedup_in_order(&mut attrs.herds);

        let id = EventId(self.seq.event.next());
        let event = Event::new(id, attrs);
        self.indexes.event_added(&event, position);
        debug!(%id, kind = %event.kind, year = event.year, "event created");
        self.events.insert(id, event);
        Ok(id)
    }

    /// Register a water source and place it in the spatial grid.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidParameter`] for non-finite coordinates
    /// or availability levels.
    pub fn create_water_source(&mut self, attrs: WaterSourceAttrs) -> Result<WaterSourceId> {
        if !attrs.position.is_finite() {
            return Err(ArchiveError::parameter(
                "water source coordinates must be finite",
            ));
        }
        for (year, availability) in &attrs.availability {
            check_availability(*year, *availability)?;
        }

        let id = WaterSourceId(self.seq.water.next());
        let source = WaterSource::new(id, attrs);
        self.indexes.water_source_added(&source);
        debug!(%id, name = %source.name, position = %source.position, "water source created");
        self.water_sources.insert(id, source);
        Ok(id)
    }

    /// Insert or replace the availability record of `source` for `year`.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if the source is absent.
    /// - [`ArchiveError::InvalidParameter`] for a non-finite level.
    pub fn record_availability(
        &mut self,
        source: WaterSourceId,
        year: i32,
        availability: Availability,
    ) -> Result<()> {
        check_availability(year, availability)?;
        let entry = self
            .water_sources
            .get_mut(&source)
            .ok_or_else(|| source.not_found())?;
        entry.availability.insert(year, availability);
        Ok(())
    }

    /// Log that `elephant` drank at `source` in `year`. Returns `false` when
    /// that visit was already logged.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if the source or the elephant is
    /// absent.
    pub fn record_visit(
        &mut self,
        source: WaterSourceId,
        year: i32,
        elephant: ElephantId,
    ) -> Result<bool> {
        self.elephant(elephant)?;
        let entry = self
            .water_sources
            .get_mut(&source)
            .ok_or_else(|| source.not_found())?;
        let fresh = entry.record_visit(year, elephant);
        if fresh {
            self.indexes.visit_recorded(source, elephant);
            debug!(%source, year, %elephant, "visit recorded");
        }
        Ok(fresh)
    }

    // -----------------------------------------------------------------------
    // Linking
    // -----------------------------------------------------------------------

    /// Link `child` under `parent`. The parent's gender picks the slot
    /// (mother or father) on the child.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if either id is absent.
    /// - [`ArchiveError::InvalidRelation`] for self-parenting, a duplicate
    ///   child entry, an occupied parent slot, or when `child` is already an
    ///   ancestor of `parent`.
    pub fn add_child(&mut self, parent: ElephantId, child: ElephantId) -> Result<()> {
        let p = self.elephant(parent)?;
        let c = self.elephant(child)?;

        if parent == child {
            return Err(ArchiveError::relation(format!(
                "elephant {parent} cannot be its own parent"
            )));
        }
        if p.children.contains(&child) {
            return Err(ArchiveError::relation(format!(
                "elephant {child} is already a child of {parent}"
            )));
        }
        let gender = p.gender;
        let occupied = match gender {
            Gender::Female => c.mother,
            Gender::Male => c.father,
        };
        if let Some(existing) = occupied {
            return Err(ArchiveError::relation(format!(
                "elephant {child} already has a {} ({existing})",
                if gender == Gender::Female { "mother" } else { "father" }
            )));
        }
        if self.is_ancestor(child, parent) {
            return Err(ArchiveError::relation(format!(
                "elephant {child} is an ancestor of {parent}"
            )));
        }

        if let Some(p) = self.elephants.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.elephants.get_mut(&child) {
            *c.parent_slot_mut(gender) = Some(parent);
        }
        debug!(%parent, %child, "child linked");
        Ok(())
    }

    /// Move an elephant into `herd`, leaving its previous herd.
    ///
    /// Joining a herd is an external root: an Orphaned elephant becomes
    /// Linked again and returns to the root list.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if either id is absent.
    pub fn assign_herd(&mut self, elephant: ElephantId, herd: HerdId) -> Result<()> {
        let previous = self.elephant(elephant)?.herd;
        self.herd(herd)?;
        if previous == Some(herd) {
            return Ok(());
        }

        if let Some(old) = previous.and_then(|h| self.herds.get_mut(&h)) {
            old.members.remove(&elephant);
        }
        if let Some(h) = self.herds.get_mut(&herd) {
            h.members.insert(elephant);
        }
        if let Some(e) = self.elephants.get_mut(&elephant) {
            e.herd = Some(herd);
        }
        if let Some(state) = self
            .states
            .get_mut(&elephant)
            .filter(|s| **s == LifecycleState::Orphaned)
        {
            *state = LifecycleState::Linked;
            self.roots.insert(elephant);
            info!(%elephant, %herd, "orphaned elephant re-rooted by herd");
        }
        debug!(%elephant, %herd, ?previous, "herd assigned");
        Ok(())
    }

    /// Sever an elephant's herd membership in both directions.
    ///
    /// Returns the herd it left, if any. The lifecycle tag is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if the elephant is absent.
    pub fn remove_from_herd(&mut self, elephant: ElephantId) -> Result<Option<HerdId>> {
        let previous = self.elephant(elephant)?.herd;
        if let Some(h) = previous.and_then(|h| self.herds.get_mut(&h)) {
            h.members.remove(&elephant);
        }
        if let Some(e) = self.elephants.get_mut(&elephant) {
            e.herd = None;
        }
        Ok(previous)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if absent or collected.
    pub fn elephant(&self, id: ElephantId) -> Result<&Elephant> {
        self.elephants.get(&id).ok_or_else(|| id.not_found())
    }

    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if absent.
    pub fn herd(&self, id: HerdId) -> Result<&Herd> {
        self.herds.get(&id).ok_or_else(|| id.not_found())
    }

    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if absent.
    pub fn event(&self, id: EventId) -> Result<&Event> {
        self.events.get(&id).ok_or_else(|| id.not_found())
    }

    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if absent.
    pub fn water_source(&self, id: WaterSourceId) -> Result<&WaterSource> {
        self.water_sources.get(&id).ok_or_else(|| id.not_found())
    }

    #[must_use]
    pub fn contains_elephant(&self, id: ElephantId) -> bool {
        self.elephants.contains_key(&id)
    }

    /// Stored elephants, in no particular order.
    pub fn elephants(&self) -> impl Iterator<Item = &Elephant> + '_ {
        self.elephants.values()
    }

    pub fn herds(&self) -> impl Iterator<Item = &Herd> + '_ {
        self.herds.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.values()
    }

    pub fn water_sources(&self) -> impl Iterator<Item = &WaterSource> + '_ {
        self.water_sources.values()
    }

    #[must_use]
    pub fn elephant_ids(&self) -> Vec<ElephantId> {
        sorted_keys(&self.elephants)
    }

    #[must_use]
    pub fn herd_ids(&self) -> Vec<HerdId> {
        sorted_keys(&self.herds)
    }

    #[must_use]
    pub fn event_ids(&self) -> Vec<EventId> {
        sorted_keys(&self.events)
    }

    #[must_use]
    pub fn water_source_ids(&self) -> Vec<WaterSourceId> {
        sorted_keys(&self.water_sources)
    }

    // -----------------------------------------------------------------------
    // Family queries
    // -----------------------------------------------------------------------

    /// Every elephant connected to `id` through mother, father or child
    /// links, `id` included, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if `id` is absent.
    pub fn family(&self, id: ElephantId) -> Result<Vec<ElephantId>> {
        self.elephant(id)?;
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let Some(e) = self.elephants.get(&current) else {
                continue;
            };
            for next in e.family_edges() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        let mut family: Vec<ElephantId> = seen.into_iter().collect();
        family.sort_unstable();
        Ok(family)
    }

    /// Whether `candidate` appears on any upward path from `of`.
    #[must_use]
    pub fn is_ancestor(&self, candidate: ElephantId, of: ElephantId) -> bool {
        let mut seen = HashSet::new();
        let mut stack: Vec<ElephantId> = self
            .elephants
            .get(&of)
            .map(|e| e.parents().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if current == candidate {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(e) = self.elephants.get(&current) {
                stack.extend(e.parents());
            }
        }
        false
    }

    /// The oldest female member, ties broken by smaller id.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if the herd is absent.
    pub fn matriarch(&self, herd: HerdId) -> Result<Option<ElephantId>> {
        Ok(self
            .herd(herd)?
            .members
            .iter()
            .filter_map(|id| self.elephants.get(id))
            .filter(|e| e.gender == Gender::Female)
            .min_by_key(|e| (e.birth_year, e.id))
            .map(Elephant::id))
    }

    /// Number of distinct family roots (elephants without parents reached by
    /// walking up from each member) among a herd's members.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if the herd is absent.
    pub fn family_count(&self, herd: HerdId) -> Result<usize> {
        let mut founders = HashSet::new();
        for member in &self.herd(herd)?.members {
            let mut seen = HashSet::new();
            let mut stack = vec![*member];
            while let Some(current) = stack.pop() {
                if !seen.insert(current) {
                    continue;
                }
                let Some(e) = self.elephants.get(&current) else {
                    continue;
                };
                if e.mother.is_none() && e.father.is_none() {
                    founders.insert(current);
                } else {
                    stack.extend(e.parents());
                }
            }
        }
        Ok(founders.len())
    }
}

#[cfg(feature = "test-support")]
impl Archive {
    /// Point `child`'s mother or father slot at `parent` with no relation
    /// checks and no back-link. Leaves the graph malformed on purpose.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if either id is absent.
    #[doc(hidden)]
    pub fn force_parent_slot(
        &mut self,
        child: ElephantId,
        slot: Gender,
        parent: ElephantId,
    ) -> Result<()> {
        self.elephant(parent)?;
        let c = self
            .elephants
            .get_mut(&child)
            .ok_or_else(|| child.not_found())?;
        *c.parent_slot_mut(slot) = Some(parent);
        Ok(())
    }
}

fn check_availability(year: i32, availability: Availability) -> Result<()> {
    match availability {
        Availability::Level(level) if !level.is_finite() => Err(ArchiveError::parameter(
            format!("availability level for {year} must be finite"),
        )),
        _ => Ok(()),
    }
}

fn dedup_in_order<T: Copy + Eq + std::hash::Hash>(items: &mut Vec<T>) {
    let mut seen = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(*item));
}

fn sorted_keys<K: Copy + Ord, V>(map: &HashMap<K, V>) -> Vec<K> {
    let mut keys: Vec<K> = map.keys().copied().collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventKind, Point};

    fn cow(archive: &mut Archive, name: &str, year: i32) -> ElephantId {
        archive
            .create_elephant(ElephantAttrs::new(name, Gender::Female, year), None, None)
            .unwrap_or_else(|e| panic!("create {name}: {e}"))
    }

    fn bull(archive: &mut Archive, name: &str, year: i32) -> ElephantId {
        archive
            .create_elephant(ElephantAttrs::new(name, Gender::Male, year), None, None)
            .unwrap_or_else(|e| panic!("create {name}: {e}"))
    }

    #[test]
    fn create_links_both_parents() {
        let mut a = Archive::default();
        let mother = cow(&mut a, "Ella", 1970);
        let father = bull(&mut a, "Eric", 1968);
        let calf = a
            .create_elephant(
                ElephantAttrs::new("Eden", Gender::Female, 1990),
                Some(mother),
                Some(father),
            )
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(a.elephant(mother).map(|e| e.children().to_vec()), Ok(vec![calf]));
        assert_eq!(a.elephant(father).map(|e| e.children().to_vec()), Ok(vec![calf]));
        assert_eq!(a.elephant(calf).map(Elephant::mother), Ok(Some(mother)));
        assert!(a.roots().contains(&calf));
    }

    #[test]
    fn create_rejects_wrong_gender_parent() {
        let mut a = Archive::default();
        let bull_id = bull(&mut a, "Eric", 1968);
        let err = a
            .create_elephant(ElephantAttrs::new("Eve", Gender::Female, 1990), Some(bull_id), None)
            .err();
        assert!(matches!(err, Some(ArchiveError::InvalidRelation(_))));
        assert_eq!(a.elephants().count(), 1);
        assert!(a.elephant(bull_id).is_ok_and(|e| e.children().is_empty()));
    }

    #[test]
    fn create_rejects_missing_parent_without_side_effects() {
        let mut a = Archive::default();
        let err = a
            .create_elephant(
                ElephantAttrs::new("Eve", Gender::Female, 1990),
                Some(ElephantId(42)),
                None,
            )
            .err();
        assert_eq!(
            err,
            Some(ArchiveError::NotFound {
                kind: "elephant",
                id: "42".to_string()
            })
        );
        assert_eq!(a.elephants().count(), 0);
        assert!(a.indexes().names().is_empty());
    }

    #[test]
    fn add_child_validates_relation() {
        let mut a = Archive::default();
        let mother = cow(&mut a, "Ella", 1970);
        let other = cow(&mut a, "Elsa", 1971);
        let calf = bull(&mut a, "Enzo", 1990);

        assert!(matches!(
            a.add_child(mother, mother),
            Err(ArchiveError::InvalidRelation(_))
        ));
        assert!(matches!(
            a.add_child(mother, ElephantId(99)),
            Err(ArchiveError::NotFound { .. })
        ));

        assert!(a.add_child(mother, calf).is_ok());
        assert!(matches!(
            a.add_child(mother, calf),
            Err(ArchiveError::InvalidRelation(_))
        ));
        // Mother slot already taken.
        assert!(matches!(
            a.add_child(other, calf),
            Err(ArchiveError::InvalidRelation(_))
        ));
        assert_eq!(a.elephant(other).map(|e| e.children().len()), Ok(0));
    }

    #[test]
    fn add_child_refuses_ancestry_loops() {
        let mut a = Archive::default();
        let grandma = cow(&mut a, "Ella", 1950);
        let mother = cow(&mut a, "Emma", 1970);
        let calf = cow(&mut a, "Evelyn", 1990);
        assert!(a.add_child(grandma, mother).is_ok());
        assert!(a.add_child(mother, calf).is_ok());

        assert!(a.is_ancestor(grandma, calf));
        assert!(matches!(
            a.add_child(calf, grandma),
            Err(ArchiveError::InvalidRelation(_))
        ));
    }

    #[test]
    fn assign_herd_moves_membership() {
        let mut a = Archive::default();
        let e = cow(&mut a, "Ella", 1970);
        let h1 = a.create_herd(HerdAttrs::new("Herd_A_1", "Delta Region"));
        let h2 = a.create_herd(HerdAttrs::new("Herd_B_2", "Central Plains"));

        assert!(a.assign_herd(e, h1).is_ok());
        assert!(a.assign_herd(e, h2).is_ok());
        assert!(a.herd(h1).is_ok_and(Herd::is_empty));
        assert!(a.herd(h2).is_ok_and(|h| h.contains(e)));
        assert_eq!(a.elephant(e).map(Elephant::herd), Ok(Some(h2)));

        assert_eq!(a.remove_from_herd(e), Ok(Some(h2)));
        assert!(a.herd(h2).is_ok_and(Herd::is_empty));
        assert!(a.assign_herd(e, HerdId(77)).is_err());
    }

    #[test]
    fn event_requires_existing_references() {
        let mut a = Archive::default();
        let e = cow(&mut a, "Ella", 1970);
        let missing = a.create_event(
            EventAttrs::new(EventKind::Migration, 2001).involving([e, ElephantId(5)]),
        );
        assert!(matches!(missing, Err(ArchiveError::NotFound { .. })));
        assert!(a.indexes().years().is_empty());

        let bad_loc = a.create_event(
            EventAttrs::new(EventKind::Other, 2001)
                .at(EventLocation::Coordinates(Point::new(f64::NAN, 0.0))),
        );
        assert!(matches!(bad_loc, Err(ArchiveError::InvalidParameter(_))));

        let ok = a
            .create_event(EventAttrs::new(EventKind::Migration, 2001).involving([e, e]))
            .unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(a.event(ok).map(|ev| ev.elephants().len()), Ok(1));
        assert_eq!(a.indexes().participants().get(e), &[ok]);
    }

    #[test]
    fn water_source_rejects_nan() {
        let mut a = Archive::default();
        assert!(a
            .create_water_source(WaterSourceAttrs::new("Nowhere", f64::INFINITY, 0.0))
            .is_err());
        let id = a
            .create_water_source(WaterSourceAttrs::new("Chobe Waterhole", 24.0, -18.5))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(a
            .record_availability(id, 2005, Availability::Level(f64::NAN))
            .is_err());
        assert!(a.record_availability(id, 2005, Availability::Flag(false)).is_ok());
        assert!(a.water_source(id).is_ok_and(|s| !s.available_in(2005)));
    }

    #[test]
    fn located_events_land_in_the_location_grid() {
        let mut a = Archive::default();
        let spring = a
            .create_water_source(WaterSourceAttrs::new("Savuti Marsh", 10.0, 10.0))
            .unwrap_or_else(|e| panic!("{e}"));
        let at_spring = a
            .create_event(
                EventAttrs::new(EventKind::Drought, 2005).at(EventLocation::WaterSource(spring)),
            )
            .unwrap_or_else(|e| panic!("{e}"));
        let nearby = a
            .create_event(
                EventAttrs::new(EventKind::Migration, 2006)
                    .at(EventLocation::Coordinates(Point::new(12.0, 10.0))),
            )
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(a.create_event(EventAttrs::new(EventKind::Other, 2007)).is_ok());

        let locations = a.indexes().locations();
        assert_eq!(locations.len(), 2);
        let hits = locations.within(Point::new(10.0, 10.0), 5.0);
        assert_eq!(hits, vec![(at_spring, 0.0), (nearby, 2.0)]);
    }

    #[test]
    fn visits_are_logged_once_per_year() {
        let mut a = Archive::default();
        let e = cow(&mut a, "Ella", 1970);
        let spring = a
            .create_water_source(WaterSourceAttrs::new("Savuti Marsh", 0.0, 0.0))
            .unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(a.record_visit(spring, 2005, e), Ok(true));
        assert_eq!(a.record_visit(spring, 2005, e), Ok(false));
        assert_eq!(a.record_visit(spring, 2006, e), Ok(true));
        assert!(matches!(
            a.record_visit(spring, 2005, ElephantId(9)),
            Err(ArchiveError::NotFound { .. })
        ));
        assert!(matches!(
            a.record_visit(WaterSourceId(9), 2005, e),
            Err(ArchiveError::NotFound { .. })
        ));

        assert!(a.water_source(spring).is_ok_and(|s| s.visits().len() == 2));
        let sources: Vec<_> = a.indexes().visitors().get(e).collect();
        assert_eq!(sources, vec![spring]);
    }

    #[test]
    fn herds_and_births_are_indexed_on_create() {
        let mut a = Archive::default();
        let h = a.create_herd(HerdAttrs::new("Herd_A_1", "Delta Region"));
        let ella = cow(&mut a, "Ella", 1970);
        let eli = bull(&mut a, "Eli", 1970);
        cow(&mut a, "Emma", 1990);

        let herds = a.indexes().herd_names().get("Herd_A_1");
        assert_eq!(herds.map(|ids| ids.iter().copied().collect::<Vec<_>>()), Some(vec![h]));
        assert_eq!(a.indexes().births().get(1970).collect::<Vec<_>>(), vec![ella, eli]);
        assert_eq!(a.indexes().births().len(), 3);
    }

    #[test]
    fn family_spans_the_connected_tree() {
        let mut a = Archive::default();
        let root = cow(&mut a, "Ella", 1950);
        let kid = cow(&mut a, "Emma", 1970);
        let grandkid = bull(&mut a, "Ezra", 1990);
        let stranger = cow(&mut a, "Esther", 1960);
        assert!(a.add_child(root, kid).is_ok());
        assert!(a.add_child(kid, grandkid).is_ok());

        assert_eq!(a.family(grandkid), Ok(vec![root, kid, grandkid]));
        assert_eq!(a.family(stranger), Ok(vec![stranger]));
    }

    #[test]
    fn herd_matriarch_and_family_count() {
        let mut a = Archive::default();
        let h = a.create_herd(HerdAttrs::new("Herd_A_1", "Delta Region"));
        let old = cow(&mut a, "Ella", 1950);
        let young = cow(&mut a, "Emma", 1970);
        let calf = bull(&mut a, "Eli", 1990);
        let loner = cow(&mut a, "Eva", 1965);
        assert!(a.add_child(young, calf).is_ok());
        for e in [old, young, calf, loner] {
            assert!(a.assign_herd(e, h).is_ok());
        }
        assert_eq!(a.matriarch(h), Ok(Some(old)));
        assert_eq!(a.family_count(h), Ok(3));
    }

    #[test]
    fn tombstones_grow_per_collection_until_reset() {
        let mut a = Archive::default();
        for round in 0..3 {
            let e = cow(&mut a, "Ella", 1950 + round);
            assert!(a
                .break_references(crate::lifecycle::BreakScope::Elephants(vec![e]))
                .is_ok());
            a.run_collection();
        }
        assert_eq!(a.tombstones.len(), 3);
        a.reset();
        assert!(a.tombstones.is_empty());
    }

    #[test]
    fn reset_restarts_ids() {
        let mut a = Archive::default();
        cow(&mut a, "Ella", 1950);
        a.reset();
        assert_eq!(a.elephants().count(), 0);
        assert!(a.roots().is_empty());
        assert_eq!(cow(&mut a, "Emma", 1970), ElephantId(1));
    }

    #[test]
    fn with_config_validates() {
        let mut config = ArchiveConfig::default();
        config.index.cell_size = 0.0;
        assert!(matches!(
            Archive::with_config(config),
            Err(ArchiveError::InvalidParameter(_))
        ));
    }
}
