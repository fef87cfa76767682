//! Invariant oracle for an [`Archive`].
//!
//! [`check_archive`] walks the whole graph and every index and reports each
//! disagreement it finds. Tests call it after every mutation step; the CLI
//! runs it at the end of `demo`.
//!
//! # Checked invariants
//!
//! 1. Parent/child links agree in both directions, and parent genders match
//!    their slots.
//! 2. Herd membership agrees with each elephant's herd field.
//! 3. Every stored elephant is tagged Linked or Orphaned, and an elephant is
//!    on the root list exactly when it is Linked.
//! 4. No live elephant, relation, event reference or visit log entry
//!    mentions a collected id.
//! 5. Every index holds exactly what the graph implies.

use std::collections::{BTreeSet, HashMap};

use crate::archive::Archive;
use crate::lifecycle::LifecycleState;
use crate::model::{ElephantId, EventId, EventLocation, Gender, HerdId, Point, WaterSourceId};

// ── Result types ─────────────────────────────────────────────────────────────

/// Outcome of [`check_archive`].
#[derive(Debug, Clone, PartialEq)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// One broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    /// `parent` lists `child`, but `child` does not point back (or the
    /// reverse).
    OneSidedFamilyLink {
        parent: ElephantId,
        child: ElephantId,
    },
    /// A parent sits in the slot of the other gender.
    ParentGender {
        child: ElephantId,
        parent: ElephantId,
        slot: Gender,
    },
    /// A child appears more than once in one parent's list.
    DuplicateChild {
        parent: ElephantId,
        child: ElephantId,
    },
    /// Herd and elephant disagree about membership.
    OneSidedHerdLink {
        herd: HerdId,
        elephant: ElephantId,
    },
    /// A stored elephant without a Linked/Orphaned tag, or a tag for an
    /// elephant that is not stored.
    LifecycleTag {
        elephant: ElephantId,
        state: Option<LifecycleState>,
    },
    /// Root list membership does not match the Linked tag.
    RootList { elephant: ElephantId, on_list: bool },
    /// A relation or event still names an id that is not stored.
    DanglingReference { holder: String, target: ElephantId },
    /// A tombstoned id is still stored.
    ResurrectedTombstone { elephant: ElephantId },
    /// An index entry disagrees with the graph.
    IndexMismatch { index: &'static str, detail: String },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneSidedFamilyLink { parent, child } => {
                write!(f, "family link {parent} -> {child} is one-sided")
            }
            Self::ParentGender {
                child,
                parent,
                slot,
            } => write!(f, "elephant {child}: {parent} in the {slot} parent slot"),
            Self::DuplicateChild { parent, child } => {
                write!(f, "elephant {parent} lists child {child} twice")
            }
            Self::OneSidedHerdLink { herd, elephant } => {
                write!(f, "herd {herd} and elephant {elephant} disagree on membership")
            }
            Self::LifecycleTag { elephant, state } => {
                write!(f, "elephant {elephant} has lifecycle tag {state:?}")
            }
            Self::RootList { elephant, on_list } => write!(
                f,
                "elephant {elephant} root list membership is {on_list} but tag disagrees"
            ),
            Self::DanglingReference { holder, target } => {
                write!(f, "{holder} references missing elephant {target}")
            }
            Self::ResurrectedTombstone { elephant } => {
                write!(f, "collected elephant {elephant} is still stored")
            }
            Self::IndexMismatch { index, detail } => write!(f, "{index} index: {detail}"),
        }
    }
}

// ── Checker ──────────────────────────────────────────────────────────────────

/// Check every archive invariant.
#[must_use]
pub fn check_archive(archive: &Archive) -> OracleResult {
    let mut v = Vec::new();
    check_family(archive, &mut v);
    check_herds(archive, &mut v);
    check_lifecycle(archive, &mut v);
    check_events(archive, &mut v);
    check_indexes(archive, &mut v);
    OracleResult::from_violations(v)
}

fn check_family(archive: &Archive, v: &mut Vec<InvariantViolation>) {
    for (id, elephant) in &archive.elephants {
        let mut seen = BTreeSet::new();
        for child in &elephant.children {
            if !seen.insert(*child) {
                v.push(InvariantViolation::DuplicateChild {
                    parent: *id,
                    child: *child,
                });
            }
            match archive.elephants.get(child) {
                None => v.push(InvariantViolation::DanglingReference {
                    holder: format!("elephant {id}"),
                    target: *child,
                }),
                Some(c) if c.mother != Some(*id) && c.father != Some(*id) => {
                    v.push(InvariantViolation::OneSidedFamilyLink {
                        parent: *id,
                        child: *child,
                    });
                }
                Some(_) => {}
            }
        }

        for (slot, parent) in [(Gender::Female, elephant.mother), (Gender::Male, elephant.father)] {
            let Some(parent) = parent else { continue };
            match archive.elephants.get(&parent) {
                None => v.push(InvariantViolation::DanglingReference {
                    holder: format!("elephant {id}"),
                    target: parent,
                }),
                Some(p) => {
                    if !p.children.contains(id) {
                        v.push(InvariantViolation::OneSidedFamilyLink {
                            parent,
                            child: *id,
                        });
                    }
                    if p.gender != slot {
                        v.push(InvariantViolation::ParentGender {
                            child: *id,
                            parent,
                            slot,
                        });
                    }
                }
            }
        }
    }
}

fn check_herds(archive: &Archive, v: &mut Vec<InvariantViolation>) {
    for (herd_id, herd) in &archive.herds {
        for member in &herd.members {
            let agrees = archive
                .elephants
                .get(member)
                .is_some_and(|e| e.herd == Some(*herd_id));
            if !agrees {
                v.push(InvariantViolation::OneSidedHerdLink {
                    herd: *herd_id,
                    elephant: *member,
                });
            }
        }
    }
    for (id, elephant) in &archive.elephants {
        let Some(herd_id) = elephant.herd else { continue };
        let agrees = archive
            .herds
            .get(&herd_id)
            .is_some_and(|h| h.members.contains(id));
        if !agrees {
            v.push(InvariantViolation::OneSidedHerdLink {
                herd: herd_id,
                elephant: *id,
            });
        }
    }
}

fn check_lifecycle(archive: &Archive, v: &mut Vec<InvariantViolation>) {
    for id in archive.elephants.keys() {
        let state = archive.states.get(id).copied();
        match state {
            Some(LifecycleState::Linked | LifecycleState::Orphaned) => {}
            _ => v.push(InvariantViolation::LifecycleTag {
                elephant: *id,
                state,
            }),
        }
        let linked = state == Some(LifecycleState::Linked);
        let on_list = archive.roots.contains(id);
        if linked != on_list {
            v.push(InvariantViolation::RootList {
                elephant: *id,
                on_list,
            });
        }
        if archive.tombstones.contains(id) {
            v.push(InvariantViolation::ResurrectedTombstone { elephant: *id });
        }
    }
    for (id, state) in &archive.states {
        if !archive.elephants.contains_key(id) {
            v.push(InvariantViolation::LifecycleTag {
                elephant: *id,
                state: Some(*state),
            });
        }
    }
    for id in &archive.roots {
        if !archive.elephants.contains_key(id) {
            v.push(InvariantViolation::DanglingReference {
                holder: "root list".to_string(),
                target: *id,
            });
        }
    }
}

fn check_events(archive: &Archive, v: &mut Vec<InvariantViolation>) {
    for (id, event) in &archive.events {
        for elephant in &event.elephants {
            if !archive.elephants.contains_key(elephant) {
                v.push(InvariantViolation::DanglingReference {
                    holder: format!("event {id}"),
                    target: *elephant,
                });
            }
        }
    }
    for (id, source) in &archive.water_sources {
        for (year, visitors) in &source.visits {
            for elephant in visitors {
                if !archive.elephants.contains_key(elephant) {
                    v.push(InvariantViolation::DanglingReference {
                        holder: format!("water source {id} visits in {year}"),
                        target: *elephant,
                    });
                }
            }
        }
    }
}

fn check_indexes(archive: &Archive, v: &mut Vec<InvariantViolation>) {
    let idx = &archive.indexes;

    // Names.
    let mut expected_names: HashMap<&str, BTreeSet<ElephantId>> = HashMap::new();
    for e in archive.elephants.values() {
        expected_names.entry(e.name.as_str()).or_default().insert(e.id);
    }
    let actual_names: HashMap<&str, BTreeSet<ElephantId>> =
        idx.names.iter().map(|(n, ids)| (n, ids.clone())).collect();
    if expected_names != actual_names || idx.names.len() != archive.elephants.len() {
        v.push(InvariantViolation::IndexMismatch {
            index: "name",
            detail: format!(
                "{} names indexed, {} expected",
                actual_names.len(),
                expected_names.len()
            ),
        });
    }

    // Birth years.
    let mut expected_births: HashMap<i32, BTreeSet<ElephantId>> = HashMap::new();
    for e in archive.elephants.values() {
        expected_births.entry(e.birth_year).or_default().insert(e.id);
    }
    let actual_births: HashMap<i32, BTreeSet<ElephantId>> =
        idx.births.iter().map(|(y, ids)| (y, ids.clone())).collect();
    if expected_births != actual_births || idx.births.len() != archive.elephants.len() {
        v.push(InvariantViolation::IndexMismatch {
            index: "birth year",
            detail: format!(
                "{} elephants indexed, {} stored",
                idx.births.len(),
                archive.elephants.len()
            ),
        });
    }

    // Herd names.
    let mut expected_herds: HashMap<&str, BTreeSet<HerdId>> = HashMap::new();
    for h in archive.herds.values() {
        expected_herds.entry(h.name.as_str()).or_default().insert(h.id);
    }
    let actual_herds: HashMap<&str, BTreeSet<HerdId>> =
        idx.herd_names.iter().map(|(n, ids)| (n, ids.clone())).collect();
    if expected_herds != actual_herds {
        v.push(InvariantViolation::IndexMismatch {
            index: "herd name",
            detail: format!(
                "{} names indexed, {} expected",
                actual_herds.len(),
                expected_herds.len()
            ),
        });
    }

    // Years: every event under its own year, ascending creation order.
    let mut expected_years: HashMap<i32, Vec<EventId>> = HashMap::new();
    for e in archive.events.values() {
        expected_years.entry(e.year).or_default().push(e.id);
    }
    for ids in expected_years.values_mut() {
        ids.sort_unstable();
    }
    let actual_years: HashMap<i32, Vec<EventId>> =
        idx.years.iter().map(|(y, ids)| (y, ids.to_vec())).collect();
    if expected_years != actual_years {
        v.push(InvariantViolation::IndexMismatch {
            index: "year",
            detail: format!(
                "{} years indexed, {} expected",
                actual_years.len(),
                expected_years.len()
            ),
        });
    }

    // Participants.
    let mut expected_participants: HashMap<ElephantId, Vec<EventId>> = HashMap::new();
    for e in archive.events.values() {
        for elephant in &e.elephants {
            expected_participants.entry(*elephant).or_default().push(e.id);
        }
    }
    for ids in expected_participants.values_mut() {
        ids.sort_unstable();
    }
    let actual_participants: HashMap<ElephantId, Vec<EventId>> = idx
        .participants
        .iter()
        .map(|(e, ids)| (e, ids.to_vec()))
        .collect();
    if expected_participants != actual_participants {
        v.push(InvariantViolation::IndexMismatch {
            index: "participant",
            detail: format!(
                "{} elephants indexed, {} expected",
                actual_participants.len(),
                expected_participants.len()
            ),
        });
    }

    // Spatial: each source once, in the cell its position maps to.
    let mut placed: BTreeSet<WaterSourceId> = BTreeSet::new();
    for (cell, id, _) in idx.spatial.iter() {
        let expected_cell = archive
            .water_sources
            .get(&id)
            .map(|s| idx.spatial.cell_of(s.position));
        if expected_cell != Some(cell) || !placed.insert(id) {
            v.push(InvariantViolation::IndexMismatch {
                index: "spatial",
                detail: format!("water source {id} misplaced in cell {cell:?}"),
            });
        }
    }
    if placed.len() != archive.water_sources.len() {
        v.push(InvariantViolation::IndexMismatch {
            index: "spatial",
            detail: format!(
                "{} sources placed, {} stored",
                placed.len(),
                archive.water_sources.len()
            ),
        });
    }

    // Locations: each located event once, at its own position.
    let expected_positions: HashMap<EventId, Point> = archive
        .events
        .values()
        .filter_map(|e| {
            let p = match e.location? {
                EventLocation::Coordinates(p) => p,
                EventLocation::WaterSource(s) => archive.water_sources.get(&s)?.position,
            };
            Some((e.id, p))
        })
        .collect();
    let mut located: BTreeSet<EventId> = BTreeSet::new();
    for (cell, id, p) in idx.locations.iter() {
        let agrees = expected_positions.get(&id) == Some(&p) && idx.locations.cell_of(p) == cell;
        if !agrees || !located.insert(id) {
            v.push(InvariantViolation::IndexMismatch {
                index: "location",
                detail: format!("event {id} misplaced in cell {cell:?}"),
            });
        }
    }
    if located.len() != expected_positions.len() {
        v.push(InvariantViolation::IndexMismatch {
            index: "location",
            detail: format!(
                "{} events placed, {} located",
                located.len(),
                expected_positions.len()
            ),
        });
    }

    // Visitors: the reverse of every source's visit log.
    let mut expected_visitors: HashMap<ElephantId, BTreeSet<WaterSourceId>> = HashMap::new();
    for source in archive.water_sources.values() {
        for elephant in source.visits.values().flatten() {
            expected_visitors.entry(*elephant).or_default().insert(source.id);
        }
    }
    let actual_visitors: HashMap<ElephantId, BTreeSet<WaterSourceId>> =
        idx.visitors.iter().map(|(e, s)| (e, s.clone())).collect();
    if expected_visitors != actual_visitors {
        v.push(InvariantViolation::IndexMismatch {
            index: "visitor",
            detail: format!(
                "{} visitors indexed, {} expected",
                actual_visitors.len(),
                expected_visitors.len()
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::BreakScope;
    use crate::model::{ElephantAttrs, EventAttrs, EventKind, HerdAttrs, WaterSourceAttrs};

    fn small_archive() -> Archive {
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
        assert!(a.assign_herd(calf, herd).is_ok());
        assert!(a
            .create_event(EventAttrs::new(EventKind::Birth, 1990).involving([calf, mother]))
            .is_ok());
        let spring = a
            .create_water_source(WaterSourceAttrs::new("Chobe Waterhole", 3.5, -2.0))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(a
            .create_event(
                EventAttrs::new(EventKind::Drought, 1991).at(EventLocation::WaterSource(spring)),
            )
            .is_ok());
        assert_eq!(a.record_visit(spring, 1991, calf), Ok(true));
        a
    }

    #[test]
    fn consistent_archive_passes() {
        let mut a = small_archive();
        assert_eq!(check_archive(&a).violations, vec![]);
        assert!(a.break_references(BreakScope::All).is_ok());
        a.run_collection();
        let result = check_archive(&a);
        assert!(result.passed, "{:?}", result.violations);
    }

    #[test]
    fn detects_one_sided_child_link() {
        let mut a = small_archive();
        if let Some(e) = a.elephants.get_mut(&ElephantId(2)) {
            e.mother = None;
        }
        let result = check_archive(&a);
        assert!(!result.passed);
        assert!(result.violations.contains(&InvariantViolation::OneSidedFamilyLink {
            parent: ElephantId(1),
            child: ElephantId(2),
        }));
    }

    #[test]
    fn detects_root_list_drift() {
        let mut a = small_archive();
        a.roots.remove(&ElephantId(1));
        let result = check_archive(&a);
        assert!(result.violations.contains(&InvariantViolation::RootList {
            elephant: ElephantId(1),
            on_list: false,
        }));
    }

    #[test]
    fn detects_dangling_visit_and_stale_visitor_index() {
        let mut a = small_archive();
        if let Some(s) = a.water_sources.get_mut(&WaterSourceId(1)) {
            s.visits.entry(1992).or_default().push(ElephantId(40));
        }
        let result = check_archive(&a);
        assert!(result.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::DanglingReference { target, .. } if *target == ElephantId(40)
        )));
        assert!(result.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::IndexMismatch { index: "visitor", .. }
        )));
    }

    #[test]
    fn detects_birth_index_drift() {
        let mut a = small_archive();
        if let Some(e) = a.elephants.get_mut(&ElephantId(1)) {
            e.birth_year = 1971;
        }
        let result = check_archive(&a);
        assert!(result.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::IndexMismatch { index: "birth year", .. }
        )));
    }

    #[test]
    fn detects_dangling_event_reference() {
        let mut a = small_archive();
        if let Some(ev) = a.events.get_mut(&EventId(1)) {
            ev.elephants.push(ElephantId(40));
        }
        let result = check_archive(&a);
        assert!(result.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::DanglingReference { target, .. } if *target == ElephantId(40)
        )));
        assert!(result.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::IndexMismatch { index: "participant", .. }
        )));
    }
}
