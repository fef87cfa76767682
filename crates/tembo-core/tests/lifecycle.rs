//! Two-phase lifecycle scenarios driven through the public API.

use tembo_core::verify::check_archive;
use tembo_core::{
    Archive, ArchiveError, BreakScope, ElephantAttrs, ElephantId, EventAttrs, EventKind, Gender,
    HerdAttrs, LifecycleState,
};

fn assert_consistent(archive: &Archive) {
    let result = check_archive(archive);
    assert!(result.passed, "invariants broken: {:?}", result.violations);
}

fn female(archive: &mut Archive, name: &str, year: i32, mother: Option<ElephantId>) -> ElephantId {
    archive
        .create_elephant(ElephantAttrs::new(name, Gender::Female, year), mother, None)
        .unwrap_or_else(|e| panic!("create {name}: {e}"))
}

#[test]
fn three_generation_chain_is_orphaned_then_collected() {
    let mut archive = Archive::default();
    let e1 = female(&mut archive, "Ella", 1950, None);
    let e2 = female(&mut archive, "Emma", 1970, Some(e1));
    let e3 = female(&mut archive, "Eve", 1990, Some(e2));
    assert_consistent(&archive);

    let report = archive
        .break_references(BreakScope::Family(e1))
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(report.orphaned, 3);
    assert_eq!(archive.live_elephant_count(), 3);
    assert_eq!(archive.orphaned_count(), 3);
    assert_consistent(&archive);

    let report = archive.run_collection();
    assert_eq!(report.collected, vec![e1, e2, e3]);
    assert_eq!(archive.live_elephant_count(), 0);
    assert_eq!(archive.collected_total(), 3);
    assert!(matches!(
        archive.elephant(e2),
        Err(ArchiveError::NotFound { .. })
    ));
    for id in [e1, e2, e3] {
        assert_eq!(archive.lifecycle_state(id), Ok(LifecycleState::Collected));
    }
    assert_consistent(&archive);
}

#[test]
fn collection_without_orphans_is_a_no_op() {
    let mut archive = Archive::default();
    let mother = female(&mut archive, "Ella", 1950, None);
    female(&mut archive, "Emma", 1970, Some(mother));
    let before = archive.export();

    let report = archive.run_collection();
    assert!(report.collected.is_empty());
    assert_eq!(report.marked, 2);
    assert_eq!(archive.export(), before);
}

#[test]
fn only_the_broken_family_is_collected() {
    let mut archive = Archive::default();
    let herd = archive.create_herd(HerdAttrs::new("Herd_A_1", "Okavango Delta"));
    let a1 = female(&mut archive, "Ella", 1950, None);
    let a2 = female(&mut archive, "Emma", 1972, Some(a1));
    let b1 = female(&mut archive, "Bella", 1955, None);
    let b2 = female(&mut archive, "Bianca", 1975, Some(b1));
    for id in [a1, a2, b1, b2] {
        assert!(archive.assign_herd(id, herd).is_ok());
    }
    let shared = archive
        .create_event(EventAttrs::new(EventKind::Gathering, 1990).involving([a2, b2]))
        .unwrap_or_else(|e| panic!("{e}"));

    assert!(archive.break_references(BreakScope::Family(a2)).is_ok());
    assert!(archive.herd(herd).is_ok_and(|h| h.len() == 2));
    assert_consistent(&archive);

    let report = archive.run_collection();
    assert_eq!(report.collected, vec![a1, a2]);
    assert_eq!(report.events_scrubbed, 1);
    assert!(archive.event(shared).is_ok_and(|e| e.elephants() == [b2]));
    assert_eq!(archive.lifecycle_state(b1), Ok(LifecycleState::Linked));
    assert_eq!(archive.matriarch(herd), Ok(Some(b1)));
    assert_consistent(&archive);

    assert!(archive.run_collection().collected.is_empty());
}

#[test]
fn events_do_not_keep_orphans_alive() {
    let mut archive = Archive::default();
    let e = female(&mut archive, "Ella", 1950, None);
    let event = archive
        .create_event(EventAttrs::new(EventKind::Migration, 2001).involving([e]))
        .unwrap_or_else(|err| panic!("{err}"));
    assert!(archive.indexes().has_events(e));

    assert!(archive.break_references(BreakScope::All).is_ok());
    assert!(archive.contains_elephant(e));
    assert_eq!(archive.run_collection().collected, vec![e]);
    assert!(!archive.contains_elephant(e));
    assert!(archive.event(event).is_ok());
    assert!(!archive.indexes().has_events(e));
    assert_consistent(&archive);
}

#[test]
fn collected_ids_cannot_be_linked_again() {
    let mut archive = Archive::default();
    let gone = female(&mut archive, "Ella", 1950, None);
    let calf = female(&mut archive, "Emma", 1970, None);
    assert!(archive.break_references(BreakScope::Elephants(vec![gone])).is_ok());
    archive.run_collection();

    assert!(matches!(
        archive.add_child(gone, calf),
        Err(ArchiveError::NotFound { .. })
    ));
    assert!(matches!(
        archive.create_elephant(ElephantAttrs::new("Eve", Gender::Female, 1990), Some(gone), None),
        Err(ArchiveError::NotFound { .. })
    ));
    // Ids are never reused.
    let next = female(&mut archive, "Esi", 1995, None);
    assert_eq!(next, ElephantId(3));
}

#[test]
fn reset_forgets_tombstones() {
    let mut archive = Archive::default();
    let e = female(&mut archive, "Ella", 1950, None);
    assert!(archive.break_references(BreakScope::All).is_ok());
    archive.run_collection();
    archive.reset();

    assert_eq!(archive.collected_total(), 0);
    assert!(archive.lifecycle_state(e).is_err());
    assert_eq!(archive.live_entity_count(), 0);
}
