//! Reference lifecycle: breaking external roots, then collecting.
//!
//! # States
//!
//! ```text
//!   Linked ──break_references──▶ Orphaned ──run_collection──▶ Collected
//!      ▲                            │
//!      └────────assign_herd─────────┘
//! ```
//!
//! Breaking deletes nothing. It only removes elephants from the root list and
//! their herds, so a family keeps its internal parent/child links and stays
//! in memory as an unreachable island. Collection is a separate, explicit
//! mark-and-purge pass; it never runs as a side effect of another call.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::archive::Archive;
use crate::error::Result;
use crate::model::{ElephantId, HerdId};

/// Lifecycle tag of one elephant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Reachable from an external root.
    Linked,
    /// External roots severed; still stored, kept alive only by relatives.
    Orphaned,
    /// Purged by a collection pass.
    Collected,
}

impl LifecycleState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linked => "linked",
            Self::Orphaned => "orphaned",
            Self::Collected => "collected",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which elephants a [`Archive::break_references`] call touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakScope {
    /// The connected parent/child component containing this elephant.
    Family(ElephantId),
    /// Current members of a herd.
    Herd(HerdId),
    /// An explicit list.
    Elephants(Vec<ElephantId>),
    /// Every stored elephant.
    All,
}

/// Outcome of a break pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BreakReport {
    /// Distinct elephants named by the scope.
    pub in_scope: usize,
    /// Elephants that moved from Linked to Orphaned in this call.
    pub orphaned: usize,
    /// Elephants skipped because they were already Orphaned.
    pub already_orphaned: usize,
    pub herd_links_severed: usize,
}

/// Outcome of a collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    /// Live elephants considered by the mark phase.
    pub examined: usize,
    /// Elephants reached from a root.
    pub marked: usize,
    /// Purged ids, sorted.
    pub collected: Vec<ElephantId>,
    /// Orphaned elephants that survived because a live relative reaches them.
    pub still_orphaned: usize,
    /// Event references removed while purging.
    pub events_scrubbed: usize,
    /// Water source visit entries removed while purging.
    pub visits_scrubbed: usize,
}

impl CollectionReport {
    #[must_use]
    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }
}

impl Archive {
    /// Current lifecycle tag of an elephant, including collected ones.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`](crate::ArchiveError::NotFound) for
    /// an id this archive never allocated.
    pub fn lifecycle_state(&self, id: ElephantId) -> Result<LifecycleState> {
        if let Some(state) = self.states.get(&id) {
            return Ok(*state);
        }
        if self.tombstones.contains(&id) {
            return Ok(LifecycleState::Collected);
        }
        Err(id.not_found())
    }

    /// Ids of every Orphaned elephant, sorted.
    #[must_use]
    pub fn orphaned_ids(&self) -> Vec<ElephantId> {
        let mut ids: Vec<ElephantId> = self
            .states
            .iter()
            .filter(|(_, s)| **s == LifecycleState::Orphaned)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Sever the external roots of every Linked elephant in `scope`.
    ///
    /// Each one leaves the root list and its herd and is tagged Orphaned.
    /// Parent/child links are untouched and nothing is deleted. Calling it
    /// again on the same scope changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`](crate::ArchiveError::NotFound) if
    /// the scope names an absent elephant or herd. Nothing is changed then.
    #[instrument(skip(self))]
    pub fn break_references(&mut self, scope: BreakScope) -> Result<BreakReport> {
        let targets = self.resolve_scope(&scope)?;
        let mut report = BreakReport {
            in_scope: targets.len(),
            ..BreakReport::default()
        };

        for id in targets {
            match self.states.get(&id) {
                Some(LifecycleState::Linked) => {}
                Some(LifecycleState::Orphaned) => {
                    report.already_orphaned += 1;
                    continue;
                }
                _ => {
                    warn!(%id, "skipping elephant without a live lifecycle tag");
                    continue;
                }
            }

            self.roots.remove(&id);
            if self.remove_from_herd(id)?.is_some() {
                report.herd_links_severed += 1;
            }
            self.states.insert(id, LifecycleState::Orphaned);
            report.orphaned += 1;
            debug!(%id, "elephant orphaned");
        }

        info!(
            in_scope = report.in_scope,
            orphaned = report.orphaned,
            already_orphaned = report.already_orphaned,
            herd_links_severed = report.herd_links_severed,
            "references broken"
        );
        Ok(report)
    }

    fn resolve_scope(&self, scope: &BreakScope) -> Result<BTreeSet<ElephantId>> {
        match scope {
            BreakScope::Family(id) => Ok(self.family(*id)?.into_iter().collect()),
            BreakScope::Herd(id) => Ok(self.herd(*id)?.members.clone()),
            BreakScope::Elephants(ids) => {
                for id in ids {
                    self.elephant(*id)?;
                }
                Ok(ids.iter().copied().collect())
            }
            BreakScope::All => Ok(self.elephants.keys().copied().collect()),
        }
    }

    /// Mark everything reachable from a root, then purge the rest.
    ///
    /// Roots are the root list and every herd's members. Marking follows
    /// mother, father and child links. Events are roots too, but their
    /// elephant references are non-owning and are not followed. Every
    /// unmarked elephant is removed from storage and every index, scrubbed
    /// from the events, relatives, herds and visit logs that mention it, and
    /// remembered as a tombstone.
    ///
    /// Runs in O(live elephants + relation edges). With no Orphaned elephant
    /// nothing is unreachable, so the pass changes nothing; a second pass
    /// right after a first one also changes nothing.
    #[instrument(skip(self))]
    pub fn run_collection(&mut self) -> CollectionReport {
        let marked = self.mark();
        let mut unmarked: Vec<ElephantId> = self
            .elephants
            .keys()
            .filter(|id| !marked.contains(*id))
            .copied()
            .collect();
        unmarked.sort_unstable();

        let mut report = CollectionReport {
            examined: self.elephants.len(),
            marked: marked.len(),
            ..CollectionReport::default()
        };

        let doomed: HashSet<ElephantId> = unmarked.iter().copied().collect();
        for id in &unmarked {
            let (events, visits) = self.purge(*id, &doomed);
            report.events_scrubbed += events;
            report.visits_scrubbed += visits;
        }
        self.collected_total += unmarked.len() as u64;
        report.collected = unmarked;
        report.still_orphaned = self
            .states
            .values()
            .filter(|s| **s == LifecycleState::Orphaned)
            .count();

        info!(
            examined = report.examined,
            marked = report.marked,
            collected = report.collected.len(),
            still_orphaned = report.still_orphaned,
            events_scrubbed = report.events_scrubbed,
            visits_scrubbed = report.visits_scrubbed,
            "collection finished"
        );
        report
    }

    fn mark(&self) -> HashSet<ElephantId> {
        let mut marked = HashSet::with_capacity(self.elephants.len());
        let mut stack: Vec<ElephantId> = self
            .roots
            .iter()
            .copied()
            .chain(self.herds.values().flat_map(|h| h.members.iter().copied()))
            .collect();

        while let Some(id) = stack.pop() {
            let Some(elephant) = self.elephants.get(&id) else {
                continue;
            };
            if !marked.insert(id) {
                continue;
            }
            stack.extend(elephant.family_edges().filter(|e| !marked.contains(e)));
        }
        marked
    }

    /// Remove one unreachable elephant; returns the event references and
    /// visit entries scrubbed.
    fn purge(&mut self, id: ElephantId, doomed: &HashSet<ElephantId>) -> (usize, usize) {
        let Some(elephant) = self.elephants.remove(&id) else {
            return (0, 0);
        };

        for relative in elephant.family_edges() {
            if doomed.contains(&relative) {
                continue;
            }
            if let Some(r) = self.elephants.get_mut(&relative) {
                r.scrub(id);
            }
        }
        if let Some(h) = elephant.herd.and_then(|h| self.herds.get_mut(&h)) {
            h.members.remove(&id);
        }

        let (event_ids, source_ids) = self.indexes.elephant_purged(&elephant);
        let mut scrubbed = 0;
        for event_id in event_ids {
            if let Some(event) = self.events.get_mut(&event_id) {
                let before = event.elephants.len();
                event.elephants.retain(|e| *e != id);
                scrubbed += before - event.elephants.len();
            }
        }
        let visits: usize = source_ids
            .into_iter()
            .filter_map(|s| {
                self.water_sources
                    .get_mut(&s)
                    .map(|source| source.forget_visitor(id))
            })
            .sum();

        self.states.remove(&id);
        self.roots.remove(&id);
        self.tombstones.insert(id);
        debug!(%id, name = %elephant.name, scrubbed, visits, "elephant collected");
        (scrubbed, visits)
    }
}
