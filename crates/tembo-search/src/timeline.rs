//! Per-elephant timelines: ancestry plus a dated life history.
//!
//! The ancestry walk follows mother and father links upward, breadth first,
//! up to `search.max_timeline_depth` generations. Before walking, a
//! depth-first pass with on-path marking checks that no upward path returns
//! to an elephant already on it. A well-formed archive never has such a
//! loop (`add_child` refuses to create one), so hitting one means the graph
//! is corrupt and the query fails with [`ArchiveError::CycleDetected`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tembo_core::{ArchiveError, ElephantId, EventId, EventKind, Result};
use tracing::debug;

use crate::engine::SearchEngine;
use crate::stats::bump;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentRole {
    Mother,
    Father,
}

/// One ancestor reached by the upward walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ancestor {
    pub id: ElephantId,
    pub name: String,
    /// 1 for parents, 2 for grandparents, and so on.
    pub generation: usize,
    /// Slot through which this ancestor was first reached.
    pub role: ParentRole,
    pub birth_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    Born,
    ChildBorn { child: ElephantId, name: String },
    Event { event: EventId, kind: EventKind, description: String },
    Died,
}

impl TimelineEvent {
    const fn rank(&self) -> u8 {
        match self {
            Self::Born => 0,
            Self::ChildBorn { .. } => 1,
            Self::Event { .. } => 2,
            Self::Died => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub year: i32,
    #[serde(flatten)]
    pub what: TimelineEvent,
}

/// Ancestry and chronological history of one elephant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub elephant: ElephantId,
    pub name: String,
    pub ancestors: Vec<Ancestor>,
    /// Whether the walk stopped at the depth limit with more ancestors above.
    pub truncated: bool,
    pub entries: Vec<TimelineEntry>,
}

impl SearchEngine<'_> {
    /// Build the timeline of one elephant.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if the elephant is not stored.
    /// - [`ArchiveError::CycleDetected`] if an upward path loops.
    pub fn elephant_timeline(&self, id: ElephantId) -> Result<Timeline> {
        bump(&self.counters.timeline);
        let elephant = self.archive.elephant(id)?;
        self.check_ancestry_acyclic(id)?;
        let (ancestors, truncated) = self.ancestors(id);

        let mut entries = vec![TimelineEntry {
            year: elephant.birth_year(),
            what: TimelineEvent::Born,
        }];
        for child in elephant.children() {
            match self.archive.elephant(*child) {
                Ok(c) => entries.push(TimelineEntry {
                    year: c.birth_year(),
                    what: TimelineEvent::ChildBorn {
                        child: *child,
                        name: c.name().to_string(),
                    },
                }),
                Err(_) => tracing::warn!(elephant = %id, %child, "skipping dangling child id"),
            }
        }
        for event_id in self.archive.indexes().participants().get(id) {
            let Ok(event) = self.archive.event(*event_id) else {
                continue;
            };
            entries.push(TimelineEntry {
                year: event.year(),
                what: TimelineEvent::Event {
                    event: event.id(),
                    kind: event.kind(),
                    description: event.description().to_string(),
                },
            });
        }
        if let Some(year) = elephant.death_year() {
            entries.push(TimelineEntry {
                year,
                what: TimelineEvent::Died,
            });
        }
        entries.sort_by(|a, b| {
            (a.year, a.what.rank())
                .cmp(&(b.year, b.what.rank()))
                .then_with(|| entry_id(a).cmp(&entry_id(b)))
        });

        debug!(
            elephant = %id,
            ancestors = ancestors.len(),
            truncated,
            entries = entries.len(),
            "timeline built"
        );
        Ok(Timeline {
            elephant: id,
            name: elephant.name().to_string(),
            ancestors,
            truncated,
            entries,
        })
    }

    /// Depth-first walk over parent links with on-path marking.
    fn check_ancestry_acyclic(&self, start: ElephantId) -> Result<()> {
        let mut on_path: HashSet<ElephantId> = HashSet::new();
        let mut done: HashSet<ElephantId> = HashSet::new();
        // (id, parents already pushed)
        let mut stack: Vec<(ElephantId, bool)> = vec![(start, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                on_path.remove(&id);
                done.insert(id);
                continue;
            }
            if done.contains(&id) {
                continue;
            }
            on_path.insert(id);
            stack.push((id, true));
            let Ok(e) = self.archive.elephant(id) else {
                continue;
            };
            for parent in e.parents() {
                if on_path.contains(&parent) {
                    return Err(ArchiveError::CycleDetected {
                        start: start.get(),
                        revisited: parent.get(),
                    });
                }
                if !done.contains(&parent) {
                    stack.push((parent, false));
                }
            }
        }
        Ok(())
    }

    fn ancestors(&self, start: ElephantId) -> (Vec<Ancestor>, bool) {
        let max_depth = self.config.max_timeline_depth;
        let mut seen: HashMap<ElephantId, usize> = HashMap::from([(start, 0)]);
        let mut ancestors = Vec::new();
        let mut frontier = vec![start];
        let mut truncated = false;

        for generation in 1.. {
            if frontier.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for id in &frontier {
                let Ok(e) = self.archive.elephant(*id) else {
                    continue;
                };
                let parents = [(e.mother(), ParentRole::Mother), (e.father(), ParentRole::Father)];
                for (parent, role) in parents {
                    let Some(parent) = parent else { continue };
                    if generation > max_depth {
                        truncated = true;
                        continue;
                    }
                    if seen.contains_key(&parent) {
                        continue;
                    }
                    let Ok(p) = self.archive.elephant(parent) else {
                        continue;
                    };
                    seen.insert(parent, generation);
                    ancestors.push(Ancestor {
                        id: parent,
                        name: p.name().to_string(),
                        generation,
                        role,
                        birth_year: p.birth_year(),
                    });
                    next.push(parent);
                }
            }
            if generation > max_depth {
                break;
            }
            frontier = next;
        }
        (ancestors, truncated)
    }
}

fn entry_id(entry: &TimelineEntry) -> u64 {
    match &entry.what {
        TimelineEvent::ChildBorn { child, .. } => child.get(),
        TimelineEvent::Event { event, .. } => event.get(),
        TimelineEvent::Born | TimelineEvent::Died => 0,
    }
}
