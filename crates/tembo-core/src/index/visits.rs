use std::collections::{BTreeSet, HashMap};

use crate::model::{ElephantId, WaterSourceId};

/// elephant id → water sources that recorded a visit from it.
///
/// The reverse of each source's visit log, so a collected elephant can be
/// scrubbed from exactly the sources that mention it.
#[derive(Debug, Clone, Default)]
pub struct VisitorIndex {
    by_elephant: HashMap<ElephantId, BTreeSet<WaterSourceId>>,
    entries: usize,
}

impl VisitorIndex {
    pub(crate) fn insert(&mut self, elephant: ElephantId, source: WaterSourceId) {
        if self.by_elephant.entry(elephant).or_default().insert(source) {
            self.entries += 1;
        }
    }

    pub(crate) fn remove_elephant(&mut self, elephant: ElephantId) -> BTreeSet<WaterSourceId> {
        let sources = self.by_elephant.remove(&elephant).unwrap_or_default();
        self.entries -= sources.len();
        sources
    }

    /// Sources `elephant` has visited, by id.
    pub fn get(&self, elephant: ElephantId) -> impl Iterator<Item = WaterSourceId> + '_ {
        self.by_elephant.get(&elephant).into_iter().flatten().copied()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ElephantId, &BTreeSet<WaterSourceId>)> + '_ {
        self.by_elephant.iter().map(|(e, s)| (*e, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_entry_per_elephant_and_source() {
        let mut idx = VisitorIndex::default();
        idx.insert(ElephantId(1), WaterSourceId(3));
        idx.insert(ElephantId(1), WaterSourceId(3));
        idx.insert(ElephantId(1), WaterSourceId(2));
        assert_eq!(idx.len(), 2);
        let sources: Vec<_> = idx.get(ElephantId(1)).collect();
        assert_eq!(sources, vec![WaterSourceId(2), WaterSourceId(3)]);
        assert_eq!(idx.remove_elephant(ElephantId(1)).len(), 2);
        assert!(idx.is_empty());
    }
}
