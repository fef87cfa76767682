use std::collections::{BTreeMap, BTreeSet};

use crate::model::ElephantId;

/// birth year → live elephant ids.
#[derive(Debug, Clone, Default)]
pub struct BirthYearIndex {
    by_year: BTreeMap<i32, BTreeSet<ElephantId>>,
    entries: usize,
}

impl BirthYearIndex {
    pub(crate) fn insert(&mut self, year: i32, id: ElephantId) {
        if self.by_year.entry(year).or_default().insert(id) {
            self.entries += 1;
        }
    }

    pub(crate) fn remove(&mut self, year: i32, id: ElephantId) -> bool {
        let Some(ids) = self.by_year.get_mut(&year) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            self.by_year.remove(&year);
        }
        if removed {
            self.entries -= 1;
        }
        removed
    }

    /// Elephants born in `year`, by id.
    pub fn get(&self, year: i32) -> impl Iterator<Item = ElephantId> + '_ {
        self.by_year.get(&year).into_iter().flatten().copied()
    }

    /// Elephants born in `from..=to`, by year then id. Empty when `from > to`.
    #[must_use]
    pub fn range(&self, from: i32, to: i32) -> Vec<ElephantId> {
        if from > to {
            return Vec::new();
        }
        self.by_year
            .range(from..=to)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    #[must_use]
    pub fn years(&self) -> usize {
        self.by_year.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (i32, &BTreeSet<ElephantId>)> + '_ {
        self.by_year.iter().map(|(y, ids)| (*y, ids))
    }
}
