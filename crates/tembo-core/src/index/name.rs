use std::collections::{BTreeSet, HashMap};

use crate::model::ElephantId;

/// name → ids. Names are not unique. Used for elephants and for herds.
#[derive(Debug, Clone)]
pub struct NameIndex<I = ElephantId> {
    by_name: HashMap<String, BTreeSet<I>>,
    entries: usize,
}

impl<I> Default for NameIndex<I> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            entries: 0,
        }
    }
}

impl<I: Copy + Ord> NameIndex<I> {
    pub(crate) fn insert(&mut self, name: &str, id: I) {
        if self.by_name.entry(name.to_string()).or_default().insert(id) {
            self.entries += 1;
        }
    }

    pub(crate) fn remove(&mut self, name: &str, id: I) -> bool {
        let Some(ids) = self.by_name.get_mut(name) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            self.by_name.remove(name);
        }
        if removed {
            self.entries -= 1;
        }
        removed
    }

    /// Ids of every live entity called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BTreeSet<I>> {
        self.by_name.get(name)
    }

    #[must_use]
    pub fn distinct_names(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<I>)> + '_ {
        self.by_name.iter().map(|(n, ids)| (n.as_str(), ids))
    }
}
