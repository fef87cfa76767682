use std::collections::HashMap;

use crate::model::EventId;

/// year → event ids, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct YearIndex {
    by_year: HashMap<i32, Vec<EventId>>,
    entries: usize,
}

impl YearIndex {
    pub(crate) fn insert(&mut self, year: i32, id: EventId) {
        self.by_year.entry(year).or_default().push(id);
        self.entries += 1;
    }

    /// Events recorded for exactly `year`, oldest first.
    #[must_use]
    pub fn get(&self, year: i32) -> &[EventId] {
        self.by_year.get(&year).map_or(&[], Vec::as_slice)
    }

    /// Events for every year in `from..=to`, ordered by year then insertion.
    #[must_use]
    pub fn range(&self, from: i32, to: i32) -> Vec<EventId> {
        if from > to {
            return Vec::new();
        }
        let mut years: Vec<i32> = self
            .by_year
            .keys()
            .copied()
            .filter(|y| (from..=to).contains(y))
            .collect();
        years.sort_unstable();
        years
            .into_iter()
            .flat_map(|y| self.get(y).iter().copied())
            .collect()
    }

    /// Number of distinct years with at least one event.
    #[must_use]
    pub fn years(&self) -> usize {
        self.by_year.len()
    }

    /// Total event ids held.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (i32, &[EventId])> + '_ {
        self.by_year.iter().map(|(y, ids)| (*y, ids.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_per_year() {
        let mut idx = YearIndex::default();
        idx.insert(2005, EventId(3));
        idx.insert(2001, EventId(1));
        idx.insert(2005, EventId(2));
        assert_eq!(idx.get(2005), &[EventId(3), EventId(2)]);
        assert_eq!(idx.get(1999), &[] as &[EventId]);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.years(), 2);
    }

    #[test]
    fn range_orders_by_year() {
        let mut idx = YearIndex::default();
        idx.insert(2005, EventId(1));
        idx.insert(2001, EventId(2));
        idx.insert(2010, EventId(3));
        assert_eq!(idx.range(2000, 2006), vec![EventId(2), EventId(1)]);
        assert!(idx.range(2006, 2000).is_empty());
    }
}
