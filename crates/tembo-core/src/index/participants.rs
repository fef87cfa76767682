use std::collections::HashMap;

use crate::model::{ElephantId, EventId};

/// elephant id → ids of the events that reference it, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ParticipantIndex {
    by_elephant: HashMap<ElephantId, Vec<EventId>>,
    entries: usize,
}

impl ParticipantIndex {
    pub(crate) fn insert(&mut self, elephant: ElephantId, event: EventId) {
        self.by_elephant.entry(elephant).or_default().push(event);
        self.entries += 1;
    }

    /// Drop an elephant and hand back the events that referenced it.
    pub(crate) fn remove_elephant(&mut self, elephant: ElephantId) -> Vec<EventId> {
        let events = self.by_elephant.remove(&elephant).unwrap_or_default();
        self.entries -= events.len();
        events
    }

    #[must_use]
    pub fn get(&self, elephant: ElephantId) -> &[EventId] {
        self.by_elephant.get(&elephant).map_or(&[], Vec::as_slice)
    }

    /// Number of elephants referenced by at least one event.
    #[must_use]
    pub fn elephants(&self) -> usize {
        self.by_elephant.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ElephantId, &[EventId])> + '_ {
        self.by_elephant.iter().map(|(e, ids)| (*e, ids.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_returns_referencing_events() {
        let mut idx = ParticipantIndex::default();
        idx.insert(ElephantId(1), EventId(10));
        idx.insert(ElephantId(1), EventId(11));
        idx.insert(ElephantId(2), EventId(11));
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.remove_elephant(ElephantId(1)), vec![EventId(10), EventId(11)]);
        assert_eq!(idx.len(), 1);
        assert!(idx.remove_elephant(ElephantId(1)).is_empty());
        assert_eq!(idx.get(ElephantId(2)), &[EventId(11)]);
    }
}
