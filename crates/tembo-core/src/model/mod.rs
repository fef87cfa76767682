//! Domain entities owned by the [`Archive`](crate::archive::Archive).
//!
//! Every relation between entities is stored as an id, never as an owning
//! handle. The archive is the only owner; severing or purging a relation is
//! plain id bookkeeping.

pub mod elephant;
pub mod event;
pub mod herd;
pub mod water;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use elephant::{Elephant, ElephantAttrs, Gender};
pub use event::{Event, EventAttrs, EventKind, EventLocation};
pub use herd::{Herd, HerdAttrs};
pub use water::{Availability, Capacity, Point, WaterSource, WaterSourceAttrs};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Entity kind used in error messages.
            pub const KIND: &'static str = $kind;

            /// Raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            pub(crate) fn not_found(self) -> crate::error::ArchiveError {
                crate::error::ArchiveError::NotFound {
                    kind: $kind,
                    id: self.0.to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Elephant`].
    ElephantId,
    "elephant"
);
entity_id!(
    /// Identifier of a [`Herd`].
    HerdId,
    "herd"
);
entity_id!(
    /// Identifier of an [`Event`].
    EventId,
    "event"
);
entity_id!(
    /// Identifier of a [`WaterSource`].
    WaterSourceId,
    "water source"
);

/// Monotonic id allocator for one entity kind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdSeq(u64);

impl IdSeq {
    pub(crate) const fn new() -> Self {
        Self(0)
    }

    pub(crate) const fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&ElephantId(12)).unwrap_or_default();
        assert_eq!(json, "12");
    }

    #[test]
    fn id_seq_starts_at_one() {
        let mut seq = IdSeq::new();
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
    }
}
