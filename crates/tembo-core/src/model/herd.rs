use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{ElephantId, HerdId};

/// Caller-supplied attributes for [`Archive::create_herd`].
///
/// [`Archive::create_herd`]: crate::archive::Archive::create_herd
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerdAttrs {
    pub name: String,
    #[serde(default)]
    pub territory: String,
}

impl HerdAttrs {
    #[must_use]
    pub fn new(name: impl Into<String>, territory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            territory: territory.into(),
        }
    }
}

/// A herd and its member ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Herd {
    pub(crate) id: HerdId,
    pub(crate) name: String,
    pub(crate) territory: String,
    pub(crate) members: BTreeSet<ElephantId>,
}

impl Herd {
    pub(crate) fn new(id: HerdId, attrs: HerdAttrs) -> Self {
        Self {
            id,
            name: attrs.name,
            territory: attrs.territory,
            members: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> HerdId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn territory(&self) -> &str {
        &self.territory
    }

    #[must_use]
    pub const fn members(&self) -> &BTreeSet<ElephantId> {
        &self.members
    }

    #[must_use]
    pub fn contains(&self, id: ElephantId) -> bool {
        self.members.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
