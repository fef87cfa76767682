use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ElephantId, HerdId};

/// Biological sex, which decides the parent slot a parent fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }

    /// One-letter form used in compact output (`F` / `M`).
    #[must_use]
    pub const fn short(self) -> char {
        match self {
            Self::Female => 'F',
            Self::Male => 'M',
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied attributes for [`Archive::create_elephant`].
///
/// [`Archive::create_elephant`]: crate::archive::Archive::create_elephant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElephantAttrs {
    pub name: String,
    pub gender: Gender,
    pub birth_year: i32,
    #[serde(default)]
    pub death_year: Option<i32>,
}

impl ElephantAttrs {
    #[must_use]
    pub fn new(name: impl Into<String>, gender: Gender, birth_year: i32) -> Self {
        Self {
            name: name.into(),
            gender,
            birth_year,
            death_year: None,
        }
    }

    #[must_use]
    pub const fn died(mut self, year: i32) -> Self {
        self.death_year = Some(year);
        self
    }
}

/// An elephant and its relation ids.
///
/// Relation fields are only writable inside the crate so that the archive
/// can keep both directions of every link in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elephant {
    pub(crate) id: ElephantId,
    pub(crate) name: String,
    pub(crate) gender: Gender,
    pub(crate) birth_year: i32,
    pub(crate) death_year: Option<i32>,
    pub(crate) children: Vec<ElephantId>,
    pub(crate) mother: Option<ElephantId>,
    pub(crate) father: Option<ElephantId>,
    pub(crate) herd: Option<HerdId>,
}

impl Elephant {
    pub(crate) fn new(id: ElephantId, attrs: ElephantAttrs) -> Self {
        Self {
            id,
            name: attrs.name,
            gender: attrs.gender,
            birth_year: attrs.birth_year,
            death_year: attrs.death_year,
            children: Vec::new(),
            mother: None,
            father: None,
            herd: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ElephantId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn gender(&self) -> Gender {
        self.gender
    }

    #[must_use]
    pub const fn birth_year(&self) -> i32 {
        self.birth_year
    }

    #[must_use]
    pub const fn death_year(&self) -> Option<i32> {
        self.death_year
    }

    /// Children in the order they were linked.
    #[must_use]
    pub fn children(&self) -> &[ElephantId] {
        &self.children
    }

    #[must_use]
    pub const fn mother(&self) -> Option<ElephantId> {
        self.mother
    }

    #[must_use]
    pub const fn father(&self) -> Option<ElephantId> {
        self.father
    }

    #[must_use]
    pub const fn herd(&self) -> Option<HerdId> {
        self.herd
    }

    /// Both parents, mother first.
    pub fn parents(&self) -> impl Iterator<Item = ElephantId> + '_ {
        self.mother.into_iter().chain(self.father)
    }

    /// Every id this elephant points at through family edges.
    pub fn family_edges(&self) -> impl Iterator<Item = ElephantId> + '_ {
        self.parents().chain(self.children.iter().copied())
    }

    /// Age reached in `year` (negative before birth).
    #[must_use]
    pub const fn age_in_year(&self, year: i32) -> i32 {
        year - self.birth_year
    }

    pub(crate) fn parent_slot_mut(&mut self, gender: Gender) -> &mut Option<ElephantId> {
        match gender {
            Gender::Female => &mut self.mother,
            Gender::Male => &mut self.father,
        }
    }

    /// Drop every reference to `id` from this elephant's relation fields.
    pub(crate) fn scrub(&mut self, id: ElephantId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != id);
        let mut changed = self.children.len() != before;
        if self.mother == Some(id) {
            self.mother = None;
            changed = true;
        }
        if self.father == Some(id) {
            self.father = None;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calf() -> Elephant {
        let mut e = Elephant::new(ElephantId(3), ElephantAttrs::new("Eli", Gender::Male, 2001));
        e.mother = Some(ElephantId(1));
        e.father = Some(ElephantId(2));
        e.children = vec![ElephantId(4), ElephantId(5)];
        e
    }

    #[test]
    fn parents_lists_mother_first() {
        let e = calf();
        assert_eq!(e.parents().collect::<Vec<_>>(), vec![ElephantId(1), ElephantId(2)]);
        assert_eq!(e.family_edges().count(), 4);
    }

    #[test]
    fn scrub_removes_every_reference() {
        let mut e = calf();
        assert!(e.scrub(ElephantId(1)));
        assert!(e.scrub(ElephantId(5)));
        assert!(!e.scrub(ElephantId(99)));
        assert_eq!(e.mother(), None);
        assert_eq!(e.children(), &[ElephantId(4)]);
    }

    #[test]
    fn age_is_relative_to_birth() {
        assert_eq!(calf().age_in_year(2011), 10);
    }
}
