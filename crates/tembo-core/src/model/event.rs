use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ElephantId, EventId, HerdId, Point, WaterSourceId};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Migration,
    Birth,
    Drought,
    WaterDiscovery,
    Gathering,
    Danger,
    Other,
}

impl EventKind {
    pub const ALL: [Self; 7] = [
        Self::Migration,
        Self::Birth,
        Self::Drought,
        Self::WaterDiscovery,
        Self::Gathering,
        Self::Danger,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Migration => "migration",
            Self::Birth => "birth",
            Self::Drought => "drought",
            Self::WaterDiscovery => "water_discovery",
            Self::Gathering => "gathering",
            Self::Danger => "danger",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("unknown event kind '{s}'"))
    }
}

/// Where an event took place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLocation {
    WaterSource(WaterSourceId),
    Coordinates(Point),
}

/// Caller-supplied attributes for [`Archive::create_event`].
///
/// [`Archive::create_event`]: crate::archive::Archive::create_event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAttrs {
    pub kind: EventKind,
    pub year: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub elephants: Vec<ElephantId>,
    #[serde(default)]
    pub herds: Vec<HerdId>,
    #[serde(default)]
    pub location: Option<EventLocation>,
}

impl EventAttrs {
    #[must_use]
    pub fn new(kind: EventKind, year: i32) -> Self {
        Self {
            kind,
            year,
            description: String::new(),
            elephants: Vec::new(),
            herds: Vec::new(),
            location: None,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn involving(mut self, elephants: impl IntoIterator<Item = ElephantId>) -> Self {
        self.elephants.extend(elephants);
        self
    }

    #[must_use]
    pub fn with_herds(mut self, herds: impl IntoIterator<Item = HerdId>) -> Self {
        self.herds.extend(herds);
        self
    }

    #[must_use]
    pub const fn at(mut self, location: EventLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// A historical event. Its elephant references never keep an elephant alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub(crate) id: EventId,
    pub(crate) kind: EventKind,
    pub(crate) year: i32,
    pub(crate) description: String,
    pub(crate) elephants: Vec<ElephantId>,
    pub(crate) herds: Vec<HerdId>,
    pub(crate) location: Option<EventLocation>,
}

impl Event {
    pub(crate) fn new(id: EventId, attrs: EventAttrs) -> Self {
        Self {
            id,
            kind: attrs.kind,
            year: attrs.year,
            description: attrs.description,
            elephants: attrs.elephants,
            herds: attrs.herds,
            location: attrs.location,
        }
    }

    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn elephants(&self) -> &[ElephantId] {
        &self.elephants
    }

    #[must_use]
    pub fn herds(&self) -> &[HerdId] {
        &self.herds
    }

    #[must_use]
    pub const fn location(&self) -> Option<EventLocation> {
        self.location
    }
}
