use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{ElephantId, WaterSourceId};

/// Planar coordinates. `x` is the east-west axis, `y` north-south.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Recorded water availability for one year: either a flag or a fill level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    Flag(bool),
    Level(f64),
}

impl Availability {
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::Flag(flowing) => flowing,
            Self::Level(level) => level > 0.0,
        }
    }

    #[must_use]
    pub fn is_drought(self) -> bool {
        !self.is_available()
    }
}

impl From<bool> for Availability {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Size class of a water source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capacity {
    Small,
    #[default]
    Medium,
    Large,
}

impl Capacity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Caller-supplied attributes for [`Archive::create_water_source`].
///
/// [`Archive::create_water_source`]: crate::archive::Archive::create_water_source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSourceAttrs {
    pub name: String,
    pub position: Point,
    #[serde(default)]
    pub capacity: Capacity,
    #[serde(default)]
    pub availability: BTreeMap<i32, Availability>,
}

impl WaterSourceAttrs {
    #[must_use]
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            position: Point::new(x, y),
            capacity: Capacity::default(),
            availability: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn record(mut self, year: i32, availability: impl Into<Availability>) -> Self {
        self.availability.insert(year, availability.into());
        self
    }
}

/// A water source, its year-by-year availability record and the elephants
/// seen drinking there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSource {
    pub(crate) id: WaterSourceId,
    pub(crate) name: String,
    pub(crate) position: Point,
    pub(crate) capacity: Capacity,
    pub(crate) availability: BTreeMap<i32, Availability>,
    /// year → visitors in recording order, no repeats within a year.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) visits: BTreeMap<i32, Vec<ElephantId>>,
}

impl WaterSource {
    pub(crate) fn new(id: WaterSourceId, attrs: WaterSourceAttrs) -> Self {
        Self {
            id,
            name: attrs.name,
            position: attrs.position,
            capacity: attrs.capacity,
            availability: attrs.availability,
            visits: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> WaterSourceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub const fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// The full record, ordered by year.
    #[must_use]
    pub const fn availability(&self) -> &BTreeMap<i32, Availability> {
        &self.availability
    }

    /// Whether water was available in `year`. Years without a record count
    /// as available.
    #[must_use]
    pub fn available_in(&self, year: i32) -> bool {
        self.availability
            .get(&year)
            .is_none_or(|a| a.is_available())
    }

    /// Drought-flagged years within `from..=to`, ascending. Empty when
    /// `from > to`.
    pub fn drought_years(&self, from: i32, to: i32) -> impl Iterator<Item = (i32, Availability)> + '_ {
        (from <= to)
            .then(|| self.availability.range(from..=to))
            .into_iter()
            .flatten()
            .filter(|(_, a)| a.is_drought())
            .map(|(year, a)| (*year, *a))
    }

    /// Visit log, ordered by year.
    #[must_use]
    pub const fn visits(&self) -> &BTreeMap<i32, Vec<ElephantId>> {
        &self.visits
    }

    /// Elephants recorded at this source in `year`.
    #[must_use]
    pub fn visitors_in(&self, year: i32) -> &[ElephantId] {
        self.visits.get(&year).map_or(&[], Vec::as_slice)
    }

    /// Append `elephant` to the `year` log. Returns `false` when it was
    /// already recorded for that year.
    pub(crate) fn record_visit(&mut self, year: i32, elephant: ElephantId) -> bool {
        let visitors = self.visits.entry(year).or_default();
        if visitors.contains(&elephant) {
            return false;
        }
        visitors.push(elephant);
        true
    }

    /// Drop every visit by `elephant`; empty years go too. Returns how many
    /// entries were removed.
    pub(crate) fn forget_visitor(&mut self, elephant: ElephantId) -> usize {
        let mut removed = 0;
        self.visits.retain(|_, visitors| {
            let before = visitors.len();
            visitors.retain(|v| *v != elephant);
            removed += before - visitors.len();
            !visitors.is_empty()
        });
        removed
    }

    #[must_use]
    pub fn distance_to(&self, point: Point) -> f64 {
        self.position.distance_to(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spring() -> WaterSource {
        WaterSource::new(
            WaterSourceId(1),
            WaterSourceAttrs::new("Savuti Marsh", 24.1, -18.5)
                .record(2004, true)
                .record(2005, false)
                .record(2006, Availability::Level(0.0))
                .record(2007, Availability::Level(0.4)),
        )
    }

    #[test]
    fn missing_years_count_as_available() {
        let s = spring();
        assert!(s.available_in(1990));
        assert!(s.available_in(2004));
        assert!(!s.available_in(2005));
        assert!(!s.available_in(2006));
        assert!(s.available_in(2007));
    }

    #[test]
    fn drought_years_respect_range() {
        let s = spring();
        let years: Vec<i32> = s.drought_years(2000, 2005).map(|(y, _)| y).collect();
        assert_eq!(years, vec![2005]);
        assert_eq!(s.drought_years(2000, 2030).count(), 2);
    }

    #[test]
    fn visits_repeat_only_across_years() {
        let mut s = spring();
        assert!(s.record_visit(2005, ElephantId(4)));
        assert!(s.record_visit(2005, ElephantId(2)));
        assert!(!s.record_visit(2005, ElephantId(4)));
        assert!(s.record_visit(2006, ElephantId(4)));
        assert_eq!(s.visitors_in(2005), &[ElephantId(4), ElephantId(2)]);
        assert!(s.visitors_in(1999).is_empty());

        assert_eq!(s.forget_visitor(ElephantId(4)), 2);
        assert_eq!(s.visits().len(), 1);
        assert_eq!(s.visitors_in(2005), &[ElephantId(2)]);
    }

    #[test]
    fn availability_serializes_untagged() {
        let json = serde_json::to_string(&spring().availability).unwrap_or_default();
        assert_eq!(json, r#"{"2004":true,"2005":false,"2006":0.0,"2007":0.4}"#);
    }
}
