//! Grid over event positions.
//!
//! Events located at coordinates are placed at those coordinates; events
//! located at a water source are placed at the source. Events without a
//! location are not indexed here. Events are never removed, so the grid
//! only grows.
//!
//! A radius query visits every cell overlapping the query square, or every
//! occupied cell when that is fewer, then keeps the points inside the
//! circle.

use std::collections::HashMap;

use super::spatial::{CellKey, cell_key};
use crate::model::{EventId, Point};

#[derive(Debug, Clone)]
pub struct LocationGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<(EventId, Point)>>,
    entries: usize,
}

impl LocationGrid {
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            entries: 0,
        }
    }

    #[must_use]
    pub fn cell_of(&self, p: Point) -> CellKey {
        cell_key(p, self.cell_size)
    }

    pub(crate) fn insert(&mut self, id: EventId, p: Point) {
        let key = self.cell_of(p);
        self.cells.entry(key).or_default().push((id, p));
        self.entries += 1;
    }

    /// Events within `radius` of `center`, closest first, ties by id.
    ///
    /// A non-finite center or a negative or non-finite radius matches
    /// nothing.
    #[must_use]
    pub fn within(&self, center: Point, radius: f64) -> Vec<(EventId, f64)> {
        if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
            return Vec::new();
        }
        let lo = self.cell_of(Point::new(center.x - radius, center.y - radius));
        let hi = self.cell_of(Point::new(center.x + radius, center.y + radius));
        let square = (u128::from(lo.0.abs_diff(hi.0)) + 1)
            .saturating_mul(u128::from(lo.1.abs_diff(hi.1)) + 1);

        let mut hits = Vec::new();
        let mut visit = |bucket: &[(EventId, Point)]| {
            for (id, p) in bucket {
                let d = p.distance_to(center);
                if d <= radius {
                    hits.push((*id, d));
                }
            }
        };
        if square > u128::try_from(self.cells.len()).unwrap_or(u128::MAX) {
            self.cells
                .iter()
                .filter(|(key, _)| (lo.0..=hi.0).contains(&key.0) && (lo.1..=hi.1).contains(&key.1))
                .for_each(|(_, bucket)| visit(bucket));
        } else {
            for x in lo.0..=hi.0 {
                for y in lo.1..=hi.1 {
                    if let Some(bucket) = self.cells.get(&(x, y)) {
                        visit(bucket);
                    }
                }
            }
        }
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        hits
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellKey, EventId, Point)> + '_ {
        self.cells
            .iter()
            .flat_map(|(key, bucket)| bucket.iter().map(move |(id, p)| (*key, *id, *p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> LocationGrid {
        let mut g = LocationGrid::new(1.0);
        g.insert(EventId(1), Point::new(0.2, 0.2));
        g.insert(EventId(2), Point::new(1.5, 0.2));
        g.insert(EventId(3), Point::new(-3.0, -3.0));
        g.insert(EventId(4), Point::new(0.2, 0.2));
        g
    }

    #[test]
    fn radius_is_a_circle_not_a_square() {
        let g = grid();
        let ids: Vec<EventId> = g.within(Point::new(0.0, 0.0), 1.0).iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![EventId(1), EventId(4)]);
        let ids: Vec<EventId> = g.within(Point::new(0.0, 0.0), 1.6).iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![EventId(1), EventId(4), EventId(2)]);
    }

    #[test]
    fn zero_radius_matches_exact_position() {
        let g = grid();
        let hits = g.within(Point::new(-3.0, -3.0), 0.0);
        assert_eq!(hits, vec![(EventId(3), 0.0)]);
    }

    #[test]
    fn huge_radius_scans_occupied_cells_only() {
        let g = grid();
        assert_eq!(g.within(Point::new(0.0, 0.0), 1.0e12).len(), 4);
    }

    #[test]
    fn bad_queries_match_nothing() {
        let g = grid();
        assert!(g.within(Point::new(f64::NAN, 0.0), 5.0).is_empty());
        assert!(g.within(Point::new(0.0, 0.0), -1.0).is_empty());
        assert!(g.within(Point::new(0.0, 0.0), f64::INFINITY).is_empty());
    }
}
