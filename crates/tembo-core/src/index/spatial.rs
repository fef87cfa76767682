//! Fixed-size grid over water source coordinates.
//!
//! # Layout
//!
//! Each source lives in exactly one cell keyed by
//! `(floor(x / cell), floor(y / cell))`. Ring `r` around a query cell is the
//! set of cells at Chebyshev distance `r` from it.
//!
//! # Nearest neighbour
//!
//! The search walks rings outward until a candidate passes the caller's
//! filter. The ring after that is always scanned too, and further rings are
//! scanned only while their closest possible point is no further than the
//! best hit so far. Work is therefore proportional to the number of sources
//! near the query, not to the total number of sources.
//!
//! Expansion stops at `max_rings` or once the rings leave the extent of
//! occupied cells, whichever comes first.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Point, WaterSourceId};

/// Grid cell coordinates.
pub type CellKey = (i64, i64);

/// Average occupancy [`suggest_cell_size`] aims for.
pub const TARGET_OCCUPANCY: f64 = 8.0;

/// Cell edge that puts roughly [`TARGET_OCCUPANCY`] uniformly spread
/// sources in each cell of an `area`-sized region.
#[must_use]
pub fn suggest_cell_size(area: f64, source_count: usize) -> f64 {
    if source_count == 0 || !(area.is_finite() && area > 0.0) {
        return 1.0;
    }
    (area * TARGET_OCCUPANCY / source_count as f64).sqrt()
}

/// Cell holding `p` in a grid of `cell_size` cells.
pub(crate) fn cell_key(p: Point, cell_size: f64) -> CellKey {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
    )
}

/// Result of a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestHit {
    pub id: WaterSourceId,
    pub distance: f64,
    /// Rings visited, including ring 0.
    pub rings_scanned: u32,
    /// Sources the filter was asked about.
    pub examined: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    min: CellKey,
    max: CellKey,
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<(WaterSourceId, Point)>>,
    entries: usize,
    // Grows on insert, never shrinks; only used to bound ring expansion.
    extent: Option<Extent>,
}

impl SpatialGrid {
    /// `cell_size` must be positive and finite (checked by config validation).
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            entries: 0,
            extent: None,
        }
    }

    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[must_use]
    pub fn cell_of(&self, p: Point) -> CellKey {
        cell_key(p, self.cell_size)
    }

    pub(crate) fn insert(&mut self, id: WaterSourceId, p: Point) {
        let key = self.cell_of(p);
        self.cells.entry(key).or_default().push((id, p));
        self.entries += 1;
        self.extent = Some(match self.extent {
            None => Extent { min: key, max: key },
            Some(e) => Extent {
                min: (e.min.0.min(key.0), e.min.1.min(key.1)),
                max: (e.max.0.max(key.0), e.max.1.max(key.1)),
            },
        });
    }

    /// Ids stored in one cell.
    pub fn cell(&self, key: CellKey) -> impl Iterator<Item = WaterSourceId> + '_ {
        self.cells.get(&key).into_iter().flatten().map(|(id, _)| *id)
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

    /// Mean number of sources per occupied cell.
    #[must_use]
    pub fn average_occupancy(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.entries as f64 / self.cells.len() as f64
    }

    /// Ring count needed to cover `radius` around any point.
    #[must_use]
    pub fn rings_for_radius(&self, radius: f64) -> u32 {
        let rings = (radius / self.cell_size).ceil();
        if rings.is_finite() && rings >= 0.0 {
            rings.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }

    /// Closest source accepted by `accept`, or `None` if nothing qualifies
    /// within `max_rings`.
    ///
    /// Ties on distance go to the smaller id.
    pub fn nearest(
        &self,
        query: Point,
        max_rings: u32,
        mut accept: impl FnMut(WaterSourceId) -> bool,
    ) -> Option<NearestHit> {
        let extent = self.extent?;
        if !query.is_finite() {
            return None;
        }
        let center = self.cell_of(query);
        let limit = u64::from(max_rings).min(reach(center, extent));

        let mut best: Option<(f64, WaterSourceId)> = None;
        let mut found_at: Option<u64> = None;
        let mut examined = 0_usize;
        let mut rings_scanned = 0_u32;

        for ring in 0..=limit {
            if let (Some(first), Some((best_dist, _))) = (found_at, best) {
                if ring > first + 1 && self.ring_min_distance(query, center, ring) > best_dist {
                    break;
                }
            }
            rings_scanned = rings_scanned.saturating_add(1);

            for key in ring_cells(center, ring) {
                let Some(bucket) = self.cells.get(&key) else {
                    continue;
                };
                for (id, p) in bucket {
                    examined += 1;
                    if !accept(*id) {
                        continue;
                    }
                    let d = p.distance_to(query);
                    let better = best.is_none_or(|(bd, bid)| {
                        d.total_cmp(&bd).then_with(|| id.cmp(&bid)) == Ordering::Less
                    });
                    if better {
                        best = Some((d, *id));
                    }
                }
            }

            if found_at.is_none() && best.is_some() {
                found_at = Some(ring);
            }
        }

        best.map(|(distance, id)| NearestHit {
            id,
            distance,
            rings_scanned,
            examined,
        })
    }

    /// Lower bound on the distance from `query` to any point in ring `ring`.
    fn ring_min_distance(&self, query: Point, center: CellKey, ring: u64) -> f64 {
        if ring == 0 {
            return 0.0;
        }
        // The rings inside `ring` form a square of side (2 * ring - 1) cells.
        let inner = (ring - 1) as f64;
        let left = (center.0 as f64 - inner) * self.cell_size;
        let right = (center.0 as f64 + inner + 1.0) * self.cell_size;
        let bottom = (center.1 as f64 - inner) * self.cell_size;
        let top = (center.1 as f64 + inner + 1.0) * self.cell_size;
        (query.x - left)
            .min(right - query.x)
            .min(query.y - bottom)
            .min(top - query.y)
            .max(0.0)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellKey, WaterSourceId, Point)> + '_ {
        self.cells
            .iter()
            .flat_map(|(key, bucket)| bucket.iter().map(move |(id, p)| (*key, *id, *p)))
    }
}

/// Furthest ring that can still contain an occupied cell.
fn reach(center: CellKey, extent: Extent) -> u64 {
    let dx = center.0.abs_diff(extent.min.0).max(center.0.abs_diff(extent.max.0));
    let dy = center.1.abs_diff(extent.min.1).max(center.1.abs_diff(extent.max.1));
    dx.max(dy)
}

/// Cells at Chebyshev distance exactly `ring` from `center`.
fn ring_cells(center: CellKey, ring: u64) -> Vec<CellKey> {
    let (cx, cy) = center;
    if ring == 0 {
        return vec![center];
    }
    let Ok(r) = i64::try_from(ring) else {
        return Vec::new();
    };
    let mut cells = Vec::with_capacity(usize::try_from(ring.saturating_mul(8)).unwrap_or(0));
    for dx in -r..=r {
        cells.push((cx.saturating_add(dx), cy.saturating_add(r)));
        cells.push((cx.saturating_add(dx), cy.saturating_sub(r)));
    }
    for dy in (-r + 1)..r {
        cells.push((cx.saturating_add(r), cy.saturating_add(dy)));
        cells.push((cx.saturating_sub(r), cy.saturating_add(dy)));
    }
    cells
}
