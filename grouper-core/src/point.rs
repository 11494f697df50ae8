//! Point store and the record-layout sum type: tier is a discriminant
//! on a layout enum, not a branch threaded through every coordinate
//! access.

use crate::config::Tier;
use crate::error::GrouperError;
use rayon::prelude::*;

/// An `(x, z)` pair of signed 32-bit integers — the LOW-tier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub z: i32,
}

/// The HIGH/BALANCED-tier record: coordinates plus precomputed cell
/// coordinates, 24 bytes wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidePoint {
    pub x: i32,
    pub z: i32,
    pub cx: i64,
    pub cz: i64,
}

/// Tier-dependent point storage. HIGH and BALANCED share the wide
/// layout (they differ only in cell multiplier); LOW uses the compact
/// 8-byte layout and recomputes cell coordinates on demand.
pub enum PointStore {
    Wide(Vec<WidePoint>),
    Narrow(Vec<Point>),
}

/// Rounds `n` up to the next power of two (minimum 1024, so tiny
/// inputs don't thrash on the first few `append` calls).
fn round_up_pow2(n: u64) -> u64 {
    let mut cap = n.max(1024);
    let mut p = 1u64;
    while p < cap {
        p *= 2;
    }
    cap = p;
    cap
}

impl PointStore {
    /// Preallocates capacity for `estimated_count * 1.1` points,
    /// rounded up to a power of two.
    ///
    /// Uses `try_reserve` rather than `Vec::with_capacity` so that an
    /// allocation failure on a multi-billion-point run surfaces as a
    /// `GrouperError::Allocation` the caller can report and exit 1 on,
    /// instead of the process aborting outright.
    pub fn with_estimated_capacity(tier: Tier, estimated_count: u64) -> Result<Self, GrouperError> {
        let cap = round_up_pow2(estimated_count + estimated_count / 10) as usize;

        match tier {
            Tier::High | Tier::Balanced => {
                let mut v: Vec<WidePoint> = Vec::new();
                v.try_reserve_exact(cap).map_err(|_| GrouperError::Allocation {
                    what: "point array",
                    bytes: (cap * std::mem::size_of::<WidePoint>()) as u64,
                })?;
                Ok(PointStore::Wide(v))
            }
            Tier::Low => {
                let mut v: Vec<Point> = Vec::new();
                v.try_reserve_exact(cap).map_err(|_| GrouperError::Allocation {
                    what: "point array",
                    bytes: (cap * std::mem::size_of::<Point>()) as u64,
                })?;
                Ok(PointStore::Narrow(v))
            }
        }
    }

    /// Appends one point. `Vec::push` already gives amortized O(1)
    /// growth once the preallocated capacity is exhausted.
    #[inline]
    pub fn append(&mut self, x: i32, z: i32) {
        match self {
            PointStore::Wide(v) => v.push(WidePoint { x, z, cx: 0, cz: 0 }),
            PointStore::Narrow(v) => v.push(Point { x, z }),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PointStore::Wide(v) => v.len(),
            PointStore::Narrow(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates of the point at `idx`, dispatching once per call on
    /// the layout tag rather than per-field.
    #[inline]
    pub fn coords(&self, idx: usize) -> (i32, i32) {
        match self {
            PointStore::Wide(v) => (v[idx].x, v[idx].z),
            PointStore::Narrow(v) => (v[idx].x, v[idx].z),
        }
    }

    /// Fills in `(cx, cz)` for every point, in parallel. No-op for the narrow layout, which recomputes cell
    /// coordinates lazily instead of storing them.
    pub fn precompute_cells(&mut self, cell_size: i64) {
        if let PointStore::Wide(v) = self {
            v.par_iter_mut().for_each(|p| {
                p.cx = crate::cell_of(p.x, cell_size);
                p.cz = crate::cell_of(p.z, cell_size);
            });
        }
    }

    /// Sorts points into cell-major order. For
    /// the wide layout this sorts on the precomputed `(cx, cz)`; for
    /// the narrow layout the comparator recomputes cell coordinates on
    /// every call.
    pub fn sort_by_cell(&mut self, cell_size: i64) {
        match self {
            PointStore::Wide(v) => v.sort_unstable_by_key(|p| (p.cx, p.cz)),
            PointStore::Narrow(v) => v.sort_unstable_by_key(|p| {
                (crate::cell_of(p.x, cell_size), crate::cell_of(p.z, cell_size))
            }),
        }
    }

    /// The cell coordinate of the point at `idx`. For the wide layout
    /// this is a field read; for the narrow layout it's recomputed.
    #[inline]
    pub fn cell_of(&self, idx: usize, cell_size: i64) -> (i64, i64) {
        match self {
            PointStore::Wide(v) => (v[idx].cx, v[idx].cz),
            PointStore::Narrow(v) => (
                crate::cell_of(v[idx].x, cell_size),
                crate::cell_of(v[idx].z, cell_size),
            ),
        }
    }
}
