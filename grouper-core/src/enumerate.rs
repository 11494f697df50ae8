//! Neighbor-gather and subset enumeration — the hot path, and the
//! largest single piece of this crate. See `DESIGN.md` for how this
//! maps onto the reference algorithm it's grounded on.

use crate::cell::CellEntry;
use crate::dist_sq;
use crate::index::Index;

/// Per-worker scratch space: one neighbor buffer and one 4096-slot
/// candidate array, allocated once and reused across every cell the
/// worker processes.
pub struct Scratch {
    neighbors: Vec<u32>,
    candidates: [u32; 4096],
}

impl Scratch {
    pub fn new(neighbor_capacity: usize) -> Self {
        Scratch {
            neighbors: Vec::with_capacity(neighbor_capacity),
            candidates: [0u32; 4096],
        }
    }
}

/// Counts produced while processing one cell, plus whether either
/// scratch buffer hit its cap.
#[derive(Default, Clone, Copy)]
pub struct CellStats {
    pub groups_of_3: u64,
    pub groups_of_4: u64,
    pub truncated: bool,
}

/// Computes the arithmetic centroid of `members` in double precision
/// and checks every member lies within `radius_sq` of it. Returns `Some((centroid, max_dist))` on success so the
/// output formatter doesn't have to recompute the centroid.
fn centroid_containment(index: &Index, members: &[u32], radius_sq: i64) -> Option<((f64, f64), f64)> {
    let k = members.len() as f64;
    let (mut sx, mut sz) = (0.0f64, 0.0f64);
    for &m in members {
        let (x, z) = index.coords(m as usize);
        sx += x as f64;
        sz += z as f64;
    }
    let centroid = (sx / k, sz / k);

    let mut max_dist_sq = 0.0f64;
    for &m in members {
        let (x, z) = index.coords(m as usize);
        let dx = x as f64 - centroid.0;
        let dz = z as f64 - centroid.1;
        let dsq = dx * dx + dz * dz;
        if dsq > radius_sq as f64 {
            return None;
        }
        if dsq > max_dist_sq {
            max_dist_sq = dsq;
        }
    }

    Some((centroid, max_dist_sq.sqrt()))
}

/// Gathers every point index in the `w`-ring neighborhood of `cell`
/// into `scratch.neighbors`, capped at its preallocated capacity. If
/// the cap is hit, gathering stops and `truncated` is reported — the
/// prefix already collected is still searched.
fn gather_neighbors(index: &Index, cell: &CellEntry, scratch: &mut Scratch) -> bool {
    scratch.neighbors.clear();
    let cap = scratch.neighbors.capacity();
    let w = (index.cell_multiplier as i64 + 1) / 2 + 1;

    let mut truncated = false;
    'rings: for dx in -w..=w {
        for dz in -w..=w {
            if let Some(ci) = index.find_cell(cell.cx + dx, cell.cz + dz) {
                let nc = &index.cells[ci];
                for i in nc.start..(nc.start + nc.count) {
                    if scratch.neighbors.len() >= cap {
                        truncated = true;
                        break 'rings;
                    }
                    scratch.neighbors.push(i);
                }
            }
        }
    }
    truncated
}

/// Processes every base point in `cell`: gathers neighbor candidates,
/// then tests all 3- and 4-subsets formed with them, emitting every
/// one that satisfies the centroid predicate.
///
/// `emit` is called once per valid group with its member indices (base
/// first, candidates in ascending index order), its centroid, and its
/// max member distance from that centroid. Emission ordering within
/// one call to `process_cell` is `(base_point_in_cell, candidate
/// indices lexicographic)`.
pub fn process_cell(
    index: &Index,
    cell: &CellEntry,
    scratch: &mut Scratch,
    mut emit: impl FnMut(&[u32], (f64, f64), f64),
) -> CellStats {
    let mut stats = CellStats::default();

    if gather_neighbors(index, cell, scratch) {
        stats.truncated = true;
    }

    let max_pair_dist_sq = 4 * index.radius_sq;

    for ci in 0..cell.count {
        let base = cell.start + ci;
        let base_coords = index.coords(base as usize);

        let mut num_cand = 0usize;
        for &n in &scratch.neighbors {
            if n <= base {
                continue;
            }
            if num_cand >= scratch.candidates.len() {
                stats.truncated = true;
                break;
            }
            if dist_sq(base_coords, index.coords(n as usize)) <= max_pair_dist_sq {
                scratch.candidates[num_cand] = n;
                num_cand += 1;
            }
        }

        if num_cand < 2 {
            continue;
        }
        let cand = &scratch.candidates[..num_cand];

        // Groups of 4.
        if num_cand >= 3 {
            for i in 0..num_cand - 2 {
                for j in (i + 1)..num_cand - 1 {
                    if dist_sq(index.coords(cand[i] as usize), index.coords(cand[j] as usize)) > max_pair_dist_sq {
                        continue;
                    }
                    for k in (j + 1)..num_cand {
                        if dist_sq(index.coords(cand[i] as usize), index.coords(cand[k] as usize)) > max_pair_dist_sq {
                            continue;
                        }
                        if dist_sq(index.coords(cand[j] as usize), index.coords(cand[k] as usize)) > max_pair_dist_sq {
                            continue;
                        }

                        let group = [base, cand[i], cand[j], cand[k]];
                        if let Some((centroid, max_dist)) = centroid_containment(index, &group, index.radius_sq) {
                            emit(&group, centroid, max_dist);
                            stats.groups_of_4 += 1;
                        }
                    }
                }
            }
        }

        // Groups of 3.
        for i in 0..num_cand - 1 {
            for j in (i + 1)..num_cand {
                if dist_sq(index.coords(cand[i] as usize), index.coords(cand[j] as usize)) > max_pair_dist_sq {
                    continue;
                }

                let group = [base, cand[i], cand[j]];
                if let Some((centroid, max_dist)) = centroid_containment(index, &group, index.radius_sq) {
                    emit(&group, centroid, max_dist);
                    stats.groups_of_3 += 1;
                }
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, Tier};
    use crate::point::PointStore;

    fn build(points: &[(i32, i32)], radius: i64, multiplier: u32) -> Index {
        build_tier(points, radius, multiplier, Tier::High)
    }

    fn build_tier(points: &[(i32, i32)], radius: i64, multiplier: u32, tier: Tier) -> Index {
        let mut store = PointStore::with_estimated_capacity(tier, points.len() as u64).unwrap();
        for &(x, z) in points {
            store.append(x, z);
        }
        let config = RunConfig {
            tier,
            cell_multiplier: multiplier,
            threads: 1,
            system_memory_bytes: 0,
            available_budget_bytes: 0,
        };
        Index::build(store, radius, &config)
    }

    fn run_all_cells(index: &Index) -> (u64, u64, Vec<Vec<u32>>) {
        let mut scratch = Scratch::new(4096);
        let (mut g3, mut g4) = (0u64, 0u64);
        let mut groups = Vec::new();
        for ci in 0..index.num_cells() {
            let cell = index.cells[ci];
            let stats = process_cell(index, &cell, &mut scratch, |members, _c, _d| {
                groups.push(members.to_vec());
            });
            g3 += stats.groups_of_3;
            g4 += stats.groups_of_4;
        }
        (g3, g4, groups)
    }

    #[test]
    fn wide_triangle_fails_centroid_predicate() {
        // Pairwise distances are all <= 2r (passes the diameter prune)
        // but the circumradius to the centroid exceeds r, so the
        // centroid-containment predicate correctly rejects it.
        let index = build(&[(0, 0), (4, 0), (2, 3)], 2, 1);
        let (g3, g4, _) = run_all_cells(&index);
        assert_eq!((g3, g4), (0, 0));
    }

    #[test]
    fn triangle_fit_yields_one_group() {
        let index = build(&[(0, 0), (2, 0), (1, 1)], 2, 1);
        let (g3, g4, groups) = run_all_cells(&index);
        assert_eq!((g3, g4), (1, 0));
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn square_of_four_yields_five_groups() {
        let index = build(&[(0, 0), (2, 0), (0, 2), (2, 2)], 2, 1);
        let (g3, g4, _) = run_all_cells(&index);
        assert_eq!(g4, 1);
        assert_eq!(g3, 4);
    }

    #[test]
    fn negative_coordinate_adjacency_not_lost() {
        let index = build(&[(-1, 0), (0, 0), (-1, -1)], 2, 1);
        let (g3, g4, _) = run_all_cells(&index);
        assert_eq!((g3, g4), (1, 0));
    }

    #[test]
    fn no_group_emitted_twice() {
        let index = build(&[(0, 0), (2, 0), (0, 2), (2, 2)], 2, 1);
        let (_, _, groups) = run_all_cells(&index);
        let mut seen = std::collections::HashSet::new();
        for g in &groups {
            let mut sorted = g.clone();
            sorted.sort_unstable();
            assert!(seen.insert(sorted), "duplicate group emitted: {:?}", g);
        }
    }

    #[test]
    fn randomized_clusters_never_violate_the_centroid_bound() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        for _ in 0..20 {
            let n = rng.gen_range(10..200);
            let radius = rng.gen_range(2..30);
            let points: Vec<(i32, i32)> = (0..n)
                .map(|_| (rng.gen_range(-500..500), rng.gen_range(-500..500)))
                .collect();

            let index = build(&points, radius, 1);
            let mut scratch = Scratch::new(4096);
            for ci in 0..index.num_cells() {
                let cell = index.cells[ci];
                process_cell(&index, &cell, &mut scratch, |members, centroid, max_dist| {
                    assert!(max_dist <= radius as f64 + 1e-9, "emitted group exceeds radius");
                    for &m in members {
                        let (x, z) = index.coords(m as usize);
                        let dx = x as f64 - centroid.0;
                        let dz = z as f64 - centroid.1;
                        let d = (dx * dx + dz * dz).sqrt();
                        assert!(d <= radius as f64 + 1e-9);
                    }
                });
            }
        }
    }

    #[test]
    fn cell_multiplier_does_not_change_emitted_set() {
        let points: Vec<(i32, i32)> = (0..40)
            .map(|i| ((i * 37) % 97 - 48, (i * 53) % 83 - 41))
            .collect();

        let multiplier_1 = build(&points, 8, 1);
        let multiplier_4 = build(&points, 8, 4);

        let (g3h, g4h, mut gh) = run_all_cells(&multiplier_1);
        let (g3l, g4l, mut gl) = run_all_cells(&multiplier_4);

        assert_eq!((g3h, g4h), (g3l, g4l));

        for g in gh.iter_mut().chain(gl.iter_mut()) {
            g.sort_unstable();
        }
        gh.sort();
        gl.sort();
        assert_eq!(gh, gl);
    }

    #[test]
    fn low_tier_narrow_layout_matches_high_tier_emitted_set() {
        // Crosses the Wide/Narrow record-layout boundary: HIGH stores
        // precomputed (cx, cz) per point, LOW recomputes cell
        // coordinates on demand via the comparator in `sort_by_cell`
        // and `PointStore::cell_of`. Both must enumerate the same set
        // of groups regardless of which layout backs the index.
        let points: Vec<(i32, i32)> = (0..60)
            .map(|i| ((i * 41) % 131 - 65, (i * 59) % 113 - 56))
            .collect();

        let high = build_tier(&points, 6, 1, Tier::High);
        let low = build_tier(&points, 6, 4, Tier::Low);

        let (g3h, g4h, mut gh) = run_all_cells(&high);
        let (g3l, g4l, mut gl) = run_all_cells(&low);

        assert_eq!((g3h, g4h), (g3l, g4l));

        for g in gh.iter_mut().chain(gl.iter_mut()) {
            g.sort_unstable();
        }
        gh.sort();
        gl.sort();
        assert_eq!(gh, gl);
    }
}
