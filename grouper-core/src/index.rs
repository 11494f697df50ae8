//! Grid index build: sort points into cell-major order,
//! run-length the sorted array into a cell table, then thread an
//! FNV-1a64 hash table through it so `(cx, cz)` resolves to a cell in
//! O(1) expected time. Built once, single-threaded, then frozen —
//! nothing below this module mutates `Index` again.

use crate::cell::CellEntry;
use crate::config::RunConfig;
use crate::hash::bucket_of;
use crate::point::PointStore;

/// The immutable state produced by stage 3 (Index) and consumed by
/// every worker during stage 4 (Enumerate). Point array, cell array
/// and hash table are all read-only from here on; workers borrow an
/// `&Index` directly rather than going through an `Arc`.
pub struct Index {
    pub store: PointStore,
    pub cells: Vec<CellEntry>,
    hash_table: Vec<u32>,
    pub cell_size: i64,
    pub radius: i64,
    pub radius_sq: i64,
    pub cell_multiplier: u32,
}

impl Index {
    /// Builds the grid index over `store` for the given `radius`.
    /// `store` must already hold every loaded point; it is consumed
    /// (sorted in place) and becomes part of the returned `Index`.
    pub fn build(mut store: PointStore, radius: i64, config: &RunConfig) -> Index {
        let cell_size = radius * config.cell_multiplier as i64;

        store.precompute_cells(cell_size);
        store.sort_by_cell(cell_size);

        let mut cells = Self::build_cell_table(&store, cell_size);
        let hash_table = Self::build_hash_table(&mut cells, config);

        Index {
            store,
            cells,
            hash_table,
            cell_size,
            radius,
            radius_sq: radius * radius,
            cell_multiplier: config.cell_multiplier,
        }
    }

    /// Two scans over the sorted array: the first counts distinct cells
    /// so the cell array can be allocated at exactly the right size,
    /// the second fills it.
    fn build_cell_table(store: &PointStore, cell_size: i64) -> Vec<CellEntry> {
        let n = store.len();
        if n == 0 {
            return Vec::new();
        }

        let mut num_cells = 1u64;
        let mut prev = store.cell_of(0, cell_size);
        for i in 1..n {
            let cur = store.cell_of(i, cell_size);
            if cur != prev {
                num_cells += 1;
                prev = cur;
            }
        }

        let mut cells = Vec::with_capacity(num_cells as usize);
        let mut start = 0usize;
        let mut current = store.cell_of(0, cell_size);

        for i in 1..=n {
            let is_boundary = i == n || store.cell_of(i, cell_size) != current;
            if is_boundary {
                cells.push(CellEntry {
                    cx: current.0,
                    cz: current.1,
                    start: start as u32,
                    count: (i - start) as u32,
                    next: 0,
                });
                if i < n {
                    current = store.cell_of(i, cell_size);
                    start = i;
                }
            }
        }

        cells
    }

    /// Allocates the bucket-head array and threads every cell's
    /// `next` pointer through it. Bucket values
    /// are `cell_index + 1` so that `0` can mean "end of chain".
    fn build_hash_table(cells: &mut [CellEntry], config: &RunConfig) -> Vec<u32> {
        let table_size = config.hash_table_size(cells.len() as u64);
        let mut table = vec![0u32; table_size as usize];

        for i in 0..cells.len() {
            let h = bucket_of(cells[i].cx, cells[i].cz, table_size) as usize;
            cells[i].next = table[h];
            table[h] = (i + 1) as u32;
        }

        table
    }

    pub fn num_points(&self) -> usize {
        self.store.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> (i32, i32) {
        self.store.coords(idx)
    }

    /// Resolves `(cx, cz)` to a cell index by walking its hash bucket.
    #[inline]
    pub fn find_cell(&self, cx: i64, cz: i64) -> Option<usize> {
        let table_size = self.hash_table.len() as u64;
        if table_size == 0 {
            return None;
        }
        let mut idx = self.hash_table[bucket_of(cx, cz, table_size) as usize];
        while idx != 0 {
            let cell = &self.cells[(idx - 1) as usize];
            if cell.cx == cx && cell.cz == cz {
                return Some((idx - 1) as usize);
            }
            idx = cell.next;
        }
        None
    }
}
