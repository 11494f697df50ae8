//! Cell runs: a maximal run of points sharing one cell
//! coordinate, plus the arena-style hash-bucket chain that lets
//! [`crate::index::Index::find_cell`] resolve a `(cx, cz)` pair back to
//! a cell in O(1) expected time.

/// A run of points sharing one cell coordinate.
///
/// `start`/`count` index into the sorted point array — the run is
/// always contiguous. `next` chains into the hash bucket this cell
/// landed in; `0` means "end of chain", and a non-zero value is always
/// `cell_index + 1` (see [`crate::hash`]).
#[derive(Debug, Clone, Copy)]
pub struct CellEntry {
    pub cx: i64,
    pub cz: i64,
    pub start: u32,
    pub count: u32,
    pub next: u32,
}
