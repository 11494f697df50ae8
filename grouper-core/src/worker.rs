//! Worker pool and partitioning.
//!
//! Cells are assigned by stride (`cells[t], cells[t+T], cells[t+2T], …`)
//! so that no cell is ever touched by more than one thread and no
//! coordination is needed to claim work. True OS threads via
//! `std::thread::scope` — every worker borrows the immutable `Index`
//! directly, no `Arc` needed, because it is read-only once built and
//! already safe to share as `&Index`. A separate progress
//! thread polls a shared atomic counter every 500ms and redraws a
//! single status line to stderr, using scoped threads and an
//! `AtomicU64` instead of a mutex-guarded counter, since a counter that
//! only ever increments needs no lock.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::enumerate::{process_cell, Scratch};
use crate::index::Index;
use crate::output::ReportWriter;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Summed counts across every worker once all have joined.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunTotals {
    pub groups_of_3: u64,
    pub groups_of_4: u64,
    /// Number of cells whose neighbor or candidate buffer overflowed.
    pub truncated_cells: u64,
}

/// Runs the full enumeration over `index` with `threads` workers, each
/// owning one [`Scratch`] buffer sized `neighbor_buffer_size`. Every
/// valid group is handed to `writer` as it's found — emission order
/// across threads is unspecified.
pub fn run<W: Write + Send>(
    index: &Index,
    writer: &ReportWriter<W>,
    threads: usize,
    neighbor_buffer_size: usize,
) -> RunTotals {
    let threads = threads.max(1);
    let total_cells = index.num_cells() as u64;
    let processed = AtomicU64::new(0);
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let progress = scope.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                let p = processed.load(Ordering::Relaxed);
                redraw_progress(p, total_cells);
                std::thread::sleep(PROGRESS_INTERVAL);
            }
            redraw_progress(total_cells, total_cells);
            eprintln!();
        });

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let processed = &processed;
                scope.spawn(move || worker_loop(index, writer, t, threads, neighbor_buffer_size, processed))
            })
            .collect();

        let mut totals = RunTotals::default();
        for h in handles {
            let partial = h.join().expect("enumeration worker panicked");
            totals.groups_of_3 += partial.groups_of_3;
            totals.groups_of_4 += partial.groups_of_4;
            totals.truncated_cells += partial.truncated_cells;
        }

        done.store(true, Ordering::Relaxed);
        progress.join().expect("progress thread panicked");

        totals
    })
}

fn worker_loop<W: Write + Send>(
    index: &Index,
    writer: &ReportWriter<W>,
    start: usize,
    stride: usize,
    neighbor_buffer_size: usize,
    processed: &AtomicU64,
) -> RunTotals {
    let mut scratch = Scratch::new(neighbor_buffer_size);
    let mut totals = RunTotals::default();

    let mut i = start;
    while i < index.num_cells() {
        let cell = index.cells[i];
        let stats = process_cell(index, &cell, &mut scratch, |members, centroid, max_dist| {
            if let Err(err) = writer.emit_group(index, members, centroid, max_dist) {
                tracing::error!(%err, "failed to write group to report");
            }
        });

        totals.groups_of_3 += stats.groups_of_3;
        totals.groups_of_4 += stats.groups_of_4;
        if stats.truncated {
            totals.truncated_cells += 1;
            tracing::warn!(cell = i, "neighbor or candidate buffer truncated for this cell; some groups may be missing");
        }

        processed.fetch_add(1, Ordering::Relaxed);
        i += stride;
    }

    totals
}

fn redraw_progress(processed: u64, total: u64) {
    let pct = if total > 0 { 100.0 * processed as f64 / total as f64 } else { 100.0 };
    eprint!("\rFinding groups: {:6.2}% ({}/{} cells)    ", pct, processed, total);
    let _ = std::io::stderr().flush();
}
