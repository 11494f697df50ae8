//! Structure Group Finder — interactive CLI.
//!
//! Orchestrates the five pipeline stages exactly in order: Configure,
//! Load, Index, Enumerate, Report. This is the only module in the
//! workspace that touches stdin/stdout/the filesystem directly —
//! `grouper-core` stages take explicit inputs and return explicit
//! outputs.

mod cli;
mod prompts;

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use clap::Parser;
use sysinfo::System;

use grouper_core::config::RunConfig;
use grouper_core::error::GrouperError;
use grouper_core::index::Index;
use grouper_core::output::ReportWriter;
use grouper_core::parse::{estimate_point_count, load_points};
use grouper_core::point::PointStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();

    println!("=== Structure Group Finder (Auto-Optimizing) ===\n");
    println!("Automatically detects system resources and optimizes performance.\n");

    // --- Configure ---------------------------------------------------
    let input_path = match args.input {
        Some(p) => p,
        None => prompts::input_path()?.into(),
    };

    let metadata = std::fs::metadata(&input_path).map_err(|source| GrouperError::InputUnreadable {
        path: input_path.clone(),
        source,
    })?;
    let file_size = metadata.len();
    if file_size == 0 {
        return Err(GrouperError::InputEmpty { path: input_path.clone() }.into());
    }

    let estimated_points = estimate_point_count(file_size);
    println!(
        "  File size: {:.2} GiB (~{} structures)\n",
        file_size as f64 / (1024.0 * 1024.0 * 1024.0),
        estimated_points
    );

    let mut sys = System::new();
    sys.refresh_memory();
    let system_memory_bytes = sys.total_memory();
    let detected_cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

    let config = RunConfig::detect(estimated_points, system_memory_bytes, detected_cores);

    println!("=== System Auto-Configuration ===");
    println!("  System RAM: {:.1} GiB", system_memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0));
    println!(
        "  Available (80%): {:.1} GiB",
        config.available_budget_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    );
    println!("  Tier: {}", config.tier.name());
    println!("  Cell multiplier: {}x radius", config.cell_multiplier);
    println!("  Record size: {} bytes\n", config.tier.record_bytes());

    tracing::info!(
        tier = config.tier.name(),
        multiplier = config.cell_multiplier,
        "auto-configuration complete"
    );

    let radius: i64 = match args.radius {
        Some(r) => r,
        None => prompts::radius()?
            .parse()
            .context("radius must be a decimal integer")?,
    };
    if radius <= 0 {
        return Err(GrouperError::InvalidRadius { value: radius }.into());
    }

    let threads = if let Some(t) = args.threads {
        t.clamp(1, 256)
    } else if args.single_threaded {
        1
    } else if prompts::use_multithreading(detected_cores)? {
        prompts::thread_count(detected_cores)?.clamp(1, 256)
    } else {
        1
    };

    println!("\n=== Final Configuration ===");
    println!("  Input: {}", input_path.display());
    println!("  Radius: {radius} blocks");
    println!("  Cell size: {} blocks", radius * config.cell_multiplier as i64);
    println!("  Threads: {threads}\n");

    // --- Load ----------------------------------------------------------
    let file = File::open(&input_path).map_err(|source| GrouperError::InputUnreadable {
        path: input_path.clone(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut store = PointStore::with_estimated_capacity(config.tier, estimated_points)?;
    let loaded = load_points(reader, &mut store).context("failed while reading input file")?;
    println!("Parsed {loaded} structures");

    // --- Index -----------------------------------------------------------
    println!("Building spatial index...");
    let index = Index::build(store, radius, &config);
    tracing::info!(cells = index.num_cells(), points = index.num_points(), "index built");

    // --- Report setup, then Enumerate -------------------------------------
    let output_path = format!("groups_{radius}.txt");
    let output_file = File::create(&output_path).map_err(|source| GrouperError::OutputCreate {
        path: output_path.clone().into(),
        source,
    })?;
    let writer = ReportWriter::new(std::io::BufWriter::new(output_file));
    writer.write_header(radius, &input_path.to_string_lossy(), loaded)?;

    println!("Searching for groups...");
    let totals = grouper_core::worker::run(&index, &writer, threads, config.tier.neighbor_buffer_size());

    writer.write_summary(totals.groups_of_3, totals.groups_of_4)?;
    writer.flush()?;

    if totals.truncated_cells > 0 {
        tracing::warn!(
            cells = totals.truncated_cells,
            "some cells overflowed their neighbor/candidate buffers; output may be missing groups for those cells"
        );
    }

    println!("\n=== Results ===");
    println!("Groups of 3: {}", totals.groups_of_3);
    println!("Groups of 4: {}", totals.groups_of_4);
    println!("Output: {output_path}");

    Ok(())
}
