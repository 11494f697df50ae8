//! Non-interactive argument surface.
//!
//! Purely additive on top of the interactive prompts: with no flags
//! given, the binary prompts for everything as usual. Any flag that is
//! given skips the matching prompt, which is what lets
//! `tests/integration.rs` drive the binary without a stdin fixture.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "grouper", about = "Auto-optimizing structure group finder")]
pub struct Args {
    /// Path to the input file. Skips the file-path prompt if given.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Search radius in blocks. Skips the radius prompt if given.
    #[arg(long)]
    pub radius: Option<i64>,

    /// Worker thread count. Implies multithreading; skips both
    /// threading prompts if given.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Run single-threaded without prompting.
    #[arg(long)]
    pub single_threaded: bool,
}
