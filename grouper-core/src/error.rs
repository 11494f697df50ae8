//! Error kinds and their disposition.
//!
//! Every fatal kind here is meant to bubble straight to `main` via `?`;
//! the one soft failure (buffer overflow during neighbor gather) is
//! deliberately *not* a variant of this enum — it's logged and the run
//! continues, per the documented lossy case for pathological clusters.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum GrouperError {
    #[error("input file '{path}' is missing or unreadable: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input file '{path}' is empty")]
    InputEmpty { path: PathBuf },

    #[error("failed to allocate {what} ({bytes} bytes)")]
    Allocation { what: &'static str, bytes: u64 },

    #[error("failed to create output file '{path}': {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("radius must be a positive integer, got {value}")]
    InvalidRadius { value: i64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
