//! # Burst Curator
//!
//! Finds burst sequences in large photo folders and picks the sharpest shot
//! of each.
//!
//! ## Core Philosophy
//! - **Never touch the photos** - results live in sidecar files next to them
//! - **Incremental** - unchanged photos are never analyzed twice
//! - **Keep going** - one unreadable photo never stops a scan
//!
//! ## Architecture
//! The library is split into a core engine and presentation layers:
//! - `core` - Grouping, clustering, sharpness and the folder scan worker
//! - `events` - Event-driven progress reporting
//! - `error` - Typed error hierarchy
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{BurstError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Filtering follows
/// `RUST_LOG`; calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
