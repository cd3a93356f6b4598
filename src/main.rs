//! # burst-scan CLI
//!
//! Command-line interface for the burst curator.
//!
//! ## Usage
//! ```bash
//! burst-scan scan ~/Photos/2024-06-trip --threads 8
//! burst-scan bursts ~/Photos/2024-06-trip --time-window 2 --threshold 8
//! ```

mod cli;

use burst_curator::Result;

fn main() -> Result<()> {
    burst_curator::init_tracing();
    cli::run()
}
