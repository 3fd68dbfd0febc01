//! Main binary entry point for the `typefold` consolidation tool.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! to ensure consistent behavior across all entry points.

use anyhow::Result;

fn main() -> Result<()> {
    // Delegate CLI args to shared entry_point function (same as typefold-cli)
    let code = typefold::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
