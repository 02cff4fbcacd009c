//! Solve-duration side channel.
//!
//! Downstream tooling reads the elapsed wall-clock time of a solve from a
//! plain text file: one line, milliseconds. Nothing is written unless a path
//! is configured.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Persist the elapsed solve time as one line of milliseconds
pub fn write_solve_duration(path: &Path, elapsed: Duration) -> io::Result<()> {
    fs::write(path, format!("{}\n", elapsed.as_millis()))
}
