//! Folder layout around a route file
//!
//! Route packs keep their objects and sounds in a `Railway` directory that
//! usually sits a level or two above the route file:
//!
//! ```text
//! Railway/
//!   Object/
//!   Sound/
//!   Route/MyLine/line.csv
//! ```

use std::path::{Path, PathBuf};

/// Parent levels searched above the route file's directory
pub const RAILWAY_SEARCH_DEPTH: usize = 4;

/// Folder that holds the route's `Object` and `Sound` directories
///
/// Walks up to [`RAILWAY_SEARCH_DEPTH`] levels from the route file's
/// directory and returns the first `Railway` directory found on the way or
/// next to an ancestor. Without one, the route file's own directory is used.
pub fn railway_folder(route_file: &Path) -> PathBuf {
    let start = match route_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    for dir in start.ancestors().take(RAILWAY_SEARCH_DEPTH + 1) {
        if dir.file_name().is_some_and(|name| name == "Railway") {
            return dir.to_path_buf();
        }
        let candidate = dir.join("Railway");
        if candidate.is_dir() {
            return candidate;
        }
    }

    start.to_path_buf()
}
