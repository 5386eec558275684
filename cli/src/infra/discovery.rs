//! Project discovery — a bounded, pruned filesystem walk.
//!
//! A directory containing the project marker is a project; the walk records
//! it and does not descend into it, so vendored checkouts inside another
//! project's dependency tree are never reported as projects themselves.

use std::path::{Path, PathBuf};

use crate::domain::config::{DISCOVER_MAX_DEPTH, MARKER_DIR};

/// Directory names never worth descending into: build output, dependency
/// caches, version-control metadata.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "vendor",
    "__pycache__",
    ".git",
];

/// Walk `root` up to the default depth and return every project directory
/// found, sorted for stable output.
#[must_use]
pub fn find_projects(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, DISCOVER_MAX_DEPTH, &mut found);
    found.sort();
    found
}

fn walk(dir: &Path, depth_left: usize, found: &mut Vec<PathBuf>) {
    if dir.join(MARKER_DIR).is_dir() {
        found.push(dir.to_path_buf());
        return;
    }
    if depth_left == 0 {
        return;
    }
    // Unreadable directories are skipped silently; the walk never aborts.
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') || IGNORED_DIRS.contains(&name) {
                continue;
            }
        }
        walk(&path, depth_left - 1, found);
    }
}
