//! Shared test utilities for the recipe-site test suite.
//!
//! Provides fixture writers for temporary project trees, sample recipes, and
//! builders for sync-side records.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_tree(tmp.path(), &[("recipes/pancakes.txt", PANCAKES)]);
//!
//! let local = record("/dist/a.html", 10);
//! ```

use crate::index::FileRecord;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

// =========================================================================
// Sample recipes
// =========================================================================

pub const PANCAKES: &str = "\
Pancakes

- flour
- milk
+ griddle
Mix and cook.

- maple syrup
Serve warm.
";

pub const SOUP: &str = "\
Tomato Soup

- tomatoes
- stock
Simmer until
soft.
";

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, contents)` pairs under `root`, creating directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
    }
}

// =========================================================================
// Sync records
// =========================================================================

/// A record at `secs` seconds after the Unix epoch.
pub fn record(path: &str, secs: i64) -> FileRecord {
    FileRecord {
        path: path.to_string(),
        mod_time: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
    }
}
