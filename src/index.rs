//! File indexing for the sync engine.
//!
//! Both sides of a sync are reduced to the same shape: a [`SideIndex`] mapping
//! a *relative path* (the join key) to a [`FileRecord`] holding the absolute
//! path and modification time.
//!
//! ```text
//! local:  dist/recipes/pancakes.json   ──┐
//!         (root "dist")                  ├─► key "recipes/pancakes.json"
//! remote: recipes/pancakes.json        ──┘
//!         (root "")
//! ```
//!
//! Root prefixes are never implied: both are carried by one [`SyncRoots`]
//! value, which is also what maps local paths to upload destinations. A key is
//! always `/`-separated, whatever the host platform uses locally.
//!
//! Each side is indexed independently into its own map; [`SyncIndex::join`]
//! merges them once both are complete. Any traversal failure aborts indexing
//! for that side, so a partial index never reaches the reconciler.

use crate::remote::{RemoteError, RemoteStore};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Remote listing failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("Unrecognized remote timestamp: {0:?}")]
    Timestamp(String),
    #[error("Path is outside the sync root: {0}")]
    OutsideRoot(String),
}

/// One file on one side of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute location: a filesystem path locally, a site path remotely.
    pub path: String,
    pub mod_time: DateTime<Utc>,
}

/// All files of one side, keyed by relative path.
pub type SideIndex = BTreeMap<String, FileRecord>;

/// The local and remote root prefixes of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRoots {
    local_root: PathBuf,
    remote_root: String,
}

impl SyncRoots {
    /// `remote_root` is a site path such as `"/r"`, `"blog"`, or `""` for the
    /// site root. A trailing `/` is ignored.
    pub fn new(local_root: impl Into<PathBuf>, remote_root: &str) -> Self {
        Self {
            local_root: local_root.into(),
            remote_root: remote_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_root(&self) -> &str {
        &self.remote_root
    }

    /// Join key for a local path, or `None` if it is not strictly under the
    /// local root.
    pub fn relative_local(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.local_root).ok()?;
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        (!key.is_empty()).then_some(key)
    }

    /// Join key for a remote path, or `None` if it is not strictly under the
    /// remote root. Leading slashes are not significant on the remote side.
    pub fn relative_remote(&self, path: &str) -> Option<String> {
        let path = path.trim_start_matches('/');
        let root = self.remote_root.trim_start_matches('/');
        let rel = if root.is_empty() {
            path
        } else {
            path.strip_prefix(root)?.strip_prefix('/')?
        };
        (!rel.is_empty()).then(|| rel.to_string())
    }

    /// Destination of a local file: the local root replaced by the remote
    /// root, remainder kept verbatim.
    ///
    /// Local root `/a/b`, remote root `/r`: `/a/b/x/y.txt` → `/r/x/y.txt`.
    pub fn remote_path_for(&self, local_path: &Path) -> Option<String> {
        let rel = self.relative_local(local_path)?;
        if self.remote_root.is_empty() {
            Some(rel)
        } else {
            Some(format!("{}/{}", self.remote_root, rel))
        }
    }
}

/// Index every file under the local root.
pub fn index_local(roots: &SyncRoots) -> Result<SideIndex, IndexError> {
    let mut index = SideIndex::new();

    for entry in WalkDir::new(roots.local_root()).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let key = roots
            .relative_local(path)
            .ok_or_else(|| IndexError::OutsideRoot(path.display().to_string()))?;
        let modified = entry.metadata()?.modified()?;

        index.insert(
            key,
            FileRecord {
                path: path.to_string_lossy().to_string(),
                mod_time: DateTime::<Utc>::from(modified),
            },
        );
    }

    tracing::debug!(files = index.len(), root = %roots.local_root().display(), "indexed local files");
    Ok(index)
}

/// Index every file under the remote root, recursing into directories.
pub fn index_remote(store: &impl RemoteStore, roots: &SyncRoots) -> Result<SideIndex, IndexError> {
    let mut index = SideIndex::new();
    let mut visited = HashSet::new();
    collect_remote(store, roots, roots.remote_root(), &mut index, &mut visited)?;

    tracing::debug!(files = index.len(), root = roots.remote_root(), "indexed remote files");
    Ok(index)
}

fn collect_remote(
    store: &impl RemoteStore,
    roots: &SyncRoots,
    dir: &str,
    index: &mut SideIndex,
    visited: &mut HashSet<String>,
) -> Result<(), IndexError> {
    // Some hosts list a subtree recursively; don't walk a directory twice.
    if !visited.insert(dir.trim_matches('/').to_string()) {
        return Ok(());
    }

    for entry in store.list(dir)? {
        if entry.is_directory {
            collect_remote(store, roots, &entry.path, index, visited)?;
            continue;
        }
        let key = roots
            .relative_remote(&entry.path)
            .ok_or_else(|| IndexError::OutsideRoot(entry.path.clone()))?;
        let mod_time = parse_remote_timestamp(&entry.updated_at)?;
        index.insert(
            key,
            FileRecord {
                path: entry.path,
                mod_time,
            },
        );
    }
    Ok(())
}

/// Parse a remote `updated_at` value.
///
/// Neocities reports RFC 2822 (`Sat, 13 Feb 2016 03:04:00 -0000`); RFC 3339 is
/// accepted as well.
pub fn parse_remote_timestamp(value: &str) -> Result<DateTime<Utc>, IndexError> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| IndexError::Timestamp(value.to_string()))
}

/// A relative path seen on at least one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEntry {
    LocalOnly(FileRecord),
    RemoteOnly(FileRecord),
    Both {
        local: FileRecord,
        remote: FileRecord,
    },
}

impl SyncEntry {
    pub fn local(&self) -> Option<&FileRecord> {
        match self {
            SyncEntry::LocalOnly(local) | SyncEntry::Both { local, .. } => Some(local),
            SyncEntry::RemoteOnly(_) => None,
        }
    }

    pub fn remote(&self) -> Option<&FileRecord> {
        match self {
            SyncEntry::RemoteOnly(remote) | SyncEntry::Both { remote, .. } => Some(remote),
            SyncEntry::LocalOnly(_) => None,
        }
    }
}

/// Both sides joined by relative path. Iterates in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncIndex {
    entries: BTreeMap<String, SyncEntry>,
}

impl SyncIndex {
    /// Merge two complete side indexes.
    pub fn join(local: SideIndex, mut remote: SideIndex) -> Self {
        let mut entries = BTreeMap::new();

        for (key, local) in local {
            let entry = match remote.remove(&key) {
                Some(remote) => SyncEntry::Both { local, remote },
                None => SyncEntry::LocalOnly(local),
            };
            entries.insert(key, entry);
        }
        for (key, remote) in remote {
            entries.insert(key, SyncEntry::RemoteOnly(remote));
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&SyncEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SyncEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::backend::tests::{MockRemote, dir_entry, file_entry};
    use crate::test_helpers::{record, write_tree};
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // SyncRoots
    // =========================================================================

    #[test]
    fn remote_path_replaces_local_root() {
        let roots = SyncRoots::new("/a/b", "/r");
        assert_eq!(
            roots.remote_path_for(Path::new("/a/b/x/y.txt")).as_deref(),
            Some("/r/x/y.txt")
        );
    }

    #[test]
    fn remote_path_with_site_root() {
        let roots = SyncRoots::new("dist", "");
        assert_eq!(
            roots
                .remote_path_for(Path::new("dist/recipes/pancakes.json"))
                .as_deref(),
            Some("recipes/pancakes.json")
        );
    }

    #[test]
    fn remote_root_trailing_slash_ignored() {
        let roots = SyncRoots::new("/a/b", "/r/");
        assert_eq!(
            roots.remote_path_for(Path::new("/a/b/x.txt")).as_deref(),
            Some("/r/x.txt")
        );
    }

    #[test]
    fn remote_path_outside_local_root_is_none() {
        let roots = SyncRoots::new("/a/b", "/r");
        assert_eq!(roots.remote_path_for(Path::new("/a/c/x.txt")), None);
        assert_eq!(roots.remote_path_for(Path::new("/a/b")), None);
    }

    #[test]
    fn local_root_is_matched_by_component_not_prefix() {
        let roots = SyncRoots::new("/a/b", "");
        assert_eq!(roots.relative_local(Path::new("/a/bc/x.txt")), None);
    }

    #[test]
    fn relative_remote_strips_root_and_separator() {
        let roots = SyncRoots::new("dist", "site");
        assert_eq!(roots.relative_remote("site/x/y.txt").as_deref(), Some("x/y.txt"));
        assert_eq!(roots.relative_remote("/site/x.txt").as_deref(), Some("x.txt"));
        assert_eq!(roots.relative_remote("siteother/x.txt"), None);
        assert_eq!(roots.relative_remote("other/x.txt"), None);
        assert_eq!(roots.relative_remote("site"), None);
    }

    #[test]
    fn keys_agree_when_roots_have_different_depths() {
        let roots = SyncRoots::new("/home/me/project/dist", "r");
        assert_eq!(
            roots.relative_local(Path::new("/home/me/project/dist/css/site.css")),
            roots.relative_remote("r/css/site.css")
        );
    }

    // =========================================================================
    // Local indexing
    // =========================================================================

    #[test]
    fn index_local_finds_nested_files_only() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("index.html", "<html>"),
                ("recipes/pancakes.json", "{}"),
                ("recipes/deep/soup.json", "{}"),
            ],
        );
        fs::create_dir_all(tmp.path().join("empty-dir")).unwrap();

        let roots = SyncRoots::new(tmp.path(), "");
        let index = index_local(&roots).unwrap();

        let keys: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["index.html", "recipes/deep/soup.json", "recipes/pancakes.json"]
        );
        let record = &index["recipes/pancakes.json"];
        assert_eq!(
            Path::new(&record.path),
            tmp.path().join("recipes/pancakes.json")
        );
    }

    #[test]
    fn index_local_uses_filesystem_mtime() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("a.txt", "a")]);
        let expected: DateTime<Utc> = fs::metadata(tmp.path().join("a.txt"))
            .unwrap()
            .modified()
            .unwrap()
            .into();

        let index = index_local(&SyncRoots::new(tmp.path(), "")).unwrap();
        assert_eq!(index["a.txt"].mod_time, expected);
    }

    #[test]
    fn index_local_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let roots = SyncRoots::new(tmp.path().join("nope"), "");
        assert!(matches!(index_local(&roots), Err(IndexError::Walk(_))));
    }

    // =========================================================================
    // Remote indexing
    // =========================================================================

    #[test]
    fn index_remote_recurses_into_directories() {
        let store = MockRemote::new()
            .with_listing(
                "",
                vec![
                    file_entry("index.html", "Sat, 13 Feb 2016 03:04:00 +0000"),
                    dir_entry("recipes"),
                ],
            )
            .with_listing(
                "recipes",
                vec![file_entry(
                    "recipes/pancakes.json",
                    "Sun, 14 Feb 2016 10:00:00 +0000",
                )],
            );

        let index = index_remote(&store, &SyncRoots::new("dist", "")).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index["recipes/pancakes.json"].path, "recipes/pancakes.json");
        assert_eq!(
            index["index.html"].mod_time,
            parse_remote_timestamp("2016-02-13T03:04:00Z").unwrap()
        );
    }

    #[test]
    fn index_remote_lists_from_remote_root() {
        let store = MockRemote::new().with_listing(
            "site",
            vec![file_entry("site/a.html", "2020-01-01T00:00:00Z")],
        );

        let index = index_remote(&store, &SyncRoots::new("dist", "site")).unwrap();
        assert_eq!(index["a.html"].path, "site/a.html");
    }

    #[test]
    fn index_remote_does_not_revisit_directories() {
        // A host that lists subtrees recursively reports "recipes" and its
        // files at the top level as well as under "recipes".
        let store = MockRemote::new()
            .with_listing(
                "",
                vec![
                    dir_entry("recipes"),
                    file_entry("recipes/a.json", "2020-01-01T00:00:00Z"),
                    dir_entry("recipes"),
                ],
            )
            .with_listing(
                "recipes",
                vec![file_entry("recipes/a.json", "2020-01-01T00:00:00Z")],
            );

        let index = index_remote(&store, &SyncRoots::new("dist", "")).unwrap();
        assert_eq!(index.len(), 1);

        let lists = store
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, crate::remote::backend::tests::RecordedOp::List(_)))
            .count();
        assert_eq!(lists, 2);
    }

    #[test]
    fn index_remote_listing_failure_is_fatal() {
        let store = MockRemote::new()
            .with_listing("", vec![dir_entry("recipes")])
            .failing_list("recipes");

        let result = index_remote(&store, &SyncRoots::new("dist", ""));
        assert!(matches!(result, Err(IndexError::Remote(_))));
    }

    #[test]
    fn index_remote_bad_timestamp_is_fatal() {
        let store =
            MockRemote::new().with_listing("", vec![file_entry("a.html", "last tuesday")]);

        let result = index_remote(&store, &SyncRoots::new("dist", ""));
        assert!(matches!(result, Err(IndexError::Timestamp(t)) if t == "last tuesday"));
    }

    #[test]
    fn index_remote_path_outside_root_is_fatal() {
        let store = MockRemote::new().with_listing(
            "site",
            vec![file_entry("elsewhere/a.html", "2020-01-01T00:00:00Z")],
        );

        let result = index_remote(&store, &SyncRoots::new("dist", "site"));
        assert!(matches!(result, Err(IndexError::OutsideRoot(_))));
    }

    #[test]
    fn neocities_timestamp_formats() {
        let expected = parse_remote_timestamp("2016-02-13T03:04:00Z").unwrap();
        assert_eq!(
            parse_remote_timestamp("Sat, 13 Feb 2016 03:04:00 -0000").unwrap(),
            expected
        );
        assert_eq!(
            parse_remote_timestamp("Fri, 12 Feb 2016 22:04:00 -0500").unwrap(),
            expected
        );
    }

    // =========================================================================
    // Join
    // =========================================================================

    #[test]
    fn join_merges_same_key_from_both_sides() {
        let local = SideIndex::from([
            ("a".to_string(), record("/dist/a", 10)),
            ("b".to_string(), record("/dist/b", 10)),
        ]);
        let remote = SideIndex::from([
            ("b".to_string(), record("b", 5)),
            ("c".to_string(), record("c", 5)),
        ]);

        let index = SyncIndex::join(local, remote);

        assert_eq!(index.len(), 3);
        assert!(matches!(index.get("a"), Some(SyncEntry::LocalOnly(_))));
        assert!(matches!(index.get("b"), Some(SyncEntry::Both { .. })));
        assert!(matches!(index.get("c"), Some(SyncEntry::RemoteOnly(_))));
        assert_eq!(index.get("b").unwrap().local().unwrap().path, "/dist/b");
        assert_eq!(index.get("b").unwrap().remote().unwrap().path, "b");
    }

    #[test]
    fn join_every_entry_has_a_side() {
        let local = SideIndex::from([("a".to_string(), record("/dist/a", 1))]);
        let remote = SideIndex::from([("z".to_string(), record("z", 1))]);

        let index = SyncIndex::join(local, remote);
        for (_, entry) in index.iter() {
            assert!(entry.local().is_some() || entry.remote().is_some());
        }
    }

    #[test]
    fn join_of_empty_sides_is_empty() {
        assert!(SyncIndex::join(SideIndex::new(), SideIndex::new()).is_empty());
    }
}
