//! Remote store trait and shared types.
//!
//! The [`RemoteStore`] trait is the two operations the sync engine needs from a
//! static-file host: list one directory, and upload one file. Batching is
//! deliberately absent from the trait.
//!
//! The production implementation is
//! [`NeocitiesBackend`](super::neocities::NeocitiesBackend).

use serde::Deserialize;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Request timed out")]
    Timeout,
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub path: String,
    pub is_directory: bool,
    /// Last update time in the host's own string format.
    #[serde(default)]
    pub updated_at: String,
}

/// Trait for remote static-file hosts.
pub trait RemoteStore: Sync {
    /// List the entries directly reported for `dir` (`""` is the site root).
    fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Upload a single local file to `remote_path`, replacing any existing file.
    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Mock store that serves primed listings and records every call.
    /// Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockRemote {
        pub listings: Mutex<HashMap<String, Vec<RemoteEntry>>>,
        pub failing_lists: Mutex<HashSet<String>>,
        pub failing_uploads: Mutex<HashMap<String, FailureKind>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailureKind {
        Timeout,
        Rejected,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        List(String),
        Upload { local: String, remote: String },
    }

    impl MockRemote {
        pub fn new() -> Self {
            Self::default()
        }

        /// Prime the listing returned for `dir`.
        pub fn with_listing(self, dir: &str, entries: Vec<RemoteEntry>) -> Self {
            self.listings
                .lock()
                .unwrap()
                .insert(dir.to_string(), entries);
            self
        }

        pub fn failing_list(self, dir: &str) -> Self {
            self.failing_lists.lock().unwrap().insert(dir.to_string());
            self
        }

        pub fn failing_upload(self, remote_path: &str, kind: FailureKind) -> Self {
            self.failing_uploads
                .lock()
                .unwrap()
                .insert(remote_path.to_string(), kind);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Remote paths of every upload attempt, in call order.
        pub fn uploaded_paths(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Upload { remote, .. } => Some(remote),
                    RecordedOp::List(_) => None,
                })
                .collect()
        }
    }

    impl RemoteStore for MockRemote {
        fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::List(dir.to_string()));

            if self.failing_lists.lock().unwrap().contains(dir) {
                return Err(RemoteError::Http(format!("listing {dir} failed")));
            }
            Ok(self
                .listings
                .lock()
                .unwrap()
                .get(dir)
                .cloned()
                .unwrap_or_default())
        }

        fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), RemoteError> {
            self.operations.lock().unwrap().push(RecordedOp::Upload {
                local: local_path.to_string_lossy().to_string(),
                remote: remote_path.to_string(),
            });

            match self.failing_uploads.lock().unwrap().get(remote_path) {
                Some(FailureKind::Timeout) => Err(RemoteError::Timeout),
                Some(FailureKind::Rejected) => Err(RemoteError::Api {
                    status: 400,
                    message: "file type not allowed".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    pub fn file_entry(path: &str, updated_at: &str) -> RemoteEntry {
        RemoteEntry {
            path: path.to_string(),
            is_directory: false,
            updated_at: updated_at.to_string(),
        }
    }

    pub fn dir_entry(path: &str) -> RemoteEntry {
        RemoteEntry {
            path: path.to_string(),
            is_directory: true,
            updated_at: String::new(),
        }
    }

    #[test]
    fn mock_serves_primed_listing() {
        let store = MockRemote::new().with_listing(
            "",
            vec![file_entry("index.html", "Sat, 13 Feb 2016 03:04:00 +0000")],
        );

        let entries = store.list("").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "index.html");
        assert!(store.list("missing").unwrap().is_empty());

        let ops = store.get_operations();
        assert_eq!(
            ops,
            vec![
                RecordedOp::List(String::new()),
                RecordedOp::List("missing".to_string())
            ]
        );
    }

    #[test]
    fn mock_records_failed_uploads_too() {
        let store = MockRemote::new().failing_upload("a.html", FailureKind::Timeout);

        assert!(matches!(
            store.upload(Path::new("/dist/a.html"), "a.html"),
            Err(RemoteError::Timeout)
        ));
        assert!(store.upload(Path::new("/dist/b.html"), "b.html").is_ok());
        assert_eq!(store.uploaded_paths(), vec!["a.html", "b.html"]);
    }

    #[test]
    fn remote_entry_deserializes_neocities_shape() {
        let json = r#"{
            "path": "recipes/pancakes.json",
            "is_directory": false,
            "size": 312,
            "updated_at": "Sat, 13 Feb 2016 03:04:00 -0000",
            "sha1_hash": "c8aac06f343c962a24a7eb111aad739ff48b7fb1"
        }"#;
        let entry: RemoteEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.path, "recipes/pancakes.json");
        assert!(!entry.is_directory);
        assert_eq!(entry.updated_at, "Sat, 13 Feb 2016 03:04:00 -0000");
    }

    #[test]
    fn remote_entry_tolerates_missing_timestamp() {
        let entry: RemoteEntry =
            serde_json::from_str(r#"{"path": "recipes", "is_directory": true}"#).unwrap();
        assert!(entry.is_directory);
        assert!(entry.updated_at.is_empty());
    }
}
