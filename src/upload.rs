//! Push-side execution of a [`Worklist`](crate::sync::Worklist).
//!
//! Every file is uploaded with its own [`RemoteStore::upload`] call, in order,
//! one at a time. A failed upload (including a timeout) is recorded in the
//! [`UploadReport`] and the remaining files are still attempted; nothing later
//! in the list depends on an earlier file having made it.
//!
//! Progress is reported through an optional [`UploadEvent`] channel, the same
//! way the CLI follows long-running stages elsewhere.

use crate::index::SyncRoots;
use crate::remote::{RemoteError, RemoteStore};
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload timed out")]
    Timeout,
    #[error("Not under the local root: {0}")]
    OutsideRoot(String),
    #[error(transparent)]
    Remote(RemoteError),
}

impl From<RemoteError> for UploadError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Timeout => UploadError::Timeout,
            other => UploadError::Remote(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub local_path: String,
    pub remote_path: String,
}

#[derive(Debug)]
pub struct UploadFailure {
    pub local_path: String,
    /// Intended destination, if one could be computed.
    pub remote_path: Option<String>,
    pub error: UploadError,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<UploadedFile>,
    pub failed: Vec<UploadFailure>,
}

impl UploadReport {
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Per-file progress, 1-based `index` out of `total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Uploaded {
        index: usize,
        total: usize,
        local_path: String,
        remote_path: String,
    },
    Failed {
        index: usize,
        total: usize,
        local_path: String,
        error: String,
    },
}

/// Upload each local path to its mapped remote location.
pub fn upload_all(
    store: &impl RemoteStore,
    roots: &SyncRoots,
    to_push: &[String],
    events: Option<Sender<UploadEvent>>,
) -> UploadReport {
    let mut report = UploadReport::default();
    let total = to_push.len();

    for (i, local_path) in to_push.iter().enumerate() {
        let index = i + 1;
        let remote_path = roots.remote_path_for(Path::new(local_path));

        let result = match &remote_path {
            Some(remote) => store
                .upload(Path::new(local_path), remote)
                .map(|()| remote.clone())
                .map_err(UploadError::from),
            None => Err(UploadError::OutsideRoot(local_path.clone())),
        };

        let event = match result {
            Ok(remote_path) => {
                tracing::info!(local = %local_path, remote = %remote_path, "uploaded");
                report.uploaded.push(UploadedFile {
                    local_path: local_path.clone(),
                    remote_path: remote_path.clone(),
                });
                UploadEvent::Uploaded {
                    index,
                    total,
                    local_path: local_path.clone(),
                    remote_path,
                }
            }
            Err(error) => {
                tracing::warn!(local = %local_path, %error, "upload failed");
                let message = error.to_string();
                report.failed.push(UploadFailure {
                    local_path: local_path.clone(),
                    remote_path,
                    error,
                });
                UploadEvent::Failed {
                    index,
                    total,
                    local_path: local_path.clone(),
                    error: message,
                }
            }
        };

        if let Some(tx) = &events {
            // A dropped receiver only loses display output.
            let _ = tx.send(event);
        }
    }

    report
}
