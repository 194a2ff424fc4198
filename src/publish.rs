//! Publish: synchronize the output directory with the remote host.
//!
//! ```text
//! 1. Index   local tree ─┐ (in parallel, each side complete or the run aborts)
//!            remote tree ┘
//! 2. Join    SyncIndex::join(local, remote)
//! 3. Plan    reconcile → Worklist { to_push, to_delete (pending) }
//! 4. Upload  one file at a time; per-file failures collected
//! ```
//!
//! Phases never overlap: reconciliation only starts once both sides are fully
//! indexed, and uploads only start once the worklist is complete. Remote
//! deletions are planned and reported but not executed.

use crate::config::ConfigError;
use crate::index::{self, IndexError, SyncIndex, SyncRoots};
use crate::remote::RemoteStore;
use crate::sync::{self, Worklist};
use crate::upload::{self, UploadEvent, UploadReport};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Indexing failed: {0}")]
    Index(#[from] IndexError),
    #[error("{0} file(s) failed to upload")]
    UploadsFailed(usize),
}

/// What a sync would do.
#[derive(Debug)]
pub struct SyncPlan {
    pub local_files: usize,
    pub remote_files: usize,
    pub worklist: Worklist,
}

#[derive(Debug)]
pub struct PublishOutcome {
    pub plan: SyncPlan,
    pub uploads: UploadReport,
}

impl PublishOutcome {
    /// Turn collected upload failures into an error, after the fact.
    pub fn into_result(self) -> Result<PublishOutcome, PublishError> {
        if self.uploads.all_succeeded() {
            Ok(self)
        } else {
            Err(PublishError::UploadsFailed(self.uploads.failed.len()))
        }
    }
}

/// Index both sides, join, and reconcile. Nothing is uploaded.
pub fn plan(store: &impl RemoteStore, roots: &SyncRoots) -> Result<SyncPlan, PublishError> {
    let (local, remote) = rayon::join(
        || index::index_local(roots),
        || index::index_remote(store, roots),
    );
    let (local, remote) = (local?, remote?);

    let local_files = local.len();
    let remote_files = remote.len();
    let worklist = sync::reconcile(&SyncIndex::join(local, remote));

    Ok(SyncPlan {
        local_files,
        remote_files,
        worklist,
    })
}

/// Plan, then upload everything on the push list.
///
/// Upload failures do not make this return `Err`; they are in
/// [`PublishOutcome::uploads`]. Use [`PublishOutcome::into_result`] to fail
/// the run once the operator has seen them.
pub fn publish(
    store: &impl RemoteStore,
    roots: &SyncRoots,
    events: Option<Sender<UploadEvent>>,
) -> Result<PublishOutcome, PublishError> {
    let plan = plan(store, roots)?;
    Ok(execute(store, roots, plan, events))
}

/// Upload the push side of an existing plan. Deletions stay pending.
pub fn execute(
    store: &impl RemoteStore,
    roots: &SyncRoots,
    plan: SyncPlan,
    events: Option<Sender<UploadEvent>>,
) -> PublishOutcome {
    if !plan.worklist.to_delete.is_empty() {
        tracing::warn!(
            count = plan.worklist.to_delete.len(),
            "remote files no longer present locally; remote deletion is not performed"
        );
    }

    let uploads = upload::upload_all(store, roots, &plan.worklist.to_push, events);
    PublishOutcome { plan, uploads }
}
