//! Sync reconciliation: decide what to push and what should be deleted.
//!
//! [`reconcile`] is a pure function of a joined [`SyncIndex`]. Every entry gets
//! exactly one [`Verdict`]:
//!
//! | Local | Remote | Verdict |
//! |---|---|---|
//! | present | absent | push |
//! | absent | present | delete |
//! | present | present | push iff local is strictly newer, else skip |
//!
//! Ties go to the remote, so an unchanged file is never re-uploaded. Only
//! paths and timestamps are compared, never contents: touching a file without
//! changing it causes a redundant upload, and skew between the local clock and
//! the host's clock can cause a missed or spurious upload.
//!
//! ## Deletion
//!
//! Remote-only files end up in a [`DeleteWorklist`] whose state is
//! [`DeletionState::Pending`]. Nothing in this crate executes remote deletions;
//! the list is reported so the operator can act on it.

use crate::index::{FileRecord, SyncEntry, SyncIndex};

/// Outcome for one relative path, carrying the record the action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// Upload this local file.
    Push(&'a FileRecord),
    /// This remote file has no local counterpart.
    Delete(&'a FileRecord),
    Skip,
}

/// Whether a delete list has been carried out against the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    /// Computed only. This is the only state [`reconcile`] produces.
    Pending,
    Executed,
}

/// Remote paths that no longer exist locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteWorklist {
    paths: Vec<String>,
    state: DeletionState,
}

impl DeleteWorklist {
    pub fn pending(paths: Vec<String>) -> Self {
        Self {
            paths,
            state: DeletionState::Pending,
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn state(&self) -> DeletionState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Result of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worklist {
    /// Local paths to upload.
    pub to_push: Vec<String>,
    /// Remote paths that should be deleted.
    pub to_delete: DeleteWorklist,
    /// Paths present on both sides that need nothing.
    pub unchanged: usize,
}

impl Worklist {
    pub fn is_empty(&self) -> bool {
        self.to_push.is_empty() && self.to_delete.is_empty()
    }
}

pub fn classify(entry: &SyncEntry) -> Verdict<'_> {
    match entry {
        SyncEntry::LocalOnly(local) => Verdict::Push(local),
        SyncEntry::RemoteOnly(remote) => Verdict::Delete(remote),
        SyncEntry::Both { local, remote } if local.mod_time > remote.mod_time => {
            Verdict::Push(local)
        }
        SyncEntry::Both { .. } => Verdict::Skip,
    }
}

/// Build the worklist for a fully joined index. Lists follow index order.
pub fn reconcile(index: &SyncIndex) -> Worklist {
    let mut to_push = Vec::new();
    let mut to_delete = Vec::new();
    let mut unchanged = 0;

    for (_, entry) in index.iter() {
        match classify(entry) {
            Verdict::Push(local) => to_push.push(local.path.clone()),
            Verdict::Delete(remote) => to_delete.push(remote.path.clone()),
            Verdict::Skip => unchanged += 1,
        }
    }

    tracing::debug!(
        push = to_push.len(),
        delete = to_delete.len(),
        unchanged,
        "reconciled sync index"
    );

    Worklist {
        to_push,
        to_delete: DeleteWorklist::pending(to_delete),
        unchanged,
    }
}
