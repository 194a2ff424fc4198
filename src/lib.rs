//! # Recipe Site
//!
//! Builds a static recipe website from plain-text recipe files and publishes
//! it to a static-file host (Neocities), uploading only what changed.
//!
//! # Architecture: Two Commands
//!
//! ```text
//! package   recipes/ + client/  →  dist/            (text → JSON records + assets)
//! publish   dist/ ⇄ remote site →  uploads          (index → join → reconcile → upload)
//! ```
//!
//! `package` is a plain transformation. `publish` is the interesting part: it
//! indexes both sides by relative path, joins them, decides per path whether to
//! push, skip, or (eventually) delete, and uploads one file at a time.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`recipe`] | Line-oriented recipe parser producing [`recipe::RecipeDocument`] |
//! | [`package`] | Parses all recipes, writes records and manifest, copies client assets |
//! | [`index`] | Local and remote indexing, [`index::SyncRoots`], the [`index::SyncIndex`] join |
//! | [`sync`] | Pure reconciliation into a [`sync::Worklist`] |
//! | [`upload`] | Sequential per-file uploads with collected failures |
//! | [`remote`] | [`remote::RemoteStore`] trait and the Neocities backend |
//! | [`publish`] | Runs the sync phases in order |
//! | [`config`] | `config.toml` loading, merging, validation; API key file |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Timestamps, Not Hashes
//!
//! A file is pushed when it is missing remotely or its local modification time
//! is strictly newer than the remote's. Comparing contents would mean fetching
//! or hashing every remote file. The cost is that touching a file re-uploads
//! it, and clock skew between this machine and the host can cause a missed or
//! spurious upload.
//!
//! ## Explicit Roots
//!
//! The join key is the path relative to a root on each side. Both roots live in
//! one [`index::SyncRoots`] value, which also maps local paths to upload
//! destinations, so the two computations cannot drift apart.
//!
//! ## One File Per Upload
//!
//! Neocities can take several files per request, but rejects requests that are
//! too large without documenting the limit. Every upload is a single file, and
//! a failed file does not stop the rest.
//!
//! ## Deletion Is Planned, Not Performed
//!
//! Files present only on the remote are collected in a
//! [`sync::DeleteWorklist`] tagged [`sync::DeletionState::Pending`] and shown
//! to the operator. Nothing deletes them.
//!
//! ## Recipe Steps Are Bucketed
//!
//! Inside a step, ingredient, other-input, and instruction lines are sorted
//! into three lists. Their original interleaving is not kept.

pub mod config;
pub mod index;
pub mod output;
pub mod package;
pub mod publish;
pub mod recipe;
pub mod remote;
pub mod sync;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
