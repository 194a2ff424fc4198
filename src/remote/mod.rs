//! Remote static-file host access.
//!
//! - **Backend**: [`RemoteStore`] trait, [`RemoteEntry`], [`RemoteError`]
//! - **Neocities**: [`NeocitiesBackend`], the production HTTP implementation

pub mod backend;
pub mod neocities;

pub use backend::{RemoteEntry, RemoteError, RemoteStore};
pub use neocities::{DEFAULT_API_URL, NeocitiesBackend};
