//! Errors raised by way stores and collaborator lookups.

use std::error::Error as StdError;

use thiserror::Error;

use crate::WayId;

/// Boxed error produced by a storage backend.
pub type BackendError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures reported by [`WayStore`](super::WayStore) and the lookup traits.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored version no longer matches the expected one.
    ///
    /// A version of `0` stands for "no way stored under this id".
    #[error("way {way_id} is at version {found}, expected version {expected}")]
    Conflict {
        /// Way being written.
        way_id: WayId,
        /// Version the writer read before computing its snapshot.
        expected: u64,
        /// Version actually stored.
        found: u64,
    },
    /// A snapshot would leave a hole in the version history.
    #[error("way {way_id} must advance to version {expected}, got version {found}")]
    VersionGap {
        /// Way being written.
        way_id: WayId,
        /// Version the snapshot must carry.
        expected: u64,
        /// Version the snapshot carried.
        found: u64,
    },
    /// A snapshot without an identifier reached the store.
    #[error("cannot store a way without an id")]
    MissingId,
    /// The backing storage failed.
    #[error("storage backend failed to {operation}")]
    Backend {
        /// What the store was doing.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: BackendError,
    },
}

impl StoreError {
    /// Wrap a backend failure, naming the operation that failed.
    #[must_use]
    pub fn backend(operation: &'static str, source: impl Into<BackendError>) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}
