//! Versioned way storage.
//!
//! A store keeps every snapshot of a way in an append-only history plus a
//! pointer to the current version. Writers commit with compare-and-swap on
//! that pointer; see [`WayCommit`].

mod error;
mod memory;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use error::{BackendError, StoreError};
pub use memory::MemoryMapStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteMapStore;

use std::fmt;

use crate::{UserId, Way, WayId};

/// User recorded against snapshots written by [`WayStore::import_way`].
pub const IMPORT_USER: UserId = 0;

/// Transition that produced a history snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WayAction {
    /// First version of the way.
    Create,
    /// Nodes or tags replaced.
    Modify,
    /// Soft delete.
    Delete,
}

impl WayAction {
    /// Lower-case name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }

    /// Parse a stored action name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "create" => Some(Self::Create),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for WayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable snapshot in a way's history.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    /// The way as it was at this version.
    pub way: Way,
    /// Transition that produced the snapshot.
    pub action: WayAction,
    /// User who made the edit.
    pub user_id: UserId,
}

/// A snapshot together with the version its writer expects to replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayCommit {
    /// Version currently stored, or `None` when the way must not exist yet.
    pub expected_version: Option<u64>,
    /// Snapshot to append.
    pub entry: HistoryEntry,
}

impl WayCommit {
    /// Identifier of the way being written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] for a snapshot without an id.
    pub fn way_id(&self) -> Result<WayId, StoreError> {
        self.entry.way.id.ok_or(StoreError::MissingId)
    }

    /// Check the snapshot against the version currently stored.
    ///
    /// `found` is `None` when no way exists under the id. Stores call this
    /// while holding whatever guard makes the subsequent write atomic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when another writer got there first
    /// and [`StoreError::VersionGap`] when the snapshot does not advance the
    /// version by exactly one.
    pub fn check_against(&self, found: Option<u64>) -> Result<WayId, StoreError> {
        let way_id = self.way_id()?;
        if found != self.expected_version {
            return Err(StoreError::Conflict {
                way_id,
                expected: self.expected_version.unwrap_or(0),
                found: found.unwrap_or(0),
            });
        }
        let next = self.expected_version.unwrap_or(0) + 1;
        if self.entry.way.version != next {
            return Err(StoreError::VersionGap {
                way_id,
                expected: next,
                found: self.entry.way.version,
            });
        }
        Ok(way_id)
    }
}

/// Append-only storage of way snapshots with a compare-and-swap current
/// pointer.
pub trait WayStore {
    /// The current snapshot of a way, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn load_current(&self, way_id: WayId) -> Result<Option<Way>, StoreError>;

    /// A specific historical snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn load_version(&self, way_id: WayId, version: u64) -> Result<Option<Way>, StoreError>;

    /// Every snapshot of a way, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn history(&self, way_id: WayId) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Reserve a fresh way identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be written.
    fn allocate_id(&mut self) -> Result<WayId, StoreError>;

    /// Append a snapshot and move the current pointer, atomically.
    ///
    /// Nothing is written when the check fails.
    ///
    /// # Errors
    ///
    /// See [`WayCommit::check_against`]; backend failures surface as
    /// [`StoreError::Backend`].
    fn commit(&mut self, commit: WayCommit) -> Result<(), StoreError>;

    /// Store a way as the next version without running the edit protocol.
    ///
    /// Used to seed stores from trusted data. The way receives a fresh id
    /// when it has none; its version is always derived from the history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading or committing fails.
    fn import_way(&mut self, mut way: Way) -> Result<WayId, StoreError> {
        let way_id = match way.id {
            Some(way_id) => way_id,
            None => self.allocate_id()?,
        };
        let current = self.load_current(way_id)?.map(|current| current.version);
        let action = match (current, way.visible) {
            (None, _) => WayAction::Create,
            (Some(_), false) => WayAction::Delete,
            (Some(_), true) => WayAction::Modify,
        };
        way.id = Some(way_id);
        way.version = current.unwrap_or(0) + 1;
        self.commit(WayCommit {
            expected_version: current,
            entry: HistoryEntry {
                way,
                action,
                user_id: IMPORT_USER,
            },
        })?;
        Ok(way_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn commit(expected_version: Option<u64>, version: u64) -> WayCommit {
        WayCommit {
            expected_version,
            entry: HistoryEntry {
                way: Way::new().with_id(4).with_version(version),
                action: WayAction::Modify,
                user_id: 1,
            },
        }
    }

    #[rstest]
    #[case::fresh(None, 1, None)]
    #[case::next(Some(3), 4, Some(3))]
    fn accepts_the_next_version(
        #[case] expected: Option<u64>,
        #[case] version: u64,
        #[case] found: Option<u64>,
    ) {
        assert_eq!(commit(expected, version).check_against(found).ok(), Some(4));
    }

    #[rstest]
    #[case::already_exists(None, Some(1))]
    #[case::moved_on(Some(3), Some(4))]
    #[case::vanished(Some(3), None)]
    fn stale_expectation_conflicts(#[case] expected: Option<u64>, #[case] found: Option<u64>) {
        let version = expected.unwrap_or(0) + 1;
        let err = commit(expected, version)
            .check_against(found)
            .expect_err("stale writer");
        assert!(matches!(err, StoreError::Conflict { way_id: 4, .. }));
    }

    #[rstest]
    fn skipping_a_version_is_rejected() {
        let err = commit(Some(2), 4).check_against(Some(2)).expect_err("gap");
        assert!(matches!(
            err,
            StoreError::VersionGap {
                expected: 3,
                found: 4,
                ..
            }
        ));
    }

    #[rstest]
    fn snapshot_without_id_is_rejected() {
        let mut commit = commit(None, 1);
        commit.entry.way.id = None;
        assert!(matches!(commit.check_against(None), Err(StoreError::MissingId)));
    }

    #[rstest]
    #[case(WayAction::Create)]
    #[case(WayAction::Modify)]
    #[case(WayAction::Delete)]
    fn action_names_parse_back(#[case] action: WayAction) {
        assert_eq!(WayAction::from_name(action.as_str()), Some(action));
    }
}
