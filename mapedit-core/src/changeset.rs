//! Changesets under whose authority edits are made.

use crate::{ChangesetId, StoreError, UserId};

/// A changeset as seen by the way-editing core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Changeset {
    /// Changeset identifier.
    pub id: ChangesetId,
    /// User who opened the changeset.
    pub user_id: UserId,
    /// `false` once the changeset has been closed.
    pub open: bool,
}

impl Changeset {
    /// An open changeset owned by `user_id`.
    #[must_use]
    pub const fn new(id: ChangesetId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            open: true,
        }
    }

    /// The same changeset, closed.
    #[must_use]
    pub const fn closed(self) -> Self {
        Self {
            open: false,
            ..self
        }
    }
}

/// Read access to changesets.
pub trait ChangesetLookup {
    /// Return the changeset with `id`, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn changeset(&self, id: ChangesetId) -> Result<Option<Changeset>, StoreError>;
}
