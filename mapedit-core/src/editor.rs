//! Store-backed way editing.
//!
//! [`WayEditor`] loads the current snapshot, runs the matching transition
//! from [`protocol`](crate::protocol) and commits the result with
//! compare-and-swap. A transition that fails leaves the store untouched.

use log::info;

use crate::protocol::{self, MapView, ProtocolError};
use crate::{
    BoundingBox, EditSettings, GeometryError, HistoryEntry, Relation, RelationMember, StoreError,
    UserId, Way, WayAction, WayCommit, WayId, WayStore, bounding_box,
};

/// Applies way edits to a store.
///
/// # Examples
///
/// ```
/// use mapedit_core::test_support::{OPEN_CHANGESET, USER, seeded_store};
/// use mapedit_core::{EditSettings, Way, WayEditor};
///
/// let mut editor = WayEditor::new(seeded_store(), EditSettings::default());
/// let candidate = Way::new().with_changeset(OPEN_CHANGESET).with_nodes([1, 2]);
/// let created = editor.create_with_history(&candidate, USER).expect("create");
/// assert_eq!(created.version, 1);
/// ```
#[derive(Debug)]
pub struct WayEditor<S> {
    store: S,
    settings: EditSettings,
}

impl<S> WayEditor<S>
where
    S: WayStore + MapView,
{
    /// Wrap `store`, applying `settings` to every edit.
    #[must_use]
    pub const fn new(store: S, settings: EditSettings) -> Self {
        Self { store, settings }
    }

    /// The wrapped store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The wrapped store, mutably, for seeding.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Unwrap the store.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Settings applied to every edit.
    #[must_use]
    pub const fn settings(&self) -> &EditSettings {
        &self.settings
    }

    /// Store `candidate` as a new way under a freshly allocated id.
    ///
    /// # Errors
    ///
    /// See [`protocol::create_with_history`]; store failures surface as
    /// [`ProtocolError::Store`].
    pub fn create_with_history(
        &mut self,
        candidate: &Way,
        user_id: UserId,
    ) -> Result<Way, ProtocolError> {
        let mut way =
            protocol::create_with_history(candidate, user_id, &self.store, &self.settings)?;
        let way_id = self.store.allocate_id()?;
        way.id = Some(way_id);
        self.commit(None, way, WayAction::Create, user_id)
    }

    /// Replace the nodes and tags of way `way_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotFound`] for an unknown way, the errors of
    /// [`protocol::update_from`], and [`ProtocolError::VersionMismatch`] when
    /// another writer committed first.
    pub fn update_from(
        &mut self,
        way_id: WayId,
        candidate: &Way,
        user_id: UserId,
    ) -> Result<Way, ProtocolError> {
        let current = self.require_current(way_id)?;
        let way = protocol::update_from(&current, candidate, user_id, &self.store, &self.settings)?;
        self.commit(Some(current.version), way, WayAction::Modify, user_id)
    }

    /// Soft-delete way `way_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotFound`] for an unknown way, the errors of
    /// [`protocol::delete_with_history`], and
    /// [`ProtocolError::VersionMismatch`] when another writer committed first.
    pub fn delete_with_history(
        &mut self,
        way_id: WayId,
        candidate: &Way,
        user_id: UserId,
    ) -> Result<Way, ProtocolError> {
        let current = self.require_current(way_id)?;
        let way = protocol::delete_with_history(
            &current,
            candidate,
            user_id,
            &self.store,
            &self.settings,
        )?;
        self.commit(Some(current.version), way, WayAction::Delete, user_id)
    }

    /// Bounding box of way `way_id`.
    ///
    /// A deleted way has no nodes of its own; its box is taken from the
    /// latest snapshot that still had nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnknownWay`] for an unknown way and the
    /// errors of [`bounding_box`] otherwise.
    pub fn bbox(&self, way_id: WayId) -> Result<BoundingBox, GeometryError> {
        let current = self
            .store
            .load_current(way_id)?
            .ok_or(GeometryError::UnknownWay { way_id })?;
        if current.visible || !current.nodes.is_empty() {
            return bounding_box(&current.nodes, &self.store);
        }
        let nodes = self
            .store
            .history(way_id)?
            .into_iter()
            .rev()
            .map(|entry| entry.way.nodes)
            .find(|nodes| !nodes.is_empty())
            .unwrap_or_default();
        bounding_box(&nodes, &self.store)
    }

    /// Relations that reference way `way_id`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the relations cannot be read.
    pub fn containing_relations(&self, way_id: WayId) -> Result<Vec<Relation>, StoreError> {
        crate::containing_relations(&self.store, way_id)
    }

    /// Member entries that reference way `way_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the members cannot be read.
    pub fn containing_relation_members(
        &self,
        way_id: WayId,
    ) -> Result<Vec<RelationMember>, StoreError> {
        crate::containing_relation_members(&self.store, way_id)
    }

    /// Current snapshot of way `way_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the way cannot be read.
    pub fn current(&self, way_id: WayId) -> Result<Option<Way>, StoreError> {
        self.store.load_current(way_id)
    }

    /// Every snapshot of way `way_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the history cannot be read.
    pub fn history(&self, way_id: WayId) -> Result<Vec<HistoryEntry>, StoreError> {
        self.store.history(way_id)
    }

    fn require_current(&self, way_id: WayId) -> Result<Way, ProtocolError> {
        self.store
            .load_current(way_id)?
            .ok_or(ProtocolError::NotFound { way_id })
    }

    fn commit(
        &mut self,
        expected_version: Option<u64>,
        way: Way,
        action: WayAction,
        user_id: UserId,
    ) -> Result<Way, ProtocolError> {
        let commit = WayCommit {
            expected_version,
            entry: HistoryEntry {
                way,
                action,
                user_id,
            },
        };
        match self.store.commit(commit.clone()) {
            Ok(()) => {
                let stored = commit.entry.way;
                info!(
                    "Way {} now at version {} after {action} by user {user_id}",
                    stored.id.unwrap_or_default(),
                    stored.version
                );
                Ok(stored)
            }
            Err(StoreError::Conflict {
                way_id,
                expected,
                found,
            }) => {
                info!("Way {way_id} moved on: expected version {expected}, found {found}");
                Err(ProtocolError::VersionMismatch {
                    way_id,
                    provided: expected,
                    server: found,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
