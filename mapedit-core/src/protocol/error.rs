//! Errors returned by the way edit transitions.

use thiserror::Error;

use crate::{ChangesetId, ElementRef, NodeId, RelationId, StoreError, UserId, WayError, WayId};

/// A precondition of an edit that the submitted data does not meet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    /// The candidate names a different way than the stored one.
    #[error(
        "The id of the stored way ({}) is not the same as the submitted id ({})",
        display_id(.current),
        display_id(.provided)
    )]
    IdMismatch {
        /// Id of the stored way.
        current: Option<WayId>,
        /// Id carried by the candidate.
        provided: Option<WayId>,
    },
    /// The candidate has an empty node list.
    #[error("Cannot save {element}: it must have at least one node")]
    NoNodes {
        /// The way being saved.
        element: ElementRef,
    },
    /// Some referenced nodes are missing or deleted.
    #[error(
        "Cannot save {element}: it requires the nodes with id in ({}), which either do not exist, or are not visible.",
        join_ids(.node_ids)
    )]
    NodesUnavailable {
        /// The way being saved.
        element: ElementRef,
        /// Offending node ids, ascending and distinct.
        node_ids: Vec<NodeId>,
    },
    /// Visible relations still list the way as a member.
    #[error("Way {way_id} is still used by relations {}.", join_ids(.relation_ids))]
    StillUsedByRelations {
        /// The way being deleted.
        way_id: WayId,
        /// Relations referencing it, ascending.
        relation_ids: Vec<RelationId>,
    },
}

/// Reasons an edit transition is refused.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The candidate carries no changeset, or it cannot be found.
    #[error("Changeset id is missing")]
    ChangesetMissing,
    /// The changeset belongs to a different user.
    #[error("The user doesn't own changeset {changeset_id}")]
    UserChangesetMismatch {
        /// Changeset named by the candidate.
        changeset_id: ChangesetId,
        /// User attempting the edit.
        user_id: UserId,
    },
    /// The changeset has been closed.
    #[error("The changeset {changeset_id} was closed")]
    ChangesetAlreadyClosed {
        /// Changeset named by the candidate.
        changeset_id: ChangesetId,
    },
    /// See [`Precondition`].
    #[error("Precondition failed: {0}")]
    PreconditionFailed(#[from] Precondition),
    /// The candidate was based on a stale version.
    #[error("Version mismatch: Provided {provided}, server had: {server} of Way {way_id}")]
    VersionMismatch {
        /// Way being edited.
        way_id: WayId,
        /// Version carried by the candidate.
        provided: u64,
        /// Version actually stored.
        server: u64,
    },
    /// The way is soft-deleted and the edit cannot apply to it.
    #[error("The way with the id {way_id} has already been deleted")]
    AlreadyDeleted {
        /// Way being edited.
        way_id: WayId,
    },
    /// No way is stored under the id.
    #[error("Way {way_id} not found")]
    NotFound {
        /// Id that was looked up.
        way_id: WayId,
    },
    /// The resulting way breaks an entity invariant such as the node limit.
    #[error(transparent)]
    InvalidWay(#[from] WayError),
    /// Reading or writing the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn display_id(id: &Option<u64>) -> String {
    id.map(|value| value.to_string()).unwrap_or_default()
}

fn join_ids(ids: &[u64]) -> String {
    let rendered: Vec<String> = ids.iter().map(u64::to_string).collect();
    rendered.join(",")
}
