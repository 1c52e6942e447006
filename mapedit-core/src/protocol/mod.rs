//! Optimistic-concurrency transitions for ways.
//!
//! Each transition is a pure function from the current snapshot, the
//! submitted candidate and read-only collaborator views to the next
//! snapshot. Nothing here writes; [`WayEditor`](crate::WayEditor) commits
//! the result with compare-and-swap.
//!
//! Checks run in a fixed order so that callers always see the same error for
//! the same input: identity, version, changeset authority, lifecycle, then
//! node and relation preconditions.

mod error;

pub use error::{Precondition, ProtocolError};

use std::collections::HashSet;

use log::debug;

use crate::{
    ChangesetLookup, EditSettings, NodeId, NodeLookup, RelationStore, UserId, Way,
    containing_relations,
};

/// Every read-only collaborator the transitions consult.
pub trait MapView: NodeLookup + ChangesetLookup + RelationStore {}

impl<T> MapView for T where T: NodeLookup + ChangesetLookup + RelationStore + ?Sized {}

/// Check that the candidate's changeset exists, belongs to `user_id` and is
/// still open.
///
/// # Errors
///
/// Returns [`ProtocolError::ChangesetMissing`],
/// [`ProtocolError::UserChangesetMismatch`] or
/// [`ProtocolError::ChangesetAlreadyClosed`], in that order of precedence.
pub fn authorize_changeset<C>(
    candidate: &Way,
    user_id: UserId,
    changesets: &C,
) -> Result<(), ProtocolError>
where
    C: ChangesetLookup + ?Sized,
{
    let changeset_id = candidate
        .changeset_id
        .ok_or(ProtocolError::ChangesetMissing)?;
    let changeset = changesets
        .changeset(changeset_id)?
        .ok_or(ProtocolError::ChangesetMissing)?;
    if changeset.user_id != user_id {
        return Err(ProtocolError::UserChangesetMismatch {
            changeset_id,
            user_id,
        });
    }
    if !changeset.open {
        return Err(ProtocolError::ChangesetAlreadyClosed { changeset_id });
    }
    Ok(())
}

/// Check identity, version and changeset authority of an edit to `current`.
///
/// # Errors
///
/// Returns [`Precondition::IdMismatch`] when the ids differ or either is
/// unset, [`ProtocolError::VersionMismatch`] for a stale candidate, then the
/// errors of [`authorize_changeset`].
pub fn check_consistency<C>(
    current: &Way,
    candidate: &Way,
    user_id: UserId,
    changesets: &C,
) -> Result<(), ProtocolError>
where
    C: ChangesetLookup + ?Sized,
{
    let way_id = match (current.id, candidate.id) {
        (Some(current_id), Some(provided_id)) if current_id == provided_id => current_id,
        (current_id, provided_id) => {
            return Err(Precondition::IdMismatch {
                current: current_id,
                provided: provided_id,
            }
            .into());
        }
    };
    if candidate.version != current.version {
        return Err(ProtocolError::VersionMismatch {
            way_id,
            provided: candidate.version,
            server: current.version,
        });
    }
    authorize_changeset(candidate, user_id, changesets)
}

/// Check the node list of `candidate` before it is stored.
///
/// Nodes listed in `previous` were checked when they were first saved and
/// are not looked up again.
///
/// # Errors
///
/// Returns [`Precondition::NoNodes`] for an empty list, the errors of
/// [`Way::validate`] and [`Precondition::NodesUnavailable`] naming every
/// missing or deleted node.
pub fn check_preconditions<N>(
    candidate: &Way,
    previous: &[NodeId],
    nodes: &N,
    settings: &EditSettings,
) -> Result<(), ProtocolError>
where
    N: NodeLookup + ?Sized,
{
    if candidate.nodes.is_empty() {
        return Err(Precondition::NoNodes {
            element: candidate.element_ref(),
        }
        .into());
    }
    candidate.validate(settings)?;

    let known: HashSet<NodeId> = previous.iter().copied().collect();
    let mut fresh: Vec<NodeId> = candidate
        .nodes
        .iter()
        .copied()
        .filter(|node_id| !known.contains(node_id))
        .collect();
    fresh.sort_unstable();
    fresh.dedup();

    let mut unavailable = Vec::new();
    for node_id in fresh {
        let visible = nodes.node(node_id)?.is_some_and(|node| node.visible);
        if !visible {
            unavailable.push(node_id);
        }
    }
    if unavailable.is_empty() {
        Ok(())
    } else {
        Err(Precondition::NodesUnavailable {
            element: candidate.element_ref(),
            node_ids: unavailable,
        }
        .into())
    }
}

/// Build the first version of a new way from `candidate`.
///
/// The returned way has no id yet; the caller allocates one when it
/// commits.
///
/// # Errors
///
/// Returns the errors of [`authorize_changeset`] followed by those of
/// [`check_preconditions`].
pub fn create_with_history<V>(
    candidate: &Way,
    user_id: UserId,
    view: &V,
    settings: &EditSettings,
) -> Result<Way, ProtocolError>
where
    V: MapView + ?Sized,
{
    authorize_changeset(candidate, user_id, view)?;
    check_preconditions(candidate, &[], view, settings)?;
    Ok(Way {
        id: None,
        version: 1,
        visible: true,
        changeset_id: candidate.changeset_id,
        nodes: candidate.nodes.clone(),
        tags: candidate.tags.clone(),
    })
}

/// Build the next version of `current` carrying the candidate's nodes and
/// tags.
///
/// The result is always visible. A soft-deleted way is revived only when
/// [`EditSettings::allow_resurrection`] is set.
///
/// # Errors
///
/// Returns the errors of [`check_consistency`], then
/// [`ProtocolError::AlreadyDeleted`] when revival is forbidden, then the
/// errors of [`check_preconditions`] for nodes new to the way.
pub fn update_from<V>(
    current: &Way,
    candidate: &Way,
    user_id: UserId,
    view: &V,
    settings: &EditSettings,
) -> Result<Way, ProtocolError>
where
    V: MapView + ?Sized,
{
    check_consistency(current, candidate, user_id, view)?;
    let way_id = current.id.unwrap_or_default();
    if !current.visible && !settings.allow_resurrection {
        return Err(ProtocolError::AlreadyDeleted { way_id });
    }
    check_preconditions(candidate, &current.nodes, view, settings)?;
    if !current.visible {
        debug!("Reviving deleted way {way_id}");
    }
    Ok(Way {
        id: current.id,
        version: current.version + 1,
        visible: true,
        changeset_id: candidate.changeset_id,
        nodes: candidate.nodes.clone(),
        tags: candidate.tags.clone(),
    })
}

/// Build the soft-deleted successor of `current`.
///
/// # Errors
///
/// Returns the errors of [`check_consistency`], then
/// [`ProtocolError::AlreadyDeleted`] for a way that is already deleted, then
/// [`Precondition::StillUsedByRelations`] when visible relations reference
/// the way and [`EditSettings::allow_orphaned_members`] is not set.
pub fn delete_with_history<V>(
    current: &Way,
    candidate: &Way,
    user_id: UserId,
    view: &V,
    settings: &EditSettings,
) -> Result<Way, ProtocolError>
where
    V: MapView + ?Sized,
{
    check_consistency(current, candidate, user_id, view)?;
    let way_id = current.id.unwrap_or_default();
    if !current.visible {
        return Err(ProtocolError::AlreadyDeleted { way_id });
    }
    if !settings.allow_orphaned_members {
        let relation_ids: Vec<_> = containing_relations(view, way_id)?
            .into_iter()
            .filter(|relation| relation.visible)
            .map(|relation| relation.id)
            .collect();
        if !relation_ids.is_empty() {
            return Err(Precondition::StillUsedByRelations {
                way_id,
                relation_ids,
            }
            .into());
        }
    }
    Ok(Way {
        id: current.id,
        version: current.version + 1,
        visible: false,
        changeset_id: candidate.changeset_id,
        nodes: Vec::new(),
        tags: crate::Tags::new(),
    })
}
