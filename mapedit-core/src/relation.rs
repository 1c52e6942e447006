//! Read-only view of relations and their members.
//!
//! Relations group other elements. The way-editing core never changes them;
//! it only asks which relations reference a way, both for queries and before
//! a delete.

use std::collections::BTreeSet;

use log::warn;

use crate::{ElementKind, RelationId, StoreError, WayId};

/// A relation as seen by the way-editing core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relation {
    /// Relation identifier.
    pub id: RelationId,
    /// Current version of the relation.
    pub version: u64,
    /// `false` once the relation has been deleted.
    pub visible: bool,
}

impl Relation {
    /// A visible relation at version 1.
    #[must_use]
    pub const fn new(id: RelationId) -> Self {
        Self {
            id,
            version: 1,
            visible: true,
        }
    }
}

/// One member entry of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationMember {
    /// Relation owning the entry.
    pub relation_id: RelationId,
    /// Kind of the referenced element.
    pub member_type: ElementKind,
    /// Identifier of the referenced element.
    pub member_id: u64,
    /// Role string, empty when the member has no role.
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: String,
    /// 1-based position within the relation.
    pub sequence_id: usize,
}

impl RelationMember {
    /// A way member without a role.
    #[must_use]
    pub const fn way(relation_id: RelationId, way_id: WayId, sequence_id: usize) -> Self {
        Self {
            relation_id,
            member_type: ElementKind::Way,
            member_id: way_id,
            role: String::new(),
            sequence_id,
        }
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Resolve the relation owning this entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the relation cannot be read.
    pub fn relation<R>(&self, store: &R) -> Result<Option<Relation>, StoreError>
    where
        R: RelationStore + ?Sized,
    {
        store.relation(self.relation_id)
    }
}

/// Read access to relations and their members.
pub trait RelationStore {
    /// Return the relation with `id`, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn relation(&self, id: RelationId) -> Result<Option<Relation>, StoreError>;

    /// Return every member entry pointing at the given element, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn members_referencing(
        &self,
        member_type: ElementKind,
        member_id: u64,
    ) -> Result<Vec<RelationMember>, StoreError>;
}

/// Member entries that reference `way_id`, ordered by relation then position.
///
/// # Errors
///
/// Returns [`StoreError`] when the members cannot be read.
pub fn containing_relation_members<R>(
    store: &R,
    way_id: WayId,
) -> Result<Vec<RelationMember>, StoreError>
where
    R: RelationStore + ?Sized,
{
    let mut members = store.members_referencing(ElementKind::Way, way_id)?;
    members.sort_by_key(|member| (member.relation_id, member.sequence_id));
    Ok(members)
}

/// Distinct relations that reference `way_id`, ordered by id.
///
/// Members whose relation cannot be resolved are skipped with a warning.
///
/// # Errors
///
/// Returns [`StoreError`] when members or relations cannot be read.
pub fn containing_relations<R>(store: &R, way_id: WayId) -> Result<Vec<Relation>, StoreError>
where
    R: RelationStore + ?Sized,
{
    let relation_ids: BTreeSet<RelationId> = store
        .members_referencing(ElementKind::Way, way_id)?
        .into_iter()
        .map(|member| member.relation_id)
        .collect();

    let mut relations = Vec::with_capacity(relation_ids.len());
    for relation_id in relation_ids {
        match store.relation(relation_id)? {
            Some(relation) => relations.push(relation),
            None => warn!("Skipped member of way {way_id}: relation {relation_id} does not exist"),
        }
    }
    Ok(relations)
}
