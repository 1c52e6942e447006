//! In-memory store used by tests, demos and short-lived tooling.

use std::collections::HashMap;

use log::debug;

use super::{HistoryEntry, StoreError, WayCommit, WayStore};
use crate::{
    Changeset, ChangesetId, ChangesetLookup, ElementKind, Node, NodeId, NodeLookup, Relation,
    RelationId, RelationMember, RelationStore, Way, WayId,
};

/// Map data held in owned collections.
///
/// Compare-and-swap is trivially atomic here because commits take
/// `&mut self`.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use mapedit_core::{MemoryMapStore, Node, NodeLookup};
///
/// let store = MemoryMapStore::default().with_node(Node::new(1, Coord { x: 0.5, y: 51.0 }));
/// let node = store.node(1).expect("in-memory lookup").expect("node 1");
/// assert!(node.visible);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryMapStore {
    nodes: HashMap<NodeId, Node>,
    changesets: HashMap<ChangesetId, Changeset>,
    relations: HashMap<RelationId, Relation>,
    members: Vec<RelationMember>,
    histories: HashMap<WayId, Vec<HistoryEntry>>,
    last_way_id: WayId,
}

impl MemoryMapStore {
    /// Add or replace a node.
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.insert_node(node);
        self
    }

    /// Add or replace a changeset.
    #[must_use]
    pub fn with_changeset(mut self, changeset: Changeset) -> Self {
        self.insert_changeset(changeset);
        self
    }

    /// Add or replace a relation together with its members.
    #[must_use]
    pub fn with_relation<I>(mut self, relation: Relation, members: I) -> Self
    where
        I: IntoIterator<Item = RelationMember>,
    {
        self.insert_relation(relation, members);
        self
    }

    /// Add or replace a node in place.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Add or replace a changeset in place.
    pub fn insert_changeset(&mut self, changeset: Changeset) {
        self.changesets.insert(changeset.id, changeset);
    }

    /// Add or replace a relation in place.
    ///
    /// Existing members of the relation are dropped; the new members are
    /// re-pointed at `relation.id`.
    pub fn insert_relation<I>(&mut self, relation: Relation, members: I)
    where
        I: IntoIterator<Item = RelationMember>,
    {
        self.members.retain(|member| member.relation_id != relation.id);
        self.members.extend(members.into_iter().map(|member| RelationMember {
            relation_id: relation.id,
            ..member
        }));
        self.relations.insert(relation.id, relation);
    }

    /// Add members without registering their relation.
    ///
    /// Models dangling member rows left behind by an external writer.
    pub fn insert_orphan_members<I>(&mut self, members: I)
    where
        I: IntoIterator<Item = RelationMember>,
    {
        self.members.extend(members);
    }

    /// Number of ways with at least one snapshot.
    #[must_use]
    pub fn way_count(&self) -> usize {
        self.histories.len()
    }
}

impl NodeLookup for MemoryMapStore {
    fn node(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        Ok(self.nodes.get(&id).copied())
    }
}

impl ChangesetLookup for MemoryMapStore {
    fn changeset(&self, id: ChangesetId) -> Result<Option<Changeset>, StoreError> {
        Ok(self.changesets.get(&id).copied())
    }
}

impl RelationStore for MemoryMapStore {
    fn relation(&self, id: RelationId) -> Result<Option<Relation>, StoreError> {
        Ok(self.relations.get(&id).copied())
    }

    fn members_referencing(
        &self,
        member_type: ElementKind,
        member_id: u64,
    ) -> Result<Vec<RelationMember>, StoreError> {
        Ok(self
            .members
            .iter()
            .filter(|member| member.member_type == member_type && member.member_id == member_id)
            .cloned()
            .collect())
    }
}

impl WayStore for MemoryMapStore {
    fn load_current(&self, way_id: WayId) -> Result<Option<Way>, StoreError> {
        Ok(self
            .histories
            .get(&way_id)
            .and_then(|history| history.last())
            .map(|entry| entry.way.clone()))
    }

    fn load_version(&self, way_id: WayId, version: u64) -> Result<Option<Way>, StoreError> {
        Ok(self.histories.get(&way_id).and_then(|history| {
            history
                .iter()
                .find(|entry| entry.way.version == version)
                .map(|entry| entry.way.clone())
        }))
    }

    fn history(&self, way_id: WayId) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.histories.get(&way_id).cloned().unwrap_or_default())
    }

    fn allocate_id(&mut self) -> Result<WayId, StoreError> {
        self.last_way_id += 1;
        Ok(self.last_way_id)
    }

    fn commit(&mut self, commit: WayCommit) -> Result<(), StoreError> {
        let found = self
            .histories
            .get(&commit.way_id()?)
            .and_then(|history| history.last())
            .map(|entry| entry.way.version);
        let way_id = commit.check_against(found)?;
        debug!(
            "Committing way {way_id} version {} ({})",
            commit.entry.way.version, commit.entry.action
        );
        self.last_way_id = self.last_way_id.max(way_id);
        self.histories.entry(way_id).or_default().push(commit.entry);
        Ok(())
    }
}
