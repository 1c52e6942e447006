//! Seeded fixtures shared by unit tests, behaviour tests and examples.
//!
//! The seeded store holds one user with an open changeset, a changeset owned
//! by someone else, a closed changeset, and a handful of nodes around
//! central London, one of them deleted.

use geo::Coord;

use crate::{Changeset, ChangesetId, MemoryMapStore, Node, NodeId, UserId};

/// User owning [`OPEN_CHANGESET`] and [`CLOSED_CHANGESET`].
pub const USER: UserId = 1;
/// User owning [`FOREIGN_CHANGESET`].
pub const OTHER_USER: UserId = 2;
/// Open changeset owned by [`USER`].
pub const OPEN_CHANGESET: ChangesetId = 1;
/// Open changeset owned by [`OTHER_USER`].
pub const FOREIGN_CHANGESET: ChangesetId = 2;
/// Closed changeset owned by [`USER`].
pub const CLOSED_CHANGESET: ChangesetId = 3;
/// Node that exists but has been deleted.
pub const DELETED_NODE: NodeId = 4;

/// Visible nodes `1..=3` followed by the deleted [`DELETED_NODE`].
#[must_use]
pub fn seeded_nodes() -> Vec<Node> {
    vec![
        Node::new(1, Coord::from((-0.1276, 51.5072))),
        Node::new(2, Coord::from((-0.1246, 51.5007))),
        Node::new(3, Coord::from((-0.0754, 51.5055))),
        Node::new(DELETED_NODE, Coord::from((-0.1419, 51.5014))).deleted(),
    ]
}

/// The three seeded changesets.
#[must_use]
pub fn seeded_changesets() -> Vec<Changeset> {
    vec![
        Changeset::new(OPEN_CHANGESET, USER),
        Changeset::new(FOREIGN_CHANGESET, OTHER_USER),
        Changeset::new(CLOSED_CHANGESET, USER).closed(),
    ]
}

/// An in-memory store holding [`seeded_nodes`] and [`seeded_changesets`].
#[must_use]
pub fn seeded_store() -> MemoryMapStore {
    let mut store = MemoryMapStore::default();
    for node in seeded_nodes() {
        store.insert_node(node);
    }
    for changeset in seeded_changesets() {
        store.insert_changeset(changeset);
    }
    store
}
