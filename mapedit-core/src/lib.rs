//! Core domain types for the mapedit way-editing engine.
//!
//! Responsibilities:
//! - Model ways, their node references and tags as owned values.
//! - Validate tag sets and node-list limits before anything is persisted.
//! - Run the optimistic-concurrency transitions (create, update, delete)
//!   against a store exposing compare-and-swap on the way version.
//! - Derive bounding boxes and answer relation back-reference queries.
//!
//! Boundaries:
//! - Node coordinates, changesets and relations belong to collaborators and
//!   are only read through the [`NodeLookup`], [`ChangesetLookup`] and
//!   [`RelationStore`] traits.
//! - Wire parsing lives in `mapedit-data`.

#![forbid(unsafe_code)]

pub mod bbox;
pub mod changeset;
pub mod editor;
pub mod node;
pub mod protocol;
pub mod relation;
pub mod settings;
pub mod store;
pub mod tags;
pub mod test_support;
pub mod way;

pub use bbox::{BoundingBox, GeometryError, bounding_box};
pub use changeset::{Changeset, ChangesetLookup};
pub use editor::WayEditor;
pub use node::{Node, NodeLookup};
pub use protocol::{MapView, Precondition, ProtocolError};
pub use relation::{
    Relation, RelationMember, RelationStore, containing_relation_members, containing_relations,
};
pub use settings::{DEFAULT_MAX_NODES, EditSettings};
pub use store::{HistoryEntry, MemoryMapStore, StoreError, WayAction, WayCommit, WayStore};
pub use tags::{
    ElementKind, ElementRef, MAX_TAG_LENGTH, TagCandidate, TagError, Tags, validate_tags,
};
pub use way::{NodeReference, Way, WayError};

#[cfg(feature = "store-sqlite")]
pub use store::SqliteMapStore;

/// Identifier of a way.
pub type WayId = u64;
/// Identifier of a node.
pub type NodeId = u64;
/// Identifier of a changeset.
pub type ChangesetId = u64;
/// Identifier of a user.
pub type UserId = u64;
/// Identifier of a relation.
pub type RelationId = u64;
