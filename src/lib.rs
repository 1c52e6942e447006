//! Facade crate for the mapedit way-editing engine.
//!
//! This crate re-exports the core domain types and exposes the XML ingestion
//! parser and the SQLite-backed store behind feature flags.

#![forbid(unsafe_code)]

pub use mapedit_core::{
    BoundingBox, Changeset, ChangesetLookup, EditSettings, ElementKind, ElementRef,
    GeometryError, HistoryEntry, MapView, MemoryMapStore, Node, NodeLookup, NodeReference,
    Precondition, ProtocolError, Relation, RelationMember, RelationStore, StoreError,
    TagCandidate, TagError, Tags, Way, WayAction, WayCommit, WayEditor, WayError, WayStore,
};

#[cfg(feature = "store-sqlite")]
pub use mapedit_core::SqliteMapStore;

#[cfg(feature = "ingest-xml")]
pub use mapedit_data::{IngestError, ParseMode, parse_document};
