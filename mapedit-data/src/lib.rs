//! Wire-format ingestion for the mapedit way-editing engine.
//!
//! Responsibilities:
//! - Turn an untrusted OSM XML payload into a candidate [`Way`] that is
//!   structurally valid.
//! - Report the first problem found as a typed [`IngestError`].
//!
//! Boundaries:
//! - Never consult stored state; version, changeset and node checks against
//!   the store belong to `mapedit-core`'s protocol.
//!
//! [`Way`]: mapedit_core::Way

#![forbid(unsafe_code)]

pub mod ingest;

pub use ingest::{IngestError, ParseMode, parse_document};
