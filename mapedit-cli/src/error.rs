//! Error types emitted by the mapedit CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use mapedit_core::{GeometryError, ProtocolError, StoreError};
use mapedit_data::IngestError;
use thiserror::Error;

/// Errors emitted by the mapedit CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name of the option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name of the option.
        field: &'static str,
        /// Path that was looked up.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name of the option.
        field: &'static str,
        /// Path that was looked up.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name of the option.
        field: &'static str,
        /// Path that was looked up.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Reading an input file failed.
    #[error("failed to read {path:?}: {source}")]
    ReadInput {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Seed JSON could not be decoded.
    #[error("failed to parse seed JSON at {path:?}: {source}")]
    ParseSeed {
        /// Seed file.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// Opening the way database failed.
    #[error("failed to open way database at {path:?}: {source}")]
    OpenStore {
        /// Database file.
        path: Utf8PathBuf,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The way document was rejected by the parser.
    #[error("failed to parse way document: {0}")]
    Ingest(#[from] IngestError),
    /// The edit was refused.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// A bounding box could not be derived.
    #[error("failed to derive bounding box: {0}")]
    Geometry(#[from] GeometryError),
    /// Reading or writing the database failed outside an edit.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
