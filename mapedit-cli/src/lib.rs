//! Command-line interface for the mapedit way-editing engine.
//!
//! Every command reads its inputs from CLI flags, configuration files or
//! `MAPEDIT_CMDS_*` environment variables, and writes a JSON document to
//! standard output. Diagnostics go to standard error through `log`.
#![forbid(unsafe_code)]

mod edit;
mod error;
mod import;
mod query;

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use mapedit_core::SqliteMapStore;
use serde::Serialize;

pub use error::CliError;

use edit::{ApplyArgs, ParseArgs};
use import::ImportArgs;
use query::{BboxArgs, RelationsArgs};

const ARG_DOCUMENT: &str = "document";
const ARG_DATABASE: &str = "database";
const ARG_USER: &str = "user";
const ARG_WAY_ID: &str = "way-id";
const ARG_SEED: &str = "seed";
const ARG_MAX_NODES: &str = "max-nodes";
const ARG_ALLOW_RESURRECTION: &str = "allow-resurrection";
const ARG_ALLOW_ORPHANED_MEMBERS: &str = "allow-orphaned-members";
const ENV_PARSE_DOCUMENT: &str = "MAPEDIT_CMDS_PARSE_DOCUMENT";
const ENV_APPLY_DOCUMENT: &str = "MAPEDIT_CMDS_APPLY_DOCUMENT";
const ENV_APPLY_DATABASE: &str = "MAPEDIT_CMDS_APPLY_DATABASE";
const ENV_APPLY_USER: &str = "MAPEDIT_CMDS_APPLY_USER";
const ENV_BBOX_WAY_ID: &str = "MAPEDIT_CMDS_BBOX_WAY_ID";
const ENV_BBOX_DATABASE: &str = "MAPEDIT_CMDS_BBOX_DATABASE";
const ENV_RELATIONS_WAY_ID: &str = "MAPEDIT_CMDS_RELATIONS_WAY_ID";
const ENV_RELATIONS_DATABASE: &str = "MAPEDIT_CMDS_RELATIONS_DATABASE";
const ENV_IMPORT_SEED: &str = "MAPEDIT_CMDS_IMPORT_SEED";
const ENV_IMPORT_DATABASE: &str = "MAPEDIT_CMDS_IMPORT_DATABASE";

/// Run the mapedit CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError::ArgumentParsing`] for invalid arguments (including
/// `--help`, which callers should render with [`clap::Error::exit`]) and the
/// command's own error otherwise.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Parse(args) => edit::run_parse(args, &mut stdout),
        Command::Apply(args) => edit::run_apply(args, &mut stdout),
        Command::Bbox(args) => query::run_bbox(args, &mut stdout),
        Command::Relations(args) => query::run_relations(args, &mut stdout),
        Command::Import(args) => import::run_import(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "mapedit",
    about = "Create, edit and query versioned OSM ways",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an OSM XML way document and print the candidate way.
    Parse(ParseArgs),
    /// Create, modify or delete a way from an OSM XML document.
    Apply(ApplyArgs),
    /// Print the bounding box of a stored way.
    Bbox(BboxArgs),
    /// List the relations that reference a way.
    Relations(RelationsArgs),
    /// Seed a way database from a JSON file.
    Import(ImportArgs),
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match mapedit_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_input(path: &Utf8Path) -> Result<String, CliError> {
    mapedit_fs::read_utf8_file(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

fn open_store(path: &Utf8Path) -> Result<SqliteMapStore, CliError> {
    SqliteMapStore::open(path).map_err(|source| CliError::OpenStore {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
