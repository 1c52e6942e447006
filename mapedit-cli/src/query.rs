//! Read-only `bbox` and `relations` commands.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use mapedit_core::{EditSettings, Relation, RelationMember, SqliteMapStore, WayEditor, WayId};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_WAY_ID, CliError, ENV_BBOX_DATABASE, ENV_BBOX_WAY_ID,
    ENV_RELATIONS_DATABASE, ENV_RELATIONS_WAY_ID, open_store, require_existing, write_json,
};

/// CLI arguments for the `bbox` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "bbox", about = "Print the bounding box of a stored way")]
#[ortho_config(prefix = "MAPEDIT")]
pub(crate) struct BboxArgs {
    /// Way to measure.
    #[arg(long = ARG_WAY_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) way_id: Option<WayId>,
    /// Path to the SQLite way database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// CLI arguments for the `relations` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "relations", about = "List the relations that reference a way")]
#[ortho_config(prefix = "MAPEDIT")]
pub(crate) struct RelationsArgs {
    /// Way whose back-references are listed.
    #[arg(long = ARG_WAY_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) way_id: Option<WayId>,
    /// Path to the SQLite way database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// A way and the database to look it up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryConfig {
    pub(crate) way_id: WayId,
    pub(crate) database: Utf8PathBuf,
}

impl QueryConfig {
    fn resolve(
        way_id: Option<WayId>,
        database: Option<Utf8PathBuf>,
        way_id_env: &'static str,
        database_env: &'static str,
    ) -> Result<Self, CliError> {
        Ok(Self {
            way_id: way_id.ok_or(CliError::MissingArgument {
                field: ARG_WAY_ID,
                env: way_id_env,
            })?,
            database: database.ok_or(CliError::MissingArgument {
                field: ARG_DATABASE,
                env: database_env,
            })?,
        })
    }

    fn editor(&self) -> Result<WayEditor<SqliteMapStore>, CliError> {
        require_existing(&self.database, ARG_DATABASE)?;
        let store = open_store(&self.database)?;
        Ok(WayEditor::new(store, EditSettings::default()))
    }
}

impl TryFrom<BboxArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: BboxArgs) -> Result<Self, Self::Error> {
        Self::resolve(
            args.way_id,
            args.database,
            ENV_BBOX_WAY_ID,
            ENV_BBOX_DATABASE,
        )
    }
}

impl TryFrom<RelationsArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: RelationsArgs) -> Result<Self, Self::Error> {
        Self::resolve(
            args.way_id,
            args.database,
            ENV_RELATIONS_WAY_ID,
            ENV_RELATIONS_DATABASE,
        )
    }
}

/// Printed by `bbox`; degrees, WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct BboxReport {
    pub(crate) way_id: WayId,
    pub(crate) min_lon: f64,
    pub(crate) min_lat: f64,
    pub(crate) max_lon: f64,
    pub(crate) max_lat: f64,
}

/// Printed by `relations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RelationsReport {
    pub(crate) way_id: WayId,
    pub(crate) relations: Vec<Relation>,
    pub(crate) members: Vec<RelationMember>,
}

pub(crate) fn run_bbox(args: BboxArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let report = bbox(&QueryConfig::try_from(merged)?)?;
    write_json(writer, &report)
}

pub(crate) fn bbox(config: &QueryConfig) -> Result<BboxReport, CliError> {
    let bounds = config.editor()?.bbox(config.way_id)?;
    Ok(BboxReport {
        way_id: config.way_id,
        min_lon: bounds.min_lon(),
        min_lat: bounds.min_lat(),
        max_lon: bounds.max_lon(),
        max_lat: bounds.max_lat(),
    })
}

pub(crate) fn run_relations(args: RelationsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let report = relations(&QueryConfig::try_from(merged)?)?;
    write_json(writer, &report)
}

pub(crate) fn relations(config: &QueryConfig) -> Result<RelationsReport, CliError> {
    let editor = config.editor()?;
    Ok(RelationsReport {
        way_id: config.way_id,
        relations: editor.containing_relations(config.way_id)?,
        members: editor.containing_relation_members(config.way_id)?,
    })
}
