//! `import` command: seed a way database from JSON.
//!
//! The seed file carries the collaborators the edit protocol reads (nodes,
//! changesets, relations) and, optionally, ways that are stored directly
//! as their next version without running the protocol.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use mapedit_core::{Changeset, Node, Relation, RelationMember, SqliteMapStore, Way, WayId, WayStore};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_SEED, CliError, ENV_IMPORT_DATABASE, ENV_IMPORT_SEED, open_store,
    read_input, require_existing, write_json,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Load nodes, changesets, relations and ways from a JSON \
                 seed file into a SQLite way database, creating the \
                 database when it does not exist yet.",
    about = "Seed a way database from JSON"
)]
#[ortho_config(prefix = "MAPEDIT")]
pub(crate) struct ImportArgs {
    /// Path to the JSON seed file.
    #[arg(long = ARG_SEED, value_name = "path")]
    #[serde(default)]
    pub(crate) seed: Option<Utf8PathBuf>,
    /// Path to the SQLite way database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl ImportArgs {
    fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) seed: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let seed = args.seed.ok_or(CliError::MissingArgument {
            field: ARG_SEED,
            env: ENV_IMPORT_SEED,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_IMPORT_DATABASE,
        })?;
        Ok(Self { seed, database })
    }
}

/// Contents of a seed file. Every section may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Seed {
    pub(crate) nodes: Vec<Node>,
    pub(crate) changesets: Vec<Changeset>,
    pub(crate) relations: Vec<SeedRelation>,
    pub(crate) ways: Vec<Way>,
}

/// A relation with its ordered members.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SeedRelation {
    #[serde(flatten)]
    pub(crate) relation: Relation,
    #[serde(default)]
    pub(crate) members: Vec<RelationMember>,
}

/// Printed by `import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ImportReport {
    pub(crate) nodes: usize,
    pub(crate) changesets: usize,
    pub(crate) relations: usize,
    /// Ids of the imported ways, in seed order.
    pub(crate) ways: Vec<WayId>,
}

pub(crate) fn run_import(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = import(&config)?;
    write_json(writer, &report)
}

pub(crate) fn import(config: &ImportConfig) -> Result<ImportReport, CliError> {
    let seed = load_seed(&config.seed)?;
    let mut store = open_store(&config.database)?;
    let report = apply_seed(&mut store, seed)?;
    info!(
        "Imported {} nodes, {} changesets, {} relations and {} ways into {}",
        report.nodes,
        report.changesets,
        report.relations,
        report.ways.len(),
        config.database
    );
    Ok(report)
}

pub(crate) fn load_seed(path: &Utf8Path) -> Result<Seed, CliError> {
    require_existing(path, ARG_SEED)?;
    let text = read_input(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::ParseSeed {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_seed(store: &mut SqliteMapStore, seed: Seed) -> Result<ImportReport, CliError> {
    for node in &seed.nodes {
        store.insert_node(node)?;
    }
    for changeset in &seed.changesets {
        store.insert_changeset(changeset)?;
    }
    for entry in &seed.relations {
        store.insert_relation(&entry.relation, &entry.members)?;
    }
    let ways = seed
        .ways
        .into_iter()
        .map(|way| store.import_way(way))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ImportReport {
        nodes: seed.nodes.len(),
        changesets: seed.changesets.len(),
        relations: seed.relations.len(),
        ways,
    })
}
