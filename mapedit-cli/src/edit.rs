//! `parse` and `apply` commands: read an OSM XML way document and, for
//! `apply`, run it through the edit protocol against a SQLite way database.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use log::info;
use mapedit_core::{EditSettings, UserId, Way, WayEditor, WayId};
use mapedit_data::{IngestError, ParseMode, parse_document};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ALLOW_ORPHANED_MEMBERS, ARG_ALLOW_RESURRECTION, ARG_DATABASE, ARG_DOCUMENT,
    ARG_MAX_NODES, ARG_USER, CliError, ENV_APPLY_DATABASE, ENV_APPLY_DOCUMENT, ENV_APPLY_USER,
    ENV_PARSE_DOCUMENT, open_store, read_input, require_existing, write_json,
};

const ARG_MODE: &str = "mode";
const ARG_ACTION: &str = "action";

/// How the parser should treat `id` and `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ModeArg {
    /// The document describes a new way.
    #[default]
    Create,
    /// The document edits an existing way.
    Update,
}

impl From<ModeArg> for ParseMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Create => Self::Create,
            ModeArg::Update => Self::Update,
        }
    }
}

/// Edit applied by the `apply` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EditAction {
    /// Store the document as a new way.
    #[default]
    Create,
    /// Replace the nodes and tags of the way named by the document.
    Modify,
    /// Soft-delete the way named by the document.
    Delete,
}

impl EditAction {
    const fn parse_mode(self) -> ParseMode {
        match self {
            Self::Create => ParseMode::Create,
            Self::Modify | Self::Delete => ParseMode::Update,
        }
    }
}

/// CLI arguments for the `parse` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "parse",
    about = "Parse an OSM XML way document and print the candidate way"
)]
#[ortho_config(prefix = "MAPEDIT")]
pub(crate) struct ParseArgs {
    /// Path to the OSM XML document.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) document: Option<Utf8PathBuf>,
    /// Parse as a new way (`create`) or an edit (`update`).
    #[arg(long = ARG_MODE, value_enum)]
    #[serde(default)]
    pub(crate) mode: Option<ModeArg>,
}

impl ParseArgs {
    fn into_config(self) -> Result<ParseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ParseConfig::try_from(merged)
    }
}

/// Resolved `parse` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseConfig {
    pub(crate) document: Utf8PathBuf,
    pub(crate) mode: ParseMode,
}

impl TryFrom<ParseArgs> for ParseConfig {
    type Error = CliError;

    fn try_from(args: ParseArgs) -> Result<Self, Self::Error> {
        let document = args.document.ok_or(CliError::MissingArgument {
            field: ARG_DOCUMENT,
            env: ENV_PARSE_DOCUMENT,
        })?;
        Ok(Self {
            document,
            mode: args.mode.unwrap_or_default().into(),
        })
    }
}

/// CLI arguments for the `apply` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "apply",
    long_about = "Parse an OSM XML way document and create, modify or \
                 delete the way it describes. The stored way is printed as \
                 JSON. Edit limits can come from CLI flags, configuration \
                 files, or environment variables.",
    about = "Create, modify or delete a way"
)]
#[ortho_config(prefix = "MAPEDIT")]
pub(crate) struct ApplyArgs {
    /// Path to the OSM XML document.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) document: Option<Utf8PathBuf>,
    /// Path to the SQLite way database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Edit to apply; defaults to `create`.
    #[arg(long = ARG_ACTION, value_enum)]
    #[serde(default)]
    pub(crate) action: Option<EditAction>,
    /// User submitting the edit.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<UserId>,
    /// Largest number of node references a way may hold.
    #[arg(long = ARG_MAX_NODES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_nodes: Option<usize>,
    /// Allow updates to revive a deleted way.
    #[arg(long = ARG_ALLOW_RESURRECTION, value_name = "bool")]
    #[serde(default)]
    pub(crate) allow_resurrection: Option<bool>,
    /// Allow deleting a way that relations still reference.
    #[arg(long = ARG_ALLOW_ORPHANED_MEMBERS, value_name = "bool")]
    #[serde(default)]
    pub(crate) allow_orphaned_members: Option<bool>,
}

impl ApplyArgs {
    fn into_config(self) -> Result<ApplyConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ApplyConfig::try_from(merged)
    }
}

/// Resolved `apply` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApplyConfig {
    pub(crate) document: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
    pub(crate) action: EditAction,
    pub(crate) user: UserId,
    pub(crate) settings: EditSettings,
}

impl ApplyConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.document, ARG_DOCUMENT)?;
        require_existing(&self.database, ARG_DATABASE)?;
        Ok(())
    }
}

impl TryFrom<ApplyArgs> for ApplyConfig {
    type Error = CliError;

    fn try_from(args: ApplyArgs) -> Result<Self, Self::Error> {
        let document = args.document.ok_or(CliError::MissingArgument {
            field: ARG_DOCUMENT,
            env: ENV_APPLY_DOCUMENT,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_APPLY_DATABASE,
        })?;
        let user = args.user.ok_or(CliError::MissingArgument {
            field: ARG_USER,
            env: ENV_APPLY_USER,
        })?;

        let defaults = EditSettings::default();
        let settings = defaults
            .with_max_nodes(args.max_nodes.unwrap_or(defaults.max_nodes))
            .with_resurrection(args.allow_resurrection.unwrap_or(defaults.allow_resurrection))
            .with_orphaned_members(
                args.allow_orphaned_members.unwrap_or(defaults.allow_orphaned_members),
            );

        Ok(Self {
            document,
            database,
            action: args.action.unwrap_or_default(),
            user,
            settings,
        })
    }
}

pub(crate) fn run_parse(args: ParseArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let way = parse(&config)?;
    write_json(writer, &way)
}

pub(crate) fn parse(config: &ParseConfig) -> Result<Way, CliError> {
    require_existing(&config.document, ARG_DOCUMENT)?;
    let text = read_input(&config.document)?;
    Ok(parse_document(&text, config.mode)?)
}

pub(crate) fn run_apply(args: ApplyArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let way = apply(&config)?;
    write_json(writer, &way)
}

/// Parse the document and run the configured edit.
pub(crate) fn apply(config: &ApplyConfig) -> Result<Way, CliError> {
    let text = read_input(&config.document)?;
    let candidate = parse_document(&text, config.action.parse_mode())?;
    let mut editor = WayEditor::new(open_store(&config.database)?, config.settings);
    let way = match config.action {
        EditAction::Create => editor.create_with_history(&candidate, config.user)?,
        EditAction::Modify => {
            editor.update_from(target_id(&candidate)?, &candidate, config.user)?
        }
        EditAction::Delete => {
            editor.delete_with_history(target_id(&candidate)?, &candidate, config.user)?
        }
    };
    info!(
        "Applied {:?} from {} to way {:?} (version {})",
        config.action, config.document, way.id, way.version
    );
    Ok(way)
}

fn target_id(candidate: &Way) -> Result<WayId, CliError> {
    candidate
        .id
        .ok_or(CliError::Ingest(IngestError::IdRequired))
}
