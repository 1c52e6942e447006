//! Parse OSM XML way documents into candidate ways.
//!
//! The parser is strict: the first problem found is reported and no partial
//! way is returned. Checks run in a fixed order (document shape, version,
//! changeset, id, tags, node references) so that a payload with several
//! problems always yields the same error.

mod document;
mod ids;

use std::fmt;

use log::debug;
use mapedit_core::{ElementRef, TagError, Way, validate_tags};
use thiserror::Error;

use document::read_first_way;
use ids::{positive_id, version_number};

/// Whether a document describes a new way or an edit of an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMode {
    /// A new way; `id` and `version` are ignored.
    Create,
    /// An existing way; `id` and `version` are required.
    Update,
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
        })
    }
}

/// Errors raised while parsing a way document.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document was empty or whitespace.
    #[error("Must specify a string with one or more characters")]
    EmptyDocument,
    /// The document is not well-formed XML.
    #[error("Cannot parse valid way from xml string: {0}")]
    MalformedXml(#[source] quick_xml::Error),
    /// No `way` element sits directly below the `osm` root.
    #[error("XML doesn't contain an osm/way element.")]
    MissingWay,
    /// Update mode without an `id` attribute.
    #[error("ID is required when updating")]
    IdRequired,
    /// Update mode with an `id` that is not a positive integer.
    #[error("ID of way cannot be zero when updating")]
    IdZero,
    /// Update mode without a `version` attribute.
    #[error("Version is required when updating")]
    VersionRequired,
    /// Update mode with a `version` that is not a number.
    #[error("Version {value:?} is not a valid number")]
    VersionInvalid {
        /// Raw attribute value.
        value: String,
    },
    /// No `changeset` attribute.
    #[error("Changeset id is missing")]
    ChangesetMissing,
    /// A `changeset` attribute that is not a positive integer.
    #[error("Changeset id {value:?} is not a valid id")]
    ChangesetInvalid {
        /// Raw attribute value.
        value: String,
    },
    /// An `nd` element without a positive integer `ref`.
    #[error("Node reference {position} has no valid ref attribute")]
    InvalidNodeRef {
        /// 1-based position of the `nd` element within the way.
        position: usize,
    },
    /// A `tag` element failed validation.
    #[error(transparent)]
    Tag(#[from] TagError),
}

/// Parse `text` into a candidate way.
///
/// The result is visible and, in create mode, carries neither id nor
/// version. Stored state is never consulted.
///
/// # Errors
///
/// Returns the first [`IngestError`] found, in the order the variants are
/// checked: document shape, version, changeset, id, tags, node references.
///
/// # Examples
///
/// ```
/// use mapedit_data::{ParseMode, parse_document};
///
/// let way = parse_document(
///     r#"<osm><way changeset="3"><nd ref="1"/><nd ref="2"/><tag k="highway" v="path"/></way></osm>"#,
///     ParseMode::Create,
/// )
/// .expect("valid document");
/// assert_eq!(way.id, None);
/// assert_eq!(way.nodes, vec![1, 2]);
/// ```
pub fn parse_document(text: &str, mode: ParseMode) -> Result<Way, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::EmptyDocument);
    }
    let raw = read_first_way(text)?;

    let version = match mode {
        ParseMode::Create => 0,
        ParseMode::Update => {
            let value = raw.version.ok_or(IngestError::VersionRequired)?;
            version_number(&value).ok_or(IngestError::VersionInvalid { value })?
        }
    };

    let changeset = raw.changeset.ok_or(IngestError::ChangesetMissing)?;
    let changeset_id =
        positive_id(&changeset).ok_or(IngestError::ChangesetInvalid { value: changeset })?;

    let id = match mode {
        ParseMode::Create => {
            if let Some(ignored) = &raw.id {
                debug!("Ignoring id {ignored:?} on a way being created");
            }
            None
        }
        ParseMode::Update => {
            let value = raw.id.ok_or(IngestError::IdRequired)?;
            Some(positive_id(&value).ok_or(IngestError::IdZero)?)
        }
    };

    let tags = validate_tags(ElementRef::way(id), raw.tags)?;

    let nodes = raw
        .node_refs
        .iter()
        .zip(1..)
        .map(|(node_ref, position)| {
            node_ref
                .as_deref()
                .and_then(positive_id)
                .ok_or(IngestError::InvalidNodeRef { position })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Parsed way for {mode} with {} nodes and {} tags",
        nodes.len(),
        tags.len()
    );
    Ok(Way {
        id,
        version,
        visible: true,
        changeset_id: Some(changeset_id),
        nodes,
        tags,
    })
}
