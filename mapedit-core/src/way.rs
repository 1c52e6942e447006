//! The way aggregate.
//!
//! A way owns its ordered node references and its tag map. Node order is
//! significant and repeats are allowed, so a closed ring repeats its first
//! node at the end.

use thiserror::Error;

use crate::tags::check_tag;
use crate::{ChangesetId, EditSettings, ElementRef, NodeId, TagError, Tags, WayId};

/// An ordered polyline or polygon over nodes.
///
/// # Examples
///
/// ```
/// use mapedit_core::{EditSettings, Way};
///
/// let mut way = Way::new().with_changeset(7);
/// way.append_node(1);
/// way.append_node(2);
/// way.append_node(1);
/// assert_eq!(way.nodes, vec![1, 2, 1]);
/// assert!(way.is_valid(&EditSettings::default()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Way {
    /// Stable identifier, unset until the way has been created.
    pub id: Option<WayId>,
    /// Version of this snapshot; `0` for candidates that were never stored.
    pub version: u64,
    /// `false` marks a soft-deleted way.
    pub visible: bool,
    /// Changeset the snapshot was written under.
    pub changeset_id: Option<ChangesetId>,
    /// Ordered node references.
    pub nodes: Vec<NodeId>,
    /// Key/value tags.
    pub tags: Tags,
}

impl Default for Way {
    fn default() -> Self {
        Self {
            id: None,
            version: 0,
            visible: true,
            changeset_id: None,
            nodes: Vec::new(),
            tags: Tags::new(),
        }
    }
}

/// A node's position within a way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeReference {
    /// Way owning the reference.
    pub way_id: WayId,
    /// 1-based, contiguous position in the way.
    pub sequence_id: usize,
    /// Referenced node.
    pub node_id: NodeId,
}

/// Reasons a way fails [`Way::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WayError {
    /// More node references than the configured limit.
    #[error("You tried to add {count} nodes to {element}, however only {max} are allowed")]
    TooManyNodes {
        /// The offending way.
        element: ElementRef,
        /// Number of node references supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A tag failed the final guard.
    #[error(transparent)]
    Tag(#[from] TagError),
}

impl Way {
    /// An empty, visible, uncreated way.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: WayId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Set the visibility flag.
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the changeset.
    #[must_use]
    pub fn with_changeset(mut self, changeset_id: ChangesetId) -> Self {
        self.changeset_id = Some(changeset_id);
        self
    }

    /// Replace the node list.
    #[must_use]
    pub fn with_nodes<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.nodes = nodes.into_iter().collect();
        self
    }

    /// Add or replace a tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Append a node reference. Never fails; see [`Way::validate`].
    pub fn append_node(&mut self, node_id: NodeId) {
        self.nodes.push(node_id);
    }

    /// Reference used when naming this way in messages.
    #[must_use]
    pub const fn element_ref(&self) -> ElementRef {
        ElementRef::way(self.id)
    }

    /// Node references with their 1-based sequence ids.
    ///
    /// Returns `None` for a way that has no identifier yet.
    pub fn node_references(&self) -> Option<impl Iterator<Item = NodeReference> + '_> {
        let way_id = self.id?;
        Some(
            self.nodes
                .iter()
                .zip(1..)
                .map(move |(&node_id, sequence_id)| NodeReference {
                    way_id,
                    sequence_id,
                    node_id,
                }),
        )
    }

    /// Check the node-count limit and re-check every tag.
    ///
    /// Duplicate keys cannot be represented in [`Tags`]; the tag check here
    /// covers empty keys and the length limit.
    ///
    /// # Errors
    ///
    /// Returns [`WayError`] naming the first broken invariant.
    pub fn validate(&self, settings: &EditSettings) -> Result<(), WayError> {
        if self.nodes.len() > settings.max_nodes {
            return Err(WayError::TooManyNodes {
                element: self.element_ref(),
                count: self.nodes.len(),
                max: settings.max_nodes,
            });
        }
        for (key, value) in &self.tags {
            check_tag(key, value)?;
        }
        Ok(())
    }

    /// `true` when [`Way::validate`] succeeds.
    #[must_use]
    pub fn is_valid(&self, settings: &EditSettings) -> bool {
        self.validate(settings).is_ok()
    }
}
