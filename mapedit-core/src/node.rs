//! Point elements referenced by ways.
//!
//! Nodes are owned by a collaborator; this crate only reads their position
//! and visibility through [`NodeLookup`].

use geo::Coord;

use crate::{NodeId, StoreError};

/// A node as seen by the way-editing core.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Geospatial position.
    pub location: Coord<f64>,
    /// `false` once the node has been deleted.
    pub visible: bool,
}

impl Node {
    /// A visible node at the given position.
    #[must_use]
    pub const fn new(id: NodeId, location: Coord<f64>) -> Self {
        Self {
            id,
            location,
            visible: true,
        }
    }

    /// The same node marked as deleted.
    #[must_use]
    pub const fn deleted(self) -> Self {
        Self {
            visible: false,
            ..self
        }
    }
}

/// Read access to node coordinates and visibility.
pub trait NodeLookup {
    /// Return the node with `id`, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn node(&self, id: NodeId) -> Result<Option<Node>, StoreError>;
}
