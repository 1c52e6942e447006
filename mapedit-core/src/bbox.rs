//! Bounding boxes derived from a way's node references.
//!
//! The box depends only on the node list and the node positions. A way's
//! own visibility and its relation memberships play no part.

use geo::{Coord, Rect};
use thiserror::Error;

use crate::{NodeId, NodeLookup, StoreError, Way, WayId};

/// Smallest axis-aligned box covering a set of coordinates.
///
/// Bounds are inclusive; a single coordinate yields a degenerate box with
/// `min == max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    /// Degenerate box around a single coordinate.
    #[must_use]
    pub fn point(coord: Coord<f64>) -> Self {
        Self {
            rect: Rect::new(coord, coord),
        }
    }

    /// Box covering every coordinate, or `None` when there are none.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::Coord;
    /// use mapedit_core::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_coords([
    ///     Coord { x: 1.0, y: 5.0 },
    ///     Coord { x: -2.0, y: 3.0 },
    /// ])
    /// .expect("two coordinates");
    /// assert_eq!(bbox.min_lon(), -2.0);
    /// assert_eq!(bbox.max_lat(), 5.0);
    /// ```
    pub fn from_coords<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let mut points = coords.into_iter();
        let mut bounds = Self::point(points.next()?);
        for coord in points {
            bounds.include(coord);
        }
        Some(bounds)
    }

    /// Grow the box to cover `coord`.
    pub fn include(&mut self, coord: Coord<f64>) {
        let min = Coord {
            x: self.rect.min().x.min(coord.x),
            y: self.rect.min().y.min(coord.y),
        };
        let max = Coord {
            x: self.rect.max().x.max(coord.x),
            y: self.rect.max().y.max(coord.y),
        };
        self.rect = Rect::new(min, max);
    }

    /// Western edge.
    #[must_use]
    pub fn min_lon(&self) -> f64 {
        self.rect.min().x
    }

    /// Southern edge.
    #[must_use]
    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    /// Eastern edge.
    #[must_use]
    pub fn max_lon(&self) -> f64 {
        self.rect.max().x
    }

    /// Northern edge.
    #[must_use]
    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    /// The box as a `geo` rectangle.
    #[must_use]
    pub const fn rect(&self) -> Rect<f64> {
        self.rect
    }
}

impl From<BoundingBox> for Rect<f64> {
    fn from(bbox: BoundingBox) -> Self {
        bbox.rect
    }
}

/// Errors returned while deriving a bounding box.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The way references no nodes.
    #[error("way has no nodes to bound")]
    EmptyGeometry,
    /// A referenced node could not be found.
    #[error("node {node_id} referenced by the way does not exist")]
    MissingNode {
        /// Identifier of the unresolved node.
        node_id: NodeId,
    },
    /// The requested way does not exist.
    #[error("way {way_id} does not exist")]
    UnknownWay {
        /// Identifier that was looked up.
        way_id: WayId,
    },
    /// Reading nodes or ways failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Derive the bounding box of an ordered node list.
///
/// # Errors
///
/// Returns [`GeometryError::EmptyGeometry`] for an empty list and
/// [`GeometryError::MissingNode`] when a reference cannot be resolved.
pub fn bounding_box<L>(nodes: &[NodeId], lookup: &L) -> Result<BoundingBox, GeometryError>
where
    L: NodeLookup + ?Sized,
{
    let (first, rest) = nodes.split_first().ok_or(GeometryError::EmptyGeometry)?;
    let mut bounds = BoundingBox::point(locate(lookup, *first)?);
    for node_id in rest {
        bounds.include(locate(lookup, *node_id)?);
    }
    Ok(bounds)
}

fn locate<L>(lookup: &L, node_id: NodeId) -> Result<Coord<f64>, GeometryError>
where
    L: NodeLookup + ?Sized,
{
    lookup
        .node(node_id)?
        .map(|node| node.location)
        .ok_or(GeometryError::MissingNode { node_id })
}

impl Way {
    /// Bounding box of this snapshot's node list.
    ///
    /// # Errors
    ///
    /// See [`bounding_box`].
    pub fn bbox<L>(&self, lookup: &L) -> Result<BoundingBox, GeometryError>
    where
        L: NodeLookup + ?Sized,
    {
        bounding_box(&self.nodes, lookup)
    }
}
