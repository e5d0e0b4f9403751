//! Extreme point set for the placement search.
//!
//! Extreme points are candidate anchors for the minimum corner of the next
//! item. The set starts with the container origin and grows by up to three
//! points per committed placement: one in front of each far face of the
//! placed box. Points are never removed or merged; stale points are simply
//! re-tested and rejected by the feasibility check.

use crate::geometry::{fits, overlaps};
use crate::model::{ContainerSpec, PlacedItem};
use crate::types::{BoundingBox, Dimensional, Vec3};

/// Growing, insertion-ordered collection of candidate anchor points.
#[derive(Clone, Debug)]
pub struct ExtremePoints {
    points: Vec<Vec3>,
    bounds: Vec3,
}

impl ExtremePoints {
    /// Creates a point set seeded with the container origin.
    pub fn new(container: &ContainerSpec) -> Self {
        Self {
            points: vec![Vec3::zero()],
            bounds: container.dimensions(),
        }
    }

    /// Points in insertion order.
    pub fn as_slice(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Adds the extreme points generated by a committed placement.
    ///
    /// For a box at `(x, y, z)` with size `(l, w, h)` the candidates are
    /// `(x+l, y, z)`, `(x, y+w, z)` and `(x, y, z+h)`. A candidate is kept
    /// only if it lies within the container on every axis; points exactly on
    /// the container boundary are kept.
    pub fn record_placement(&mut self, placed: &PlacedItem) {
        let (x, y, z) = placed.position;
        let (l, w, h) = placed.dims;
        let candidates = [
            Vec3::new(x + l, y, z),
            Vec3::new(x, y + w, z),
            Vec3::new(x, y, z + h),
        ];

        self.points.extend(
            candidates
                .into_iter()
                .filter(|point| point.within(&self.bounds)),
        );
    }
}

/// Checks whether a box of size `dims` anchored at `point` can be placed.
///
/// # Parameters
/// * `point` - Candidate minimum corner
/// * `dims` - Rotated item dimensions
/// * `placed` - Items already committed in this run
/// * `container` - Container of the run
///
/// # Returns
/// `true` if the box lies inside the container and overlaps no placed item
pub fn feasible_placement(
    point: Vec3,
    dims: Vec3,
    placed: &[PlacedItem],
    container: &ContainerSpec,
) -> bool {
    if !fits(point, dims, container.dimensions()) {
        return false;
    }

    let candidate = BoundingBox::from_position_and_dims(point, dims);
    !placed
        .iter()
        .any(|existing| overlaps(&existing.bounding_box(), &candidate))
}
