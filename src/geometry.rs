//! Geometric primitives for the packing engine.
//!
//! Provides the six-way orientation enumeration, the container containment
//! test and the AABB overlap test used by the placement search.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, Vec3};

/// One of the six assignments of an item's (length, width, height) to the
/// container axes X, Y, Z.
///
/// The discriminant is the orientation index. The mapping is fixed so that a
/// placement can always be re-derived from `(orientation, position)`.
/// Items with equal dimensions yield duplicate permutations; these are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Orientation {
    /// `(l, w, h)`
    LWH = 0,
    /// `(l, h, w)`
    LHW = 1,
    /// `(w, l, h)`
    WLH = 2,
    /// `(w, h, l)`
    WHL = 3,
    /// `(h, l, w)`
    HLW = 4,
    /// `(h, w, l)`
    HWL = 5,
}

impl Orientation {
    /// All orientations in enumeration order (index 0 to 5).
    pub const ALL: [Orientation; 6] = [
        Orientation::LWH,
        Orientation::LHW,
        Orientation::WLH,
        Orientation::WHL,
        Orientation::HLW,
        Orientation::HWL,
    ];

    /// Returns the orientation index.
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Looks up an orientation by its index.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Applies this orientation to a dimension triple.
    ///
    /// # Examples
    /// ```
    /// use warehouse_packer::geometry::Orientation;
    ///
    /// assert_eq!(Orientation::LWH.apply((1.0, 2.0, 3.0)), (1.0, 2.0, 3.0));
    /// assert_eq!(Orientation::WHL.apply((1.0, 2.0, 3.0)), (2.0, 3.0, 1.0));
    /// ```
    #[inline]
    pub fn apply(self, dims: (f64, f64, f64)) -> (f64, f64, f64) {
        let (l, w, h) = dims;
        match self {
            Orientation::LWH => (l, w, h),
            Orientation::LHW => (l, h, w),
            Orientation::WLH => (w, l, h),
            Orientation::WHL => (w, h, l),
            Orientation::HLW => (h, l, w),
            Orientation::HWL => (h, w, l),
        }
    }
}

impl From<Orientation> for u8 {
    fn from(orientation: Orientation) -> Self {
        orientation.index()
    }
}

impl TryFrom<u8> for Orientation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Orientation::from_index(value)
            .ok_or_else(|| format!("Orientation index must be in 0..=5, got: {}", value))
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Rotates a dimension triple into the given orientation.
///
/// # Parameters
/// * `dims` - Source dimensions (length, width, height)
/// * `orientation` - Target orientation
///
/// # Returns
/// The permuted dimensions along X, Y, Z
#[inline]
pub fn rotate(dims: Vec3, orientation: Orientation) -> Vec3 {
    Vec3::from_tuple(orientation.apply(dims.as_tuple()))
}

/// Checks whether a box at `position` with size `dims` lies inside the container.
///
/// # Parameters
/// * `position` - Minimum corner of the box
/// * `dims` - Size of the box
/// * `container` - Container dimensions
///
/// # Returns
/// `true` if the position is non-negative and `position + dims` does not
/// exceed the container on any axis
#[inline]
pub fn fits(position: Vec3, dims: Vec3, container: Vec3) -> bool {
    BoundingBox::from_position_and_dims(position, dims).inside(&container)
}

/// Checks whether two axis-aligned boxes overlap.
///
/// Two boxes do NOT overlap if they are separated along at least one axis.
/// Boxes sharing a face are separated.
///
/// # Examples
/// ```
/// use warehouse_packer::geometry::overlaps;
/// use warehouse_packer::types::{BoundingBox, Vec3};
///
/// let a = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(5.0, 5.0, 5.0));
/// let b = BoundingBox::from_position_and_dims(Vec3::new(5.0, 0.0, 0.0), Vec3::new(5.0, 5.0, 5.0));
/// assert!(!overlaps(&a, &b));
/// ```
#[inline]
pub fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.intersects(b)
}
