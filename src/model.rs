//! Data models for the container packing engine.
//!
//! This module defines the fundamental data structures:
//! - `Item`: A rectangular item to be packed with dimensions and weight
//! - `ContainerSpec`: The fixed-size container of a packing run
//! - `PackingLimits`: Weight cutoff and volume buffer of a packing run
//! - `PlacedItem`: An item in its chosen orientation at its anchor position
//!
//! All constructors validate their input; the engine assumes well-formed data.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::geometry::Orientation;
use crate::types::{BoundingBox, Dimensional, Positioned, Vec3, Weighted};

/// Validation error for item, container and limit data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_dims(dims: (f64, f64, f64), prefix: &str) -> Result<(), ValidationError> {
    validate_dimension(dims.0, &format!("{prefix}length"))?;
    validate_dimension(dims.1, &format!("{prefix}width"))?;
    validate_dimension(dims.2, &format!("{prefix}height"))?;
    Ok(())
}

/// Weights may be zero but never negative.
fn validate_weight_value(value: f64, name: &str) -> Result<(), ValidationError> {
    if value < 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must be non-negative, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Represents a rectangular item to be packed.
///
/// # Fields
/// * `index` - Position of the item in the caller's input sequence
/// * `dims` - Dimensions (length, width, height)
/// * `weight` - Weight of the item
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub index: usize,
    pub dims: (f64, f64, f64),
    pub weight: f64,
}

impl Item {
    /// Creates a new item with validation.
    ///
    /// # Examples
    /// ```
    /// use warehouse_packer::model::Item;
    ///
    /// assert!(Item::new(0, (10.0, 20.0, 30.0), 5.0).is_ok());
    /// assert!(Item::new(0, (10.0, 20.0, 30.0), 0.0).is_ok());
    /// assert!(Item::new(1, (-10.0, 20.0, 30.0), 5.0).is_err());
    /// assert!(Item::new(2, (10.0, 20.0, 30.0), -1.0).is_err());
    /// ```
    pub fn new(index: usize, dims: (f64, f64, f64), weight: f64) -> Result<Self, ValidationError> {
        validate_dims(dims, "Item ")?;
        validate_weight_value(weight, "Item weight")?;
        Ok(Self {
            index,
            dims,
            weight,
        })
    }

    /// Calculates the volume of the item as length × width × height.
    pub fn volume(&self) -> f64 {
        let (l, w, h) = self.dims;
        l * w * h
    }

    /// Converts the dimensions to a Vec3.
    #[inline]
    pub fn dims_as_vec3(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Vec3 {
        self.dims_as_vec3()
    }
}

impl Weighted for Item {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// Unvalidated item as supplied by a caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "length": 30.0, "width": 40.0, "height": 20.0, "weight": 5.0 }))]
pub struct ItemSpec {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
}

impl ItemSpec {
    /// Validates this entry into an item carrying its input index.
    pub fn validate(&self, index: usize) -> Result<Item, ValidationError> {
        Item::new(index, (self.length, self.width, self.height), self.weight).map_err(|err| {
            match err {
                ValidationError::InvalidDimension(msg) => {
                    ValidationError::InvalidDimension(format!("item #{index}: {msg}"))
                }
                ValidationError::InvalidWeight(msg) => {
                    ValidationError::InvalidWeight(format!("item #{index}: {msg}"))
                }
                other => other,
            }
        })
    }

    /// Validates a whole sequence, failing on the first malformed entry.
    pub fn validate_all(specs: &[ItemSpec]) -> Result<Vec<Item>, ValidationError> {
        specs
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.validate(index))
            .collect()
    }
}

/// The fixed-size container of one packing run.
///
/// Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerSpec {
    dims: Vec3,
}

impl ContainerSpec {
    /// Creates a container after validating that all dimensions are positive.
    pub fn new(dims: (f64, f64, f64)) -> Result<Self, ValidationError> {
        validate_dims(dims, "Container ")?;
        Ok(Self {
            dims: Vec3::from_tuple(dims),
        })
    }

    pub fn length(&self) -> f64 {
        self.dims.x
    }

    pub fn width(&self) -> f64 {
        self.dims.y
    }

    pub fn height(&self) -> f64 {
        self.dims.z
    }

    /// Volume of the container.
    pub fn volume(&self) -> f64 {
        self.dims.volume()
    }
}

impl Dimensional for ContainerSpec {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// Caps of one packing run.
///
/// # Fields
/// * `weight_cutoff` - Maximum cumulative weight (>= 0)
/// * `buffer_percentage` - Usable share of the container volume, in (0, 100]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackingLimits {
    weight_cutoff: f64,
    buffer_percentage: f64,
}

impl PackingLimits {
    /// Creates validated packing limits.
    ///
    /// # Examples
    /// ```
    /// use warehouse_packer::model::PackingLimits;
    ///
    /// let limits = PackingLimits::new(100.0, 90.0).unwrap();
    /// assert!((limits.buffer_fraction() - 0.9).abs() < 1e-12);
    /// assert!(PackingLimits::new(100.0, 0.0).is_err());
    /// assert!(PackingLimits::new(100.0, 100.5).is_err());
    /// ```
    pub fn new(weight_cutoff: f64, buffer_percentage: f64) -> Result<Self, ValidationError> {
        validate_weight_value(weight_cutoff, "Weight cutoff")?;
        if !(buffer_percentage > 0.0 && buffer_percentage <= 100.0) {
            return Err(ValidationError::InvalidConfiguration(format!(
                "Buffer percentage must be in (0, 100], got: {}",
                buffer_percentage
            )));
        }
        Ok(Self {
            weight_cutoff,
            buffer_percentage,
        })
    }

    pub fn weight_cutoff(&self) -> f64 {
        self.weight_cutoff
    }

    pub fn buffer_percentage(&self) -> f64 {
        self.buffer_percentage
    }

    /// Buffer percentage as a fraction in (0, 1].
    pub fn buffer_fraction(&self) -> f64 {
        self.buffer_percentage / 100.0
    }

    /// Largest cumulative item volume the packer may place in `container`.
    pub fn max_fillable_volume(&self, container: &ContainerSpec) -> f64 {
        container.volume() * self.buffer_fraction()
    }
}

/// An item committed to the container.
///
/// # Fields
/// * `item_index` - Input index of the source item
/// * `orientation` - Orientation the source dimensions were rotated with
/// * `position` - Minimum corner (x, y, z) in the container
/// * `dims` - Rotated dimensions (length, width, height) along X, Y, Z
/// * `weight` - Weight of the source item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlacedItem {
    pub item_index: usize,
    #[schema(value_type = u8, example = 0)]
    pub orientation: Orientation,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub position: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([30.0, 40.0, 20.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
}

impl PlacedItem {
    /// Calculates the bounding box of the placed item.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position(), self.dimensions())
    }

    /// Far corner of the placed item (position + dims).
    #[inline]
    pub fn far_corner(&self) -> Vec3 {
        self.bounding_box().max
    }
}

impl Positioned for PlacedItem {
    fn position(&self) -> Vec3 {
        Vec3::from_tuple(self.position)
    }
}

impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

impl Weighted for PlacedItem {
    fn weight(&self) -> f64 {
        self.weight
    }
}
