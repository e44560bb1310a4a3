//! Common types for 3D geometry.
//!
//! All lengths handled here are in metres. Catalog values in millimetres are
//! converted before they reach these types (see `catalog`).

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tolerance for length comparisons in metres.
///
/// One nanometre: small enough to never hide a real overlap, large enough to
/// absorb rounding from repeated anchor alignment.
pub const EPSILON_LENGTH: f64 = 1e-9;

/// Scale factor from catalog millimetres to scene metres.
pub const MM_TO_M: f64 = 0.001;

/// Represents a 3D vector or point in space.
///
/// Axis convention: X runs along the cabinet width (left to right), Y is the
/// vertical axis and Z points out of the cabinet towards the door.
///
/// # Examples
/// ```
/// use cabinet_configurator::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let dimensions = Vec3::new(10.0, 20.0, 30.0);
/// let center = position + dimensions * 0.5;
/// assert_eq!(center, Vec3::new(6.0, 12.0, 18.0));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Creates from array format, as used by catalog anchor offsets.
    #[inline]
    pub const fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Calculates the volume (product of all components).
    ///
    /// Useful for dimension vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Length of the vector.
    #[inline]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<[f64; 3]> for Vec3 {
    #[inline]
    fn from(values: [f64; 3]) -> Self {
        Self::from_array(values)
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a new bounding box.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from position and dimensions.
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Creates a box of the given size centred on the origin.
    #[inline]
    pub fn centered(dims: Vec3) -> Self {
        Self::from_position_and_dims(dims * -0.5, dims)
    }

    /// Smallest box containing both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Returns the box moved by `delta`.
    #[inline]
    pub fn translated(&self, delta: Vec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn depth(&self) -> f64 {
        self.max.z - self.min.z
    }
}

/// Validation functions for catalog values.
pub mod validation {

    /// Validates a single dimension.
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a non-negative quantity such as power, heat or weight.
    pub fn validate_non_negative(value: f64, name: &str) -> Result<(), String> {
        if !value.is_finite() {
            return Err(format!("{} must be finite, got: {}", name, value));
        }
        if value < 0.0 {
            return Err(format!("{} must not be negative, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates all three dimensions of a 3D object.
    pub fn validate_dimensions_3d(dims: (f64, f64, f64)) -> Result<(), String> {
        validate_dimension(dims.0, "Width")?;
        validate_dimension(dims.1, "Height")?;
        validate_dimension(dims.2, "Depth")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.min(&Vec3::new(0.0, 5.0, 1.0)), Vec3::new(0.0, 2.0, 1.0));
    }

    #[test]
    fn test_bounding_box_union_and_translate() {
        let a = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(1.0, 1.0, 1.0));
        let b = BoundingBox::from_position_and_dims(
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        let union = a.union(&b);
        assert_eq!(union.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(union.max, Vec3::new(3.0, 1.0, 1.0));

        let moved = a.translated(Vec3::new(0.5, 0.0, 0.0));
        assert!((moved.min.x - 0.5).abs() < EPSILON_LENGTH);
        assert!((moved.width() - 1.0).abs() < EPSILON_LENGTH);
    }

    #[test]
    fn test_centered_box() {
        let bbox = BoundingBox::centered(Vec3::new(0.018, 0.08, 0.07));
        assert!((bbox.center().length()).abs() < EPSILON_LENGTH);
        assert!((bbox.min.x + 0.009).abs() < EPSILON_LENGTH);
    }

    #[test]
    fn test_validation_dimension() {
        assert!(validation::validate_dimension(10.0, "Width").is_ok());
        assert!(validation::validate_dimension(0.0, "Width").is_err());
        assert!(validation::validate_dimension(-1.0, "Width").is_err());
        assert!(validation::validate_dimension(f64::NAN, "Width").is_err());
        assert!(validation::validate_dimension(f64::INFINITY, "Width").is_err());
        assert!(validation::validate_non_negative(0.0, "Power").is_ok());
        assert!(validation::validate_non_negative(-0.5, "Power").is_err());
    }
}
