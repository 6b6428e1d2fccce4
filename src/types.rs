//! Common types and traits for planar and 3D geometry.
//!
//! The floor plane is spanned by `x` and `z`; `y` points up. Floor-plan
//! geometry works with [`Vec2`], scene objects with [`Vec3`] and
//! [`BoundingBox`].

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// A point or vector on the floor plane (x, z).
///
/// # Examples
/// ```
/// use space_planner::types::Vec2;
///
/// let a = Vec2::new(1.0, 2.0);
/// let b = Vec2::new(4.0, 6.0);
/// assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Vec2 {
    /// X coordinate (width axis)
    pub x: f64,
    /// Z coordinate (depth axis)
    pub z: f64,
}

impl Vec2 {
    /// Creates a new planar vector.
    #[inline]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Creates a unit vector pointing at `angle` radians, measured from +z towards +x.
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.sin(), angle.cos())
    }

    /// Euclidean length.
    #[inline]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    /// Calculates the Euclidean distance to another point.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.z * other.z
    }

    /// 2D cross product (z-component of the 3D cross product).
    #[inline]
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.z - self.z * other.x
    }

    /// Returns the unit vector, or zero for a degenerate vector.
    #[inline]
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len <= EPSILON_GENERAL {
            Self::zero()
        } else {
            Self::new(self.x / len, self.z / len)
        }
    }

    /// Counter-clockwise perpendicular.
    #[inline]
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.z, self.x)
    }

    /// Heading angle of this vector, measured from +z towards +x.
    #[inline]
    pub fn angle(&self) -> f64 {
        self.x.atan2(self.z)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.z * scalar)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.z)
    }
}

/// Represents a 3D vector or point in world space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    /// X coordinate (width axis)
    pub x: f64,
    /// Y coordinate (height axis)
    pub y: f64,
    /// Z coordinate (depth axis)
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

    /// Projects onto the floor plane.
    #[inline]
    pub const fn floor(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Calculates the Euclidean distance to another point.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Checks if all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
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

/// Trait for objects with a planar footprint.
pub trait Footprint {
    /// Center of the footprint on the floor plane.
    fn footprint_center(&self) -> Vec2;

    /// Width (x) and depth (z) of the footprint.
    fn footprint_size(&self) -> (f64, f64);

    fn footprint_area(&self) -> f64 {
        let (w, d) = self.footprint_size();
        w * d
    }

    /// Shortest distance from `point` to the footprint rectangle (0 inside).
    fn distance_to_point(&self, point: Vec2) -> f64 {
        let center = self.footprint_center();
        let (w, d) = self.footprint_size();
        let dx = ((point.x - center.x).abs() - w / 2.0).max(0.0);
        let dz = ((point.z - center.z).abs() - d / 2.0).max(0.0);
        (dx * dx + dz * dz).sqrt()
    }

    /// Gap between two footprint rectangles (0 when touching or overlapping).
    fn gap_to(&self, other: &dyn Footprint) -> f64 {
        let (ac, bc) = (self.footprint_center(), other.footprint_center());
        let ((aw, ad), (bw, bd)) = (self.footprint_size(), other.footprint_size());
        let dx = ((ac.x - bc.x).abs() - (aw + bw) / 2.0).max(0.0);
        let dz = ((ac.z - bc.z).abs() - (ad + bd) / 2.0).max(0.0);
        (dx * dx + dz * dz).sqrt()
    }
}

/// Axis-aligned rectangle on the floor plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rect {
    /// Corner with the smallest x and z
    pub min: Vec2,
    /// Corner with the largest x and z
    pub max: Vec2,
}

impl Rect {
    /// Creates a rectangle from its two extreme corners.
    #[inline]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Extent along x.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along z.
    #[inline]
    pub fn depth(&self) -> f64 {
        self.max.z - self.min.z
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.depth()
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// Checks whether `point` lies inside or on the border.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Corner loop in counter-clockwise order.
    pub fn corners(&self) -> Vec<Vec2> {
        vec![
            self.min,
            Vec2::new(self.max.x, self.min.z),
            self.max,
            Vec2::new(self.min.x, self.max.z),
        ]
    }
}

impl Footprint for Rect {
    fn footprint_center(&self) -> Vec2 {
        self.center()
    }

    fn footprint_size(&self) -> (f64, f64) {
        (self.width(), self.depth())
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB) in world space.
///
/// Used for collision detection and overlap calculation.
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

    /// Creates a bounding box centered at `center` with the given full size.
    #[inline]
    pub fn from_center_and_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Checks if two bounding boxes intersect.
    ///
    /// Implements the Separating Axis Theorem (SAT) for AABBs. Touching faces
    /// do not count as an intersection.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y
            || self.max.z <= other.min.z
            || other.max.z <= self.min.z)
    }

    /// Calculates the overlap length in one dimension.
    #[inline]
    fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
        (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
    }

    /// Calculates the overlap volume with another box.
    #[inline]
    pub fn overlap_volume(&self, other: &Self) -> f64 {
        let x = Self::overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x);
        let y = Self::overlap_1d(self.min.y, self.max.y, other.min.y, other.max.y);
        let z = Self::overlap_1d(self.min.z, self.max.z, other.min.z, other.max.z);
        x * y * z
    }

    /// Returns the box shifted by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
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

    /// Returns the dimensions (width, height, depth).
    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Checks that the box is finite and not inverted.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.max.x >= self.min.x
            && self.max.y >= self.min.y
            && self.max.z >= self.min.z
    }
}

impl Footprint for BoundingBox {
    fn footprint_center(&self) -> Vec2 {
        self.center().floor()
    }

    fn footprint_size(&self) -> (f64, f64) {
        let dims = self.dimensions();
        (dims.x, dims.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        assert_eq!(a + b, Vec2::new(5.0, 8.0));
        assert_eq!(b - a, Vec2::new(3.0, 4.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert!((a.distance_to(&b) - 5.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_vec2_angle_round_trips_direction() {
        let dir = Vec2::new(1.0, 1.0).normalized();
        let back = Vec2::from_angle(dir.angle());
        assert!((back.x - dir.x).abs() < EPSILON_GENERAL);
        assert!((back.z - dir.z).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_normalized_zero_vector_stays_zero() {
        assert_eq!(Vec2::zero().normalized(), Vec2::zero());
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::from_center_and_size(Vec3::zero(), Vec3::new(1.0, 1.0, 1.0));
        let b = BoundingBox::from_center_and_size(
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        );
        let touching = BoundingBox::from_center_and_size(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        assert!(a.intersects(&b));
        assert!(!a.intersects(&touching));
    }

    #[test]
    fn test_bounding_box_overlap_volume() {
        let a = BoundingBox::new(Vec3::zero(), Vec3::new(2.0, 2.0, 2.0));
        let b = BoundingBox::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        assert!((a.overlap_volume(&b) - 1.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_footprint_gap() {
        let a = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let b = Rect::new(Vec2::new(1.5, 0.0), Vec2::new(2.5, 1.0));
        assert!((a.gap_to(&b) - 0.5).abs() < EPSILON_GENERAL);
        assert!((a.distance_to_point(Vec2::new(0.5, 3.0)) - 2.0).abs() < EPSILON_GENERAL);
        assert_eq!(a.distance_to_point(Vec2::new(0.5, 0.5)), 0.0);
    }
}
