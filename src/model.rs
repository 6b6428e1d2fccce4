//! Data models for rooms and scene snapshots.
//!
//! This module defines the input structures consumed by the planners:
//! - `FloorPolygon`: validated floor boundary of a room
//! - `RoomInput`: raw room description with door/window/utility metadata
//! - `SceneObject`: snapshot of an object placed in the scene
//! - `Scene`: an id-indexed collection of scene objects

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{PlannerError, PlannerResult};
use crate::geometry;
use crate::types::{BoundingBox, EPSILON_GENERAL, Footprint, Rect, Vec2, Vec3};

/// Fixed ceiling height assumed for every room, in meters.
pub const DEFAULT_CEILING_HEIGHT: f64 = 2.5;

/// Helper function to validate a single floor vertex.
fn validate_vertex(index: usize, vertex: &Vec2) -> PlannerResult<()> {
    if !vertex.is_finite() {
        return Err(PlannerError::InvalidInput(format!(
            "floor vertex {} is not finite: ({}, {})",
            index, vertex.x, vertex.z
        )));
    }
    Ok(())
}

/// Helper function to validate a positive length.
fn validate_length(value: f64, name: &str) -> PlannerResult<()> {
    if value <= 0.0 || !value.is_finite() {
        return Err(PlannerError::InvalidInput(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Ordered, simple vertex loop bounding a room's interior, in meters.
///
/// Can only be constructed through [`FloorPolygon::new`], so every instance
/// has at least three finite vertices and a non-zero area.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FloorPolygon {
    vertices: Vec<Vec2>,
}

impl FloorPolygon {
    /// Creates a floor polygon after validating it.
    ///
    /// # Examples
    /// ```
    /// use space_planner::model::FloorPolygon;
    /// use space_planner::types::Vec2;
    ///
    /// let ok = FloorPolygon::new(vec![
    ///     Vec2::new(0.0, 0.0),
    ///     Vec2::new(4.0, 0.0),
    ///     Vec2::new(4.0, 3.0),
    /// ]);
    /// assert!(ok.is_ok());
    ///
    /// let degenerate = FloorPolygon::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]);
    /// assert!(degenerate.is_err());
    /// ```
    pub fn new(vertices: Vec<Vec2>) -> PlannerResult<Self> {
        if vertices.len() < 3 {
            return Err(PlannerError::InvalidInput(format!(
                "floor polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        for (index, vertex) in vertices.iter().enumerate() {
            validate_vertex(index, vertex)?;
        }
        if geometry::polygon_area(&vertices) <= EPSILON_GENERAL {
            return Err(PlannerError::InvalidInput(
                "floor polygon has zero area".to_string(),
            ));
        }
        Ok(Self { vertices })
    }

    /// Convenience constructor for an axis-aligned rectangular room at the origin.
    pub fn rectangle(width: f64, depth: f64) -> PlannerResult<Self> {
        validate_length(width, "Room width")?;
        validate_length(depth, "Room depth")?;
        Self::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(width, 0.0),
            Vec2::new(width, depth),
            Vec2::new(0.0, depth),
        ])
    }

    /// Returns the validated vertex loop.
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Enclosed area in square meters, independent of winding.
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.vertices)
    }

    /// Total wall length in meters.
    pub fn perimeter(&self) -> f64 {
        geometry::polygon_perimeter(&self.vertices)
    }

    /// Area-weighted center of the floor.
    pub fn centroid(&self) -> Vec2 {
        geometry::polygon_centroid(&self.vertices)
    }

    /// Axis-aligned bounding rectangle.
    pub fn bounds(&self) -> Rect {
        geometry::bounding_rect(&self.vertices)
    }

    /// `true` when the vertex loop runs counter-clockwise.
    pub fn is_ccw(&self) -> bool {
        geometry::signed_area(&self.vertices) > 0.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        geometry::point_in_polygon(point, &self.vertices)
    }

    /// Distance from `point` to the nearest wall.
    pub fn distance_to_wall(&self, point: Vec2) -> f64 {
        geometry::distance_to_boundary(point, &self.vertices)
    }

    /// Iterates over `(start, end)` of every wall edge.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        geometry::edges(&self.vertices)
    }
}

/// Kind of wall opening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OpeningKind {
    Door,
    Window,
}

/// Door or window metadata attached to a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Opening {
    pub kind: OpeningKind,
    /// Center of the opening, normally on a floor edge.
    pub position: Vec2,
    /// Clear width in meters.
    pub width: f64,
    /// Marks a door as a required escape route.
    #[serde(default)]
    pub fire_exit: bool,
}

impl Opening {
    /// Creates an ordinary door.
    pub fn door(position: Vec2, width: f64) -> Self {
        Self {
            kind: OpeningKind::Door,
            position,
            width,
            fire_exit: false,
        }
    }

    /// Creates a window.
    pub fn window(position: Vec2, width: f64) -> Self {
        Self {
            kind: OpeningKind::Window,
            position,
            width,
            fire_exit: false,
        }
    }
}

/// Kind of building utility available on the floor plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    Power,
    Plumbing,
    Hvac,
}

/// A utility point (outlet, drain, vent) on the floor plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UtilityPoint {
    pub kind: UtilityKind,
    pub position: Vec2,
}

/// Raw room description as delivered by the editor.
///
/// The floor vertices are validated when the room is analyzed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomInput {
    /// Floor vertices in meters, in loop order.
    pub floor: Vec<Vec2>,
    #[serde(default)]
    pub openings: Vec<Opening>,
    #[serde(default)]
    pub utilities: Vec<UtilityPoint>,
    /// Indices of floor edges that are shared with neighboring rooms.
    #[serde(default)]
    pub interior_edges: Vec<usize>,
}

impl RoomInput {
    /// Creates a room without openings or utilities.
    pub fn new(floor: Vec<Vec2>) -> Self {
        Self {
            floor,
            ..Self::default()
        }
    }

    /// Adds a door or window.
    pub fn with_opening(mut self, opening: Opening) -> Self {
        self.openings.push(opening);
        self
    }

    pub fn with_utility(mut self, utility: UtilityPoint) -> Self {
        self.utilities.push(utility);
        self
    }

    /// Validates the floor vertices into a [`FloorPolygon`].
    pub fn floor_polygon(&self) -> PlannerResult<FloorPolygon> {
        FloorPolygon::new(self.floor.clone())
    }

    /// Iterates over the door openings.
    pub fn doors(&self) -> impl Iterator<Item = &Opening> {
        self.openings
            .iter()
            .filter(|o| o.kind == OpeningKind::Door)
    }

    /// `true` when at least one window is present.
    pub fn has_window(&self) -> bool {
        self.openings.iter().any(|o| o.kind == OpeningKind::Window)
    }
}

fn default_true() -> bool {
    true
}

/// Snapshot of an object in the scene.
///
/// # Fields
/// * `id` - Stable object id
/// * `object_type` - Free-form type tag ("desk", "Office Chair", ...)
/// * `position` - World position of the object's pivot
/// * `bounds` - World-space axis-aligned bounding box
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SceneObject {
    pub id: String,
    pub object_type: String,
    pub position: Vec3,
    pub bounds: BoundingBox,
    /// Hidden objects are ignored by collision tests.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Objects that cannot be picked are ignored by collision tests.
    #[serde(default = "default_true")]
    pub pickable: bool,
}

impl SceneObject {
    /// Creates a visible, pickable object whose box is centered on `position`
    /// horizontally and rests on it vertically.
    pub fn new(id: impl Into<String>, object_type: impl Into<String>, position: Vec3, size: Vec3) -> Self {
        let center = Vec3::new(position.x, position.y + size.y / 2.0, position.z);
        Self {
            id: id.into(),
            object_type: object_type.into(),
            position,
            bounds: BoundingBox::from_center_and_size(center, size),
            visible: true,
            pickable: true,
        }
    }

    /// Validates position and bounds.
    pub fn validate(&self) -> PlannerResult<()> {
        if self.id.trim().is_empty() {
            return Err(PlannerError::InvalidInput(
                "scene object id must not be empty".to_string(),
            ));
        }
        if !self.position.is_finite() || !self.bounds.is_valid() {
            return Err(PlannerError::InvalidInput(format!(
                "scene object '{}' has an invalid position or bounding box",
                self.id
            )));
        }
        Ok(())
    }

    /// Whether the object takes part in collision tests.
    pub fn is_collidable(&self) -> bool {
        self.visible && self.pickable
    }
}

impl Footprint for SceneObject {
    fn footprint_center(&self) -> Vec2 {
        self.bounds.footprint_center()
    }

    fn footprint_size(&self) -> (f64, f64) {
        self.bounds.footprint_size()
    }
}

/// In-memory scene: objects indexed by id, insertion order preserved.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    index: HashMap<String, usize>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a scene from a snapshot; later duplicates of an id replace earlier ones.
    pub fn from_objects(objects: impl IntoIterator<Item = SceneObject>) -> Self {
        let mut scene = Self::new();
        for object in objects {
            scene.insert(object);
        }
        scene
    }

    /// Adds an object, replacing any object with the same id in place.
    pub fn insert(&mut self, object: SceneObject) {
        match self.index.get(&object.id) {
            Some(&slot) => self.objects[slot] = object,
            None => {
                self.index.insert(object.id.clone(), self.objects.len());
                self.objects.push(object);
            }
        }
    }

    /// Looks up an object by id.
    pub fn get(&self, id: &str) -> Option<&SceneObject> {
        self.index.get(id).map(|&slot| &self.objects[slot])
    }

    /// All objects in insertion order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Moves an object and its bounding box to `position`.
    ///
    /// Returns `false` for unknown ids. Callers holding a collision cache must
    /// invalidate the object's entry afterwards.
    pub fn move_object(&mut self, id: &str, position: Vec3) -> bool {
        let Some(&slot) = self.index.get(id) else {
            return false;
        };
        let object = &mut self.objects[slot];
        let offset = position - object.position;
        object.position = position;
        object.bounds = object.bounds.translated(offset);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_polygon_rejects_degenerate_input() {
        assert!(matches!(
            FloorPolygon::new(vec![]),
            Err(PlannerError::InvalidInput(_))
        ));
        assert!(FloorPolygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
        ])
        .is_err());
        assert!(FloorPolygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(f64::NAN, 0.0),
            Vec2::new(1.0, 1.0),
        ])
        .is_err());
        assert!(FloorPolygon::rectangle(-1.0, 2.0).is_err());
    }

    #[test]
    fn test_floor_polygon_metrics() {
        let floor = FloorPolygon::rectangle(5.0, 4.0).unwrap();
        assert!((floor.area() - 20.0).abs() < EPSILON_GENERAL);
        assert!((floor.perimeter() - 18.0).abs() < EPSILON_GENERAL);
        assert!(floor.is_ccw());
        assert!(floor.contains(Vec2::new(2.5, 2.0)));
        assert!((floor.distance_to_wall(Vec2::new(2.5, 1.0)) - 1.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_scene_move_object_translates_bounds() {
        let mut scene = Scene::from_objects([SceneObject::new(
            "a",
            "desk",
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.8, 0.5),
        )]);

        assert!(scene.move_object("a", Vec3::new(3.0, 0.0, 1.0)));
        let moved = scene.get("a").unwrap();
        assert!((moved.bounds.center().x - 3.0).abs() < EPSILON_GENERAL);
        assert!(!scene.move_object("missing", Vec3::zero()));
    }

    #[test]
    fn test_scene_object_deserializes_with_defaults() {
        let json = r#"{
            "id": "chair-1",
            "object_type": "chair",
            "position": {"x": 1.0, "y": 0.0, "z": 2.0},
            "bounds": {"min": {"x": 0.75, "y": 0.0, "z": 1.75}, "max": {"x": 1.25, "y": 0.9, "z": 2.25}}
        }"#;
        let object: SceneObject = serde_json::from_str(json).expect("valid scene object");
        assert!(object.visible && object.pickable);
        assert!(object.validate().is_ok());
    }
}
