//! Furniture catalog: footprints, clearance envelopes and placement rules.
//!
//! Known furniture kinds live in a closed, enum-indexed table. Anything the
//! table does not know is never an error: a generic spec is returned, or one is
//! synthesized from the object's bounding box and then kept immutable for that
//! object id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::model::SceneObject;
use crate::types::BoundingBox;

/// Furniture kinds with built-in catalog entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FurnitureKind {
    Desk,
    Chair,
    Table,
    Sofa,
    SingleBed,
    DoubleBed,
    Bookcase,
    Tv,
}

impl FurnitureKind {
    pub const COUNT: usize = 8;

    pub const ALL: [FurnitureKind; Self::COUNT] = [
        FurnitureKind::Desk,
        FurnitureKind::Chair,
        FurnitureKind::Table,
        FurnitureKind::Sofa,
        FurnitureKind::SingleBed,
        FurnitureKind::DoubleBed,
        FurnitureKind::Bookcase,
        FurnitureKind::Tv,
    ];

    /// Position in the enum-indexed tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            FurnitureKind::Desk => "desk",
            FurnitureKind::Chair => "chair",
            FurnitureKind::Table => "table",
            FurnitureKind::Sofa => "sofa",
            FurnitureKind::SingleBed => "single_bed",
            FurnitureKind::DoubleBed => "double_bed",
            FurnitureKind::Bookcase => "bookcase",
            FurnitureKind::Tv => "tv",
        }
    }

    /// Classifies a free-form type tag such as `"Office Desk"` or `"queen_bed"`.
    ///
    /// Returns `None` for tags that match no known kind.
    ///
    /// # Examples
    /// ```
    /// use space_planner::catalog::FurnitureKind;
    ///
    /// assert_eq!(FurnitureKind::parse("Office Desk"), Some(FurnitureKind::Desk));
    /// assert_eq!(FurnitureKind::parse("bedside table"), Some(FurnitureKind::Table));
    /// assert_eq!(FurnitureKind::parse("aquarium"), None);
    /// ```
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let joined = words.join("");
        let has_word = |w: &str| words.contains(&w);

        if joined.contains("desk") {
            Some(FurnitureKind::Desk)
        } else if joined.contains("chair") || has_word("stool") {
            Some(FurnitureKind::Chair)
        } else if joined.contains("table") {
            Some(FurnitureKind::Table)
        } else if joined.contains("sofa") || joined.contains("couch") {
            Some(FurnitureKind::Sofa)
        } else if joined.contains("bookcase") || joined.contains("bookshelf") || joined.contains("shelf") {
            Some(FurnitureKind::Bookcase)
        } else if has_word("tv") || joined.contains("television") {
            Some(FurnitureKind::Tv)
        } else if joined.contains("doublebed")
            || joined.contains("queenbed")
            || joined.contains("kingbed")
        {
            Some(FurnitureKind::DoubleBed)
        } else if joined.contains("bed") {
            Some(FurnitureKind::SingleBed)
        } else {
            None
        }
    }
}

impl std::fmt::Display for FurnitureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Width, height and depth in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn footprint_area(&self) -> f64 {
        self.width * self.depth
    }

    /// Radius of the circle enclosing the footprint.
    pub fn footprint_radius(&self) -> f64 {
        0.5 * self.width.hypot(self.depth)
    }
}

/// Required free space around an object, per side, plus the access distance
/// a person needs in front of it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClearanceRequirements {
    pub front: f64,
    pub back: f64,
    pub left: f64,
    pub right: f64,
    pub access: f64,
}

impl ClearanceRequirements {
    pub const fn new(front: f64, back: f64, left: f64, right: f64, access: f64) -> Self {
        Self {
            front,
            back,
            left,
            right,
            access,
        }
    }

    /// Largest single-side requirement.
    pub fn max_side(&self) -> f64 {
        self.front.max(self.back).max(self.left).max(self.right)
    }
}

/// Direction an object prefers to face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FacingPreference {
    Wall,
    RoomCenter,
    Window,
    Entry,
    Any,
}

/// Side of an object a person uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessSide {
    Front,
    Back,
    Left,
    Right,
}

/// How strongly an object wants to stand against a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WallPreference {
    Required,
    Preferred,
    Any,
    Avoid,
}

/// An object that should be placed near this one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GroupingRule {
    pub with: FurnitureKind,
    pub max_distance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsagePattern {
    pub facing: FacingPreference,
    pub access_points: Vec<AccessSide>,
    pub grouping: Vec<GroupingRule>,
    pub wall_placement: WallPreference,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlacementConstraints {
    pub corner_ok: bool,
    pub needs_power: bool,
    pub needs_plumbing: bool,
    /// Minimum room area in square meters.
    pub min_room_size: f64,
    pub max_per_room: Option<u32>,
}

/// Full catalog entry for a furniture type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FurnitureSpec {
    /// `None` for generic or synthesized entries.
    pub kind: Option<FurnitureKind>,
    pub name: String,
    pub dimensions: Dimensions,
    pub clearance: ClearanceRequirements,
    pub usage: UsagePattern,
    pub constraints: PlacementConstraints,
}

fn group(with: FurnitureKind, max_distance: f64) -> GroupingRule {
    GroupingRule { with, max_distance }
}

/// Built-in catalog entry for a known kind.
pub fn builtin_spec(kind: FurnitureKind) -> FurnitureSpec {
    use FurnitureKind::*;

    let (dimensions, clearance, facing, grouping, wall, corner_ok, power, min_room, max_per_room) =
        match kind {
            Desk => (
                Dimensions::new(1.4, 0.75, 0.7),
                ClearanceRequirements::new(1.2, 0.1, 0.3, 0.3, 1.2),
                FacingPreference::Wall,
                vec![group(Chair, 1.0)],
                WallPreference::Preferred,
                true,
                true,
                4.0,
                None,
            ),
            Chair => (
                Dimensions::new(0.5, 0.9, 0.5),
                ClearanceRequirements::new(0.6, 0.3, 0.2, 0.2, 0.6),
                FacingPreference::Any,
                vec![group(Desk, 1.0), group(Table, 1.0)],
                WallPreference::Any,
                false,
                false,
                1.0,
                None,
            ),
            Table => (
                Dimensions::new(1.6, 0.75, 0.9),
                ClearanceRequirements::new(1.0, 1.0, 1.0, 1.0, 1.2),
                FacingPreference::Any,
                vec![group(Chair, 1.0)],
                WallPreference::Avoid,
                false,
                false,
                4.0,
                None,
            ),
            Sofa => (
                Dimensions::new(2.0, 0.85, 0.9),
                ClearanceRequirements::new(1.0, 0.05, 0.3, 0.3, 1.0),
                FacingPreference::RoomCenter,
                vec![group(Table, 1.5), group(Tv, 3.5)],
                WallPreference::Preferred,
                true,
                false,
                9.0,
                None,
            ),
            SingleBed => (
                Dimensions::new(1.0, 0.5, 2.0),
                ClearanceRequirements::new(0.8, 0.0, 0.6, 0.6, 0.9),
                FacingPreference::Entry,
                vec![],
                WallPreference::Required,
                true,
                false,
                7.0,
                None,
            ),
            DoubleBed => (
                Dimensions::new(1.6, 0.5, 2.1),
                ClearanceRequirements::new(1.0, 0.0, 0.7, 0.7, 1.0),
                FacingPreference::Entry,
                vec![],
                WallPreference::Required,
                true,
                false,
                10.0,
                Some(2),
            ),
            Bookcase => (
                Dimensions::new(0.9, 1.9, 0.35),
                ClearanceRequirements::new(0.9, 0.0, 0.1, 0.1, 0.8),
                FacingPreference::RoomCenter,
                vec![],
                WallPreference::Required,
                true,
                false,
                3.0,
                None,
            ),
            Tv => (
                Dimensions::new(1.2, 0.7, 0.3),
                ClearanceRequirements::new(2.0, 0.0, 0.2, 0.2, 0.5),
                FacingPreference::RoomCenter,
                vec![group(Sofa, 3.5)],
                WallPreference::Required,
                false,
                true,
                6.0,
                Some(2),
            ),
        };

    let access_points = match kind {
        Table => vec![
            AccessSide::Front,
            AccessSide::Back,
            AccessSide::Left,
            AccessSide::Right,
        ],
        SingleBed | DoubleBed => vec![AccessSide::Left, AccessSide::Right],
        _ => vec![AccessSide::Front],
    };

    FurnitureSpec {
        kind: Some(kind),
        name: kind.code().to_string(),
        dimensions,
        clearance,
        usage: UsagePattern {
            facing,
            access_points,
            grouping,
            wall_placement: wall,
        },
        constraints: PlacementConstraints {
            corner_ok,
            needs_power: power,
            needs_plumbing: false,
            min_room_size: min_room,
            max_per_room,
        },
    }
}

/// Catalog entry used for tags the table does not know and no bounds are available for.
pub fn generic_spec(name: &str) -> FurnitureSpec {
    FurnitureSpec {
        kind: None,
        name: name.to_string(),
        dimensions: Dimensions::new(0.8, 0.8, 0.8),
        clearance: ClearanceRequirements::new(0.6, 0.3, 0.3, 0.3, 0.8),
        usage: UsagePattern {
            facing: FacingPreference::Any,
            access_points: vec![AccessSide::Front],
            grouping: vec![],
            wall_placement: WallPreference::Any,
        },
        constraints: PlacementConstraints {
            corner_ok: true,
            needs_power: false,
            needs_plumbing: false,
            min_room_size: 1.0,
            max_per_room: None,
        },
    }
}

/// Spec for a type tag without a catalog instance.
pub fn spec_for_type(object_type: &str) -> FurnitureSpec {
    match FurnitureKind::parse(object_type) {
        Some(kind) => builtin_spec(kind),
        None => generic_spec(object_type),
    }
}

/// Derives a spec from a bounding box when the type tag is unknown.
///
/// Larger footprints get deeper front clearance, tall objects go against a wall
/// and small ones may sit in corners.
pub fn synthesize_from_bounds(name: &str, bounds: &BoundingBox) -> FurnitureSpec {
    let size = bounds.dimensions();
    let (width, height, depth) = (size.x.max(0.1), size.y.max(0.1), size.z.max(0.1));
    let longest = width.max(depth);
    let footprint = width * depth;

    let front = (0.5 * longest).clamp(0.6, 1.2);
    let back = if height > 1.5 { 0.0 } else { 0.2 };
    let side = (0.25 * longest).clamp(0.2, 0.5);
    let tall = height > 1.2;

    FurnitureSpec {
        kind: None,
        name: name.to_string(),
        dimensions: Dimensions::new(width, height, depth),
        clearance: ClearanceRequirements::new(front, back, side, side, front.max(0.8)),
        usage: UsagePattern {
            facing: if tall {
                FacingPreference::RoomCenter
            } else {
                FacingPreference::Any
            },
            access_points: vec![AccessSide::Front],
            grouping: vec![],
            wall_placement: if tall {
                WallPreference::Preferred
            } else {
                WallPreference::Any
            },
        },
        constraints: PlacementConstraints {
            corner_ok: footprint < 0.5,
            needs_power: false,
            needs_plumbing: false,
            min_room_size: (footprint * 4.0).max(1.0),
            max_per_room: None,
        },
    }
}

/// Catalog of furniture specs.
///
/// Built-in entries are seeded at construction. Specs synthesized for unknown
/// objects are cached per object id and never change afterwards.
#[derive(Clone, Debug)]
pub struct FurnitureCatalog {
    builtin: [FurnitureSpec; FurnitureKind::COUNT],
    synthesized: HashMap<String, FurnitureSpec>,
}

impl Default for FurnitureCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FurnitureCatalog {
    pub fn new() -> Self {
        Self {
            builtin: FurnitureKind::ALL.map(builtin_spec),
            synthesized: HashMap::new(),
        }
    }

    /// Built-in entry for a known kind.
    pub fn spec(&self, kind: FurnitureKind) -> &FurnitureSpec {
        &self.builtin[kind.index()]
    }

    pub fn builtin_specs(&self) -> &[FurnitureSpec] {
        &self.builtin
    }

    /// Spec for a type tag; unknown tags fall back to the generic spec.
    pub fn resolve_type(&self, object_type: &str) -> FurnitureSpec {
        match FurnitureKind::parse(object_type) {
            Some(kind) => self.spec(kind).clone(),
            None => generic_spec(object_type),
        }
    }

    /// Spec for a concrete scene object.
    ///
    /// Unknown types are synthesized from the object's bounds on first use.
    pub fn spec_for_object(&mut self, object: &SceneObject) -> &FurnitureSpec {
        if let Some(kind) = FurnitureKind::parse(&object.object_type) {
            return &self.builtin[kind.index()];
        }
        self.synthesized
            .entry(object.id.clone())
            .or_insert_with(|| {
                debug!(
                    object_id = %object.id,
                    object_type = %object.object_type,
                    "Synthesizing furniture spec from bounding box"
                );
                synthesize_from_bounds(&object.object_type, &object.bounds)
            })
    }

    /// Number of cached synthesized specs.
    pub fn synthesized_count(&self) -> usize {
        self.synthesized.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    #[test]
    fn parses_common_tags() {
        assert_eq!(FurnitureKind::parse("Desk"), Some(FurnitureKind::Desk));
        assert_eq!(FurnitureKind::parse("office_chair"), Some(FurnitureKind::Chair));
        assert_eq!(FurnitureKind::parse("Dining Table"), Some(FurnitureKind::Table));
        assert_eq!(FurnitureKind::parse("couch"), Some(FurnitureKind::Sofa));
        assert_eq!(FurnitureKind::parse("Double Bed"), Some(FurnitureKind::DoubleBed));
        assert_eq!(FurnitureKind::parse("bed"), Some(FurnitureKind::SingleBed));
        assert_eq!(FurnitureKind::parse("book-shelf"), Some(FurnitureKind::Bookcase));
        assert_eq!(FurnitureKind::parse("TV"), Some(FurnitureKind::Tv));
        assert_eq!(FurnitureKind::parse("tvstand"), None);
        assert_eq!(FurnitureKind::parse("plant"), None);
    }

    #[test]
    fn table_is_indexed_by_kind() {
        let catalog = FurnitureCatalog::new();
        for kind in FurnitureKind::ALL {
            assert_eq!(catalog.spec(kind).kind, Some(kind));
        }
        assert!((catalog.spec(FurnitureKind::Desk).clearance.access - 1.2).abs() < 1e-9);
        assert!((catalog.spec(FurnitureKind::Table).constraints.min_room_size - 4.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_type_falls_back_to_generic() {
        let catalog = FurnitureCatalog::new();
        let spec = catalog.resolve_type("aquarium");
        assert_eq!(spec.kind, None);
        assert_eq!(spec.name, "aquarium");
    }

    #[test]
    fn synthesized_spec_is_stable_per_object_id() {
        let mut catalog = FurnitureCatalog::new();
        let object = SceneObject::new(
            "piano-1",
            "grand piano",
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(1.5, 1.0, 2.0),
        );

        let first = catalog.spec_for_object(&object).clone();
        assert_eq!(first.kind, None);
        assert!((first.dimensions.depth - 2.0).abs() < 1e-9);
        assert!((first.clearance.front - 1.0).abs() < 1e-9);

        let mut resized = object.clone();
        resized.bounds = BoundingBox::from_center_and_size(
            Vec3::new(2.0, 0.5, 2.0),
            Vec3::new(0.3, 0.3, 0.3),
        );
        let second = catalog.spec_for_object(&resized).clone();
        assert_eq!(first, second);
        assert_eq!(catalog.synthesized_count(), 1);
    }

    #[test]
    fn tall_unknown_objects_prefer_walls() {
        let bounds = BoundingBox::from_center_and_size(Vec3::zero(), Vec3::new(0.6, 2.0, 0.4));
        let spec = synthesize_from_bounds("wardrobe-ish", &bounds);
        assert_eq!(spec.usage.wall_placement, WallPreference::Preferred);
        assert!(spec.constraints.corner_ok);
        assert_eq!(spec.clearance.back, 0.0);
    }
}
