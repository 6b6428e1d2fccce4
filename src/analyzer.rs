//! Room analysis: walls, constraints, placement zones and access paths.
//!
//! [`analyze_room`] is a pure function of its inputs. The floor's bounding box
//! is sampled on a fixed grid, every sample is scored against the room's
//! constraints, and contiguous samples of the same suitability class are
//! grouped into [`PlacementZone`]s.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::catalog::{FurnitureCatalog, FurnitureKind};
use crate::error::PlannerResult;
use crate::geometry;
use crate::model::{DEFAULT_CEILING_HEIGHT, OpeningKind, RoomInput, SceneObject};
use crate::types::{EPSILON_GENERAL, Footprint, Rect, Vec2};

/// Step of the zone grid in meters.
pub const ZONE_GRID_STEP: f64 = 0.5;

/// Zones with fewer cells are dropped.
pub const MIN_ZONE_CELLS: usize = 4;

/// Width and clearance of generated access paths.
pub const PATH_WIDTH: f64 = 0.9;

const WALL_CLEARANCE: f64 = 0.3;
const WALL_DEPTH: f64 = 0.1;
const DOOR_CLEARANCE: f64 = 0.9;
const WINDOW_CLEARANCE: f64 = 0.5;
const UTILITY_CLEARANCE: f64 = 0.3;
const UTILITY_SIZE: f64 = 0.2;
const OPENING_DEPTH: f64 = 0.1;
const SYNTHETIC_DOOR_WIDTH: f64 = 0.9;
const WALL_ADJACENT_DISTANCE: f64 = 1.0;
const WALL_BOOST: f64 = 1.1;
const ACCESS_AREA_SHARE: f64 = 0.2;

/// Clearance kept around an existing object of the given kind.
pub fn existing_object_clearance(kind: Option<FurnitureKind>) -> f64 {
    match kind {
        Some(FurnitureKind::Desk) => 1.2,
        Some(FurnitureKind::Chair) => 0.8,
        Some(FurnitureKind::Table) => 1.0,
        Some(FurnitureKind::Sofa) => 1.0,
        Some(FurnitureKind::SingleBed) => 0.8,
        Some(FurnitureKind::DoubleBed) => 1.0,
        Some(FurnitureKind::Bookcase) => 0.9,
        Some(FurnitureKind::Tv) => 0.5,
        None => 0.6,
    }
}

/// Whether a wall faces outside or another room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WallType {
    Exterior,
    /// Shared with a neighboring room.
    Interior,
}

/// One edge of the floor polygon.
///
/// # Fields
/// * `index` - Position of the edge in the vertex loop
/// * `start`, `end` - Edge endpoints in meters
/// * `length` - Edge length in meters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WallSegment {
    pub index: usize,
    pub start: Vec2,
    pub end: Vec2,
    pub length: f64,
    /// Unit normal pointing into the room.
    pub normal: Vec2,
    pub wall_type: WallType,
}

/// What a [`Constraint`] stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Wall,
    Door,
    Window,
    ExistingObject,
    Utility,
}

/// Constraint priority, most important first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Line segment on the floor plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Span {
    pub start: Vec2,
    pub end: Vec2,
}

/// Typed obstacle in a room.
///
/// Wall constraints carry their edge as `span` and are measured against it;
/// everything else is measured against its axis-aligned footprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Constraint {
    /// `wall-N`, `door-N`, `door-entry`, `window-N`, `object-<id>` or `utility-N`.
    pub id: String,
    pub kind: ConstraintKind,
    /// Footprint center on the floor plane.
    pub position: Vec2,
    pub width: f64,
    pub depth: f64,
    #[serde(default)]
    pub span: Option<Span>,
    /// Free distance kept around the obstacle, in meters.
    pub clearance_required: f64,
    /// Nothing may be placed inside the clearance.
    pub blocks_placement: bool,
    /// Paths passing through the clearance count as blocked.
    pub affects_access: bool,
    pub priority: Priority,
}

impl Constraint {
    fn wall(segment: &WallSegment) -> Self {
        Self {
            id: format!("wall-{}", segment.index),
            kind: ConstraintKind::Wall,
            position: (segment.start + segment.end) * 0.5,
            width: segment.length,
            depth: WALL_DEPTH,
            span: Some(Span {
                start: segment.start,
                end: segment.end,
            }),
            clearance_required: WALL_CLEARANCE,
            blocks_placement: true,
            affects_access: false,
            priority: Priority::Critical,
        }
    }

    /// Distance from `point` to the obstacle itself.
    pub fn distance_to(&self, point: Vec2) -> f64 {
        match self.span {
            Some(span) => geometry::distance_point_to_segment(point, span.start, span.end),
            None => self.distance_to_point(point),
        }
    }

    /// Distance from the segment `a`–`b` to the obstacle.
    pub fn distance_to_segment(&self, a: Vec2, b: Vec2) -> f64 {
        match self.span {
            Some(span) => geometry::segment_to_segment_distance(a, b, span.start, span.end),
            None => {
                let reach = 0.5 * self.width.max(self.depth);
                (geometry::distance_point_to_segment(self.position, a, b) - reach).max(0.0)
            }
        }
    }
}

impl Footprint for Constraint {
    fn footprint_center(&self) -> Vec2 {
        self.position
    }

    fn footprint_size(&self) -> (f64, f64) {
        (self.width, self.depth)
    }
}

/// Suitability class of a placement zone, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZoneClass {
    Optimal,
    Good,
    Acceptable,
    Poor,
    Restricted,
}

impl ZoneClass {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ZoneClass::Optimal
        } else if score >= 0.6 {
            ZoneClass::Good
        } else if score >= 0.4 {
            ZoneClass::Acceptable
        } else if score > 0.0 {
            ZoneClass::Poor
        } else {
            ZoneClass::Restricted
        }
    }
}

/// Contiguous group of grid cells sharing one suitability class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlacementZone {
    pub id: String,
    pub class: ZoneClass,
    /// Bounding rectangle of the zone's cells.
    pub polygon: Vec<Vec2>,
    pub center: Vec2,
    /// Cell count times the cell area, in square meters.
    pub area: f64,
    pub cell_count: usize,
    /// Closeness of the center to the nearest door, 0–1; 0 when restricted.
    pub accessibility_score: f64,
    /// Blend of the mean cell score and the mean wall distance, 0–1.
    pub clearance_score: f64,
    pub nearest_wall_distance: f64,
    /// Furniture kinds suited to the zone class, size and wall distance.
    pub recommended_types: Vec<FurnitureKind>,
}

impl PlacementZone {
    pub fn rect(&self) -> Rect {
        geometry::bounding_rect(&self.polygon)
    }

    pub fn recommends(&self, kind: FurnitureKind) -> bool {
        self.recommended_types.contains(&kind)
    }
}

/// Straight walkway from an entry to a zone center.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccessibilityPath {
    pub id: String,
    /// Id of the originating door constraint.
    pub from: String,
    /// Id of the target zone.
    pub to_zone: String,
    pub start: Vec2,
    pub end: Vec2,
    pub width: f64,
    pub clearance: f64,
    /// Ids of constraints whose clearance the path crosses.
    pub blocked_by: Vec<String>,
}

impl AccessibilityPath {
    pub fn is_clear(&self) -> bool {
        self.blocked_by.is_empty()
    }
}

/// Area breakdown of an analyzed room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpaceUtilization {
    /// Floor polygon area in square meters.
    pub total_area: f64,
    /// Combined area of all zones that are not restricted.
    pub usable_area: f64,
    /// Footprints of every blocking constraint. Walls count as a 0.1 m
    /// strip along their length.
    pub restricted_area: f64,
    /// Fixed share of the total area kept for circulation.
    pub access_area: f64,
    /// `usable_area / total_area`, capped at 1.
    pub efficiency: f64,
}

/// Two existing objects standing closer than their clearances allow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClearanceConflict {
    pub first_id: String,
    pub second_id: String,
    /// Footprint gap between the two objects in meters.
    pub gap: f64,
    /// Sum of both objects' clearances.
    pub required: f64,
}

/// Measured shape of the floor polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomGeometry {
    pub vertices: Vec<Vec2>,
    pub area: f64,
    pub perimeter: f64,
    pub bounds: Rect,
    pub centroid: Vec2,
    pub ceiling_height: f64,
    /// Floor area times ceiling height.
    pub volume: f64,
}

/// Everything [`analyze_room`] derives from a room and its objects.
///
/// Identical inputs always produce an identical result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomAnalysisResult {
    pub room_id: String,
    pub geometry: RoomGeometry,
    /// One segment per floor edge, in vertex order.
    pub walls: Vec<WallSegment>,
    /// Walls come first and utilities last.
    pub constraints: Vec<Constraint>,
    pub zones: Vec<PlacementZone>,
    /// One path per door and non-restricted zone.
    pub paths: Vec<AccessibilityPath>,
    pub utilization: SpaceUtilization,
    pub clearance_conflicts: Vec<ClearanceConflict>,
    /// Human-readable hints, in a fixed order.
    pub recommendations: Vec<String>,
}

impl RoomAnalysisResult {
    pub fn contains(&self, point: Vec2) -> bool {
        geometry::point_in_polygon(point, &self.geometry.vertices)
    }

    pub fn distance_to_wall(&self, point: Vec2) -> f64 {
        geometry::distance_to_boundary(point, &self.geometry.vertices)
    }

    pub fn doors(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Door)
    }

    /// Constraints that forbid placement inside their clearance, walls excluded.
    pub fn blocking_obstacles(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.blocks_placement && c.kind != ConstraintKind::Wall)
    }

    /// Zones of the given classes, best class first, then by area.
    pub fn zones_ranked(&self, classes: &[ZoneClass]) -> Vec<&PlacementZone> {
        let mut zones: Vec<&PlacementZone> = self
            .zones
            .iter()
            .filter(|z| classes.contains(&z.class))
            .collect();
        zones.sort_by(|a, b| {
            let rank = |z: &PlacementZone| classes.iter().position(|c| *c == z.class);
            rank(a).cmp(&rank(b)).then(
                b.area
                    .partial_cmp(&a.area)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });
        zones
    }
}

/// Analyzes a room and the objects already in it.
///
/// Objects whose footprint center lies outside the floor are ignored.
///
/// # Errors
/// [`PlannerError::InvalidInput`](crate::error::PlannerError::InvalidInput)
/// when the floor has fewer than three vertices or is otherwise degenerate.
pub fn analyze_room(
    room: &RoomInput,
    objects: &[SceneObject],
    room_id: &str,
) -> PlannerResult<RoomAnalysisResult> {
    let floor = room.floor_polygon()?;

    let area = floor.area();
    let shape = RoomGeometry {
        vertices: floor.vertices().to_vec(),
        area,
        perimeter: floor.perimeter(),
        bounds: floor.bounds(),
        centroid: floor.centroid(),
        ceiling_height: DEFAULT_CEILING_HEIGHT,
        volume: area * DEFAULT_CEILING_HEIGHT,
    };

    let ccw = floor.is_ccw();
    let walls: Vec<WallSegment> = floor
        .edges()
        .enumerate()
        .map(|(index, (start, end))| WallSegment {
            index,
            start,
            end,
            length: start.distance_to(&end),
            normal: geometry::inward_normal(start, end, ccw),
            wall_type: if room.interior_edges.contains(&index) {
                WallType::Interior
            } else {
                WallType::Exterior
            },
        })
        .collect();

    let placed: Vec<&SceneObject> = objects
        .iter()
        .filter(|o| floor.contains(o.footprint_center()))
        .collect();

    let mut catalog = FurnitureCatalog::new();
    let clearances: Vec<f64> = placed
        .iter()
        .map(|o| object_clearance(&mut catalog, o))
        .collect();

    let constraints = build_constraints(room, &shape, &walls, &placed, &clearances);
    let zones = build_zones(&shape, &constraints);
    let paths = build_paths(&constraints, &zones);
    let utilization = compute_utilization(area, &zones, &constraints);
    let clearance_conflicts = find_clearance_conflicts(&placed, &clearances);
    let recommendations =
        build_recommendations(area, room.has_window(), &utilization, &clearance_conflicts);

    info!(
        room_id,
        area,
        constraints = constraints.len(),
        zones = zones.len(),
        conflicts = clearance_conflicts.len(),
        "Room analysis finished"
    );

    Ok(RoomAnalysisResult {
        room_id: room_id.to_string(),
        geometry: shape,
        walls,
        constraints,
        zones,
        paths,
        utilization,
        clearance_conflicts,
        recommendations,
    })
}

fn build_constraints(
    room: &RoomInput,
    shape: &RoomGeometry,
    walls: &[WallSegment],
    placed: &[&SceneObject],
    clearances: &[f64],
) -> Vec<Constraint> {
    let mut constraints: Vec<Constraint> = walls.iter().map(Constraint::wall).collect();

    let mut door_count = 0;
    let mut window_count = 0;
    for opening in &room.openings {
        let (id, clearance, blocks, priority) = match opening.kind {
            OpeningKind::Door => {
                door_count += 1;
                (format!("door-{door_count}"), DOOR_CLEARANCE, true, Priority::High)
            }
            OpeningKind::Window => {
                window_count += 1;
                (format!("window-{window_count}"), WINDOW_CLEARANCE, false, Priority::Medium)
            }
        };
        constraints.push(Constraint {
            id,
            kind: match opening.kind {
                OpeningKind::Door => ConstraintKind::Door,
                OpeningKind::Window => ConstraintKind::Window,
            },
            position: opening.position,
            width: opening.width.max(0.0),
            depth: OPENING_DEPTH,
            span: None,
            clearance_required: clearance,
            blocks_placement: blocks,
            affects_access: opening.kind == OpeningKind::Door,
            priority: if opening.fire_exit {
                Priority::Critical
            } else {
                priority
            },
        });
    }

    if door_count == 0 {
        let b = shape.bounds;
        constraints.push(Constraint {
            id: "door-entry".to_string(),
            kind: ConstraintKind::Door,
            position: Vec2::new((b.min.x + b.max.x) / 2.0, b.min.z),
            width: SYNTHETIC_DOOR_WIDTH,
            depth: OPENING_DEPTH,
            span: None,
            clearance_required: DOOR_CLEARANCE,
            blocks_placement: true,
            affects_access: true,
            priority: Priority::High,
        });
    }

    for (object, &clearance) in placed.iter().zip(clearances) {
        let (width, depth) = object.footprint_size();
        constraints.push(Constraint {
            id: format!("object-{}", object.id),
            kind: ConstraintKind::ExistingObject,
            position: object.footprint_center(),
            width,
            depth,
            span: None,
            clearance_required: clearance,
            blocks_placement: true,
            affects_access: true,
            priority: Priority::High,
        });
    }

    for (index, utility) in room.utilities.iter().enumerate() {
        constraints.push(Constraint {
            id: format!("utility-{}", index + 1),
            kind: ConstraintKind::Utility,
            position: utility.position,
            width: UTILITY_SIZE,
            depth: UTILITY_SIZE,
            span: None,
            clearance_required: UTILITY_CLEARANCE,
            blocks_placement: false,
            affects_access: false,
            priority: Priority::Low,
        });
    }

    constraints
}

/// Fixed-size bitset over grid cell indices.
struct VisitedSet {
    words: Vec<u64>,
}

impl VisitedSet {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
        }
    }

    /// Marks `index`; returns `false` if it was already marked.
    fn insert(&mut self, index: usize) -> bool {
        let (word, bit) = (index / 64, 1u64 << (index % 64));
        let fresh = self.words[word] & bit == 0;
        self.words[word] |= bit;
        fresh
    }
}

/// Scored sample arena addressed by `(i, j)`.
struct ZoneGrid {
    origin: Vec2,
    nx: usize,
    nz: usize,
    /// `None` for samples outside the floor.
    scores: Vec<Option<f64>>,
}

impl ZoneGrid {
    fn position(&self, i: usize, j: usize) -> Vec2 {
        Vec2::new(
            self.origin.x + (i as f64 + 0.5) * ZONE_GRID_STEP,
            self.origin.z + (j as f64 + 0.5) * ZONE_GRID_STEP,
        )
    }

    fn class_at(&self, index: usize) -> Option<ZoneClass> {
        self.scores[index].map(ZoneClass::from_score)
    }

    fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (i, j) = ((index % self.nx) as isize, (index / self.nx) as isize);
        (-1isize..=1)
            .flat_map(move |dj| (-1isize..=1).map(move |di| (i + di, j + dj)))
            .filter(move |&(ni, nj)| {
                (ni, nj) != (i, j)
                    && ni >= 0
                    && nj >= 0
                    && (ni as usize) < self.nx
                    && (nj as usize) < self.nz
            })
            .map(move |(ni, nj)| nj as usize * self.nx + ni as usize)
    }
}

fn score_point(point: Vec2, wall_distance: f64, constraints: &[Constraint]) -> f64 {
    let mut score: f64 = 1.0;
    for constraint in constraints {
        if constraint.distance_to(point) >= constraint.clearance_required {
            continue;
        }
        if constraint.blocks_placement {
            return 0.0;
        }
        score *= 0.5;
    }
    // walls block, so reaching here means the point is outside their clearance
    if wall_distance < WALL_ADJACENT_DISTANCE {
        score = (score * WALL_BOOST).min(1.0);
    }
    score
}

fn build_zones(shape: &RoomGeometry, constraints: &[Constraint]) -> Vec<PlacementZone> {
    let bounds = shape.bounds;
    let nx = ((bounds.width() / ZONE_GRID_STEP).ceil() as usize).max(1);
    let nz = ((bounds.depth() / ZONE_GRID_STEP).ceil() as usize).max(1);

    let mut grid = ZoneGrid {
        origin: bounds.min,
        nx,
        nz,
        scores: Vec::with_capacity(nx * nz),
    };
    for j in 0..nz {
        for i in 0..nx {
            let p = grid.position(i, j);
            let score = geometry::point_in_polygon(p, &shape.vertices).then(|| {
                let wall_distance = geometry::distance_to_boundary(p, &shape.vertices);
                score_point(p, wall_distance, constraints)
            });
            grid.scores.push(score);
        }
    }

    let doors: Vec<Vec2> = constraints
        .iter()
        .filter(|c| c.kind == ConstraintKind::Door)
        .map(|c| c.position)
        .collect();
    let diagonal = bounds.width().hypot(bounds.depth()).max(EPSILON_GENERAL);

    let mut visited = VisitedSet::new(nx * nz);
    let mut zones = Vec::new();
    let mut stack = Vec::new();
    let mut cells = Vec::new();

    for seed in 0..nx * nz {
        let Some(class) = grid.class_at(seed) else {
            continue;
        };
        if !visited.insert(seed) {
            continue;
        }

        cells.clear();
        stack.push(seed);
        while let Some(index) = stack.pop() {
            cells.push(index);
            for next in grid.neighbors(index) {
                if grid.class_at(next) == Some(class) && visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        if cells.len() < MIN_ZONE_CELLS {
            continue;
        }
        zones.push(zone_from_cells(
            format!("zone-{}", zones.len() + 1),
            class,
            &grid,
            &cells,
            shape,
            &doors,
            diagonal,
        ));
    }

    debug!(cells = nx * nz, zones = zones.len(), "Zone grid flood-filled");
    zones
}

fn zone_from_cells(
    id: String,
    class: ZoneClass,
    grid: &ZoneGrid,
    cells: &[usize],
    shape: &RoomGeometry,
    doors: &[Vec2],
    diagonal: f64,
) -> PlacementZone {
    let half = ZONE_GRID_STEP / 2.0;
    let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut sum = Vec2::zero();
    let mut score_sum = 0.0;
    let mut nearest_wall = f64::INFINITY;
    let mut wall_sum = 0.0;

    for &index in cells {
        let p = grid.position(index % grid.nx, index / grid.nx);
        min = Vec2::new(min.x.min(p.x - half), min.z.min(p.z - half));
        max = Vec2::new(max.x.max(p.x + half), max.z.max(p.z + half));
        sum = sum + p;
        score_sum += grid.scores[index].unwrap_or(0.0);
        let wall = geometry::distance_to_boundary(p, &shape.vertices);
        nearest_wall = nearest_wall.min(wall);
        wall_sum += wall;
    }

    let count = cells.len() as f64;
    let center = sum * (1.0 / count);
    let area = count * ZONE_GRID_STEP * ZONE_GRID_STEP;

    let accessibility_score = if class == ZoneClass::Restricted {
        0.0
    } else {
        let door_distance = doors
            .iter()
            .map(|d| d.distance_to(&center))
            .fold(f64::INFINITY, f64::min);
        if door_distance.is_finite() {
            (1.0 - door_distance / diagonal).clamp(0.0, 1.0)
        } else {
            0.5
        }
    };
    let clearance_score = if class == ZoneClass::Restricted {
        0.0
    } else {
        (0.5 * score_sum / count + 0.5 * (wall_sum / count / 2.0).min(1.0)).clamp(0.0, 1.0)
    };

    PlacementZone {
        id,
        class,
        polygon: vec![
            min,
            Vec2::new(max.x, min.z),
            max,
            Vec2::new(min.x, max.z),
        ],
        center,
        area,
        cell_count: cells.len(),
        accessibility_score,
        clearance_score,
        nearest_wall_distance: nearest_wall,
        recommended_types: recommend_types(class, nearest_wall, area),
    }
}

fn recommend_types(class: ZoneClass, nearest_wall: f64, area: f64) -> Vec<FurnitureKind> {
    use FurnitureKind::*;

    if matches!(class, ZoneClass::Poor | ZoneClass::Restricted) {
        return Vec::new();
    }

    let mut kinds = Vec::new();
    let wall_adjacent = nearest_wall < WALL_ADJACENT_DISTANCE;
    if wall_adjacent {
        kinds.extend([Desk, Bookcase, Tv]);
        if area >= 3.0 {
            kinds.push(Sofa);
        }
        if area >= 4.0 {
            kinds.push(SingleBed);
        }
        if area >= 6.0 {
            kinds.push(DoubleBed);
        }
    }
    if area >= 4.0 && (!wall_adjacent || area >= 6.0) {
        kinds.push(Table);
    }
    kinds.push(Chair);
    kinds
}

fn build_paths(constraints: &[Constraint], zones: &[PlacementZone]) -> Vec<AccessibilityPath> {
    let mut paths = Vec::new();
    for door in constraints.iter().filter(|c| c.kind == ConstraintKind::Door) {
        for zone in zones.iter().filter(|z| z.class != ZoneClass::Restricted) {
            let blocked_by = constraints
                .iter()
                .filter(|c| c.kind != ConstraintKind::Wall && c.id != door.id)
                .filter(|c| c.distance_to_segment(door.position, zone.center) < c.clearance_required)
                .map(|c| c.id.clone())
                .collect();
            paths.push(AccessibilityPath {
                id: format!("path-{}-{}", door.id, zone.id),
                from: door.id.clone(),
                to_zone: zone.id.clone(),
                start: door.position,
                end: zone.center,
                width: PATH_WIDTH,
                clearance: PATH_WIDTH,
                blocked_by,
            });
        }
    }
    paths
}

fn compute_utilization(
    total_area: f64,
    zones: &[PlacementZone],
    constraints: &[Constraint],
) -> SpaceUtilization {
    let usable_area: f64 = zones
        .iter()
        .filter(|z| z.class != ZoneClass::Restricted)
        .map(|z| z.area)
        .sum();
    let restricted_area: f64 = constraints
        .iter()
        .filter(|c| c.blocks_placement)
        .map(|c| c.footprint_area())
        .sum();

    SpaceUtilization {
        total_area,
        usable_area,
        restricted_area,
        access_area: total_area * ACCESS_AREA_SHARE,
        efficiency: (usable_area / total_area).min(1.0),
    }
}

/// Known kinds use the fixed table; unknown objects their synthesized front clearance.
fn object_clearance(catalog: &mut FurnitureCatalog, object: &SceneObject) -> f64 {
    let spec = catalog.spec_for_object(object);
    match spec.kind {
        Some(kind) => existing_object_clearance(Some(kind)),
        None => spec.clearance.front,
    }
}

fn find_clearance_conflicts(placed: &[&SceneObject], clearances: &[f64]) -> Vec<ClearanceConflict> {
    let mut conflicts = Vec::new();
    for a in 0..placed.len() {
        for b in a + 1..placed.len() {
            let gap = placed[a].gap_to(placed[b]);
            let required = clearances[a] + clearances[b];
            if gap + EPSILON_GENERAL < required {
                conflicts.push(ClearanceConflict {
                    first_id: placed[a].id.clone(),
                    second_id: placed[b].id.clone(),
                    gap,
                    required,
                });
            }
        }
    }
    conflicts
}

fn build_recommendations(
    area: f64,
    has_window: bool,
    utilization: &SpaceUtilization,
    conflicts: &[ClearanceConflict],
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if area < 10.0 {
        recommendations.push("Small room: prefer compact furniture".to_string());
    }
    if area > 30.0 {
        recommendations.push("Large room: consider multiple furniture groupings".to_string());
    }
    if has_window {
        recommendations.push("Place seating near the window to use natural light".to_string());
    }
    if utilization.efficiency < 0.6 {
        recommendations.push(format!(
            "Low space efficiency ({:.0}%): constraints restrict much of the floor",
            utilization.efficiency * 100.0
        ));
    }
    for conflict in conflicts {
        recommendations.push(format!(
            "Objects '{}' and '{}' are {:.2} m apart but need {:.2} m clearance",
            conflict.first_id, conflict.second_id, conflict.gap, conflict.required
        ));
    }
    recommendations
}
