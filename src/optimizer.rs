//! Space optimization: how many objects of one type fit in a room, and where.
//!
//! The room is discretized into a uniform grid. Cells that are inside the
//! floor polygon, far enough from the walls and with enough free space around
//! them become candidates. Candidates are ordered by the requested
//! [`Strategy`] and accepted greedily, using a circle-packing approximation:
//! every placement claims a disc of its clearance radius and no two discs may
//! overlap.
//!
//! The circle model under- or over-packs elongated footprints. The warning
//! thresholds are calibrated against it, so it is kept as is.

use std::cmp::Ordering;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::catalog::{self, FurnitureKind, FurnitureSpec};
use crate::geometry;
use crate::model::FloorPolygon;
use crate::types::{EPSILON_GENERAL, Vec2};

/// Narrowest access zone that still counts as an accessible pathway, in meters.
pub const MIN_ACCESS_WIDTH: f64 = 0.9;

/// Efficiency above which a layout is reported as crowded.
pub const CROWDING_THRESHOLD: f64 = 0.8;

/// Wall buffer subtracted (per meter of perimeter) from the usable area.
const WALL_BUFFER: f64 = 0.5;

/// Sampling step for free-radius probes.
const CLEARANCE_PROBE_STEP: f64 = 0.1;

/// Extra radius probed beyond the required clearance.
const CLEARANCE_PROBE_MARGIN: f64 = 1.0;

/// Distance to a wall below which a cell counts as wall-adjacent.
const WALL_ADJACENT_DISTANCE: f64 = 0.5;

/// Named heuristic that orders candidate cells before greedy placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Prefer corners and walls to fit as many objects as possible.
    #[default]
    Maximize,
    /// Prefer cells with the most free space around them.
    Comfort,
    /// Prefer cells far from the room center.
    Ergonomic,
    /// Prefer an even spread around the room center.
    Aesthetic,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Maximize,
        Strategy::Comfort,
        Strategy::Ergonomic,
        Strategy::Aesthetic,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Strategy::Maximize => "maximize",
            Strategy::Comfort => "comfort",
            Strategy::Ergonomic => "ergonomic",
            Strategy::Aesthetic => "aesthetic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "maximize" | "max" => Some(Strategy::Maximize),
            "comfort" => Some(Strategy::Comfort),
            "ergonomic" => Some(Strategy::Ergonomic),
            "aesthetic" => Some(Strategy::Aesthetic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Configuration of a single optimizer run.
///
/// Distances are in meters.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OptimizationConfig {
    /// Free radius a cell needs to be considered at all
    pub min_clearance: f64,
    /// Space a person needs in front of the object
    pub access_clearance: f64,
    /// Minimum distance between a placement and any wall
    pub wall_offset: f64,
    /// Whether cells close to room corners may be used
    pub corner_usage: bool,
    /// Whether nearby placements are tagged with a shared group id
    pub grouping: bool,
    /// Step of the candidate grid
    pub grid_resolution: f64,
}

impl OptimizationConfig {
    pub const MIN_GRID_RESOLUTION: f64 = 0.05;

    /// Defaults for types without a dedicated table entry.
    pub const GENERIC: Self = Self {
        min_clearance: 0.5,
        access_clearance: 0.8,
        wall_offset: 0.2,
        corner_usage: false,
        grouping: false,
        grid_resolution: 0.2,
    };

    const fn entry(
        min_clearance: f64,
        access_clearance: f64,
        wall_offset: f64,
        corner_usage: bool,
        grouping: bool,
        grid_resolution: f64,
    ) -> Self {
        Self {
            min_clearance,
            access_clearance,
            wall_offset,
            corner_usage,
            grouping,
            grid_resolution,
        }
    }

    /// Per-type defaults. Kinds without an entry take the explicit generic branch.
    pub fn for_kind(kind: Option<FurnitureKind>) -> Self {
        match kind {
            Some(FurnitureKind::Desk) => Self::entry(0.8, 1.2, 0.1, true, true, 0.25),
            Some(FurnitureKind::Chair) => Self::entry(0.4, 0.6, 0.3, false, true, 0.2),
            Some(FurnitureKind::Table) => Self::entry(1.0, 1.2, 0.5, false, true, 0.25),
            Some(FurnitureKind::Sofa) => Self::entry(0.6, 1.0, 0.05, true, true, 0.25),
            Some(FurnitureKind::SingleBed | FurnitureKind::DoubleBed) => {
                Self::entry(0.6, 0.9, 0.05, true, false, 0.25)
            }
            Some(FurnitureKind::Bookcase) => Self::entry(0.3, 0.8, 0.02, true, false, 0.2),
            Some(FurnitureKind::Tv) | None => Self::GENERIC,
        }
    }

    /// Creates a builder for a custom configuration.
    pub fn builder() -> OptimizationConfigBuilder {
        OptimizationConfigBuilder::default()
    }

    /// Applies the set fields of `overrides`.
    pub fn with_overrides(self, overrides: &OptimizationOverrides) -> Self {
        let mut builder = OptimizationConfigBuilder { config: self };
        if let Some(v) = overrides.min_clearance {
            builder = builder.min_clearance(v);
        }
        if let Some(v) = overrides.access_clearance {
            builder = builder.access_clearance(v);
        }
        if let Some(v) = overrides.wall_offset {
            builder = builder.wall_offset(v);
        }
        if let Some(v) = overrides.corner_usage {
            builder = builder.corner_usage(v);
        }
        if let Some(v) = overrides.grouping {
            builder = builder.grouping(v);
        }
        if let Some(v) = overrides.grid_resolution {
            builder = builder.grid_resolution(v);
        }
        builder.build()
    }

    /// Radius each placement claims in the circle-packing model.
    #[inline]
    pub fn effective_radius(&self) -> f64 {
        self.min_clearance.max(self.access_clearance)
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self::GENERIC
    }
}

/// Builder for [`OptimizationConfig`]. Negative distances are clamped to zero.
#[derive(Clone, Debug, Default)]
pub struct OptimizationConfigBuilder {
    config: OptimizationConfig,
}

impl OptimizationConfigBuilder {
    pub fn min_clearance(mut self, value: f64) -> Self {
        self.config.min_clearance = sanitize_distance(value, self.config.min_clearance);
        self
    }

    pub fn access_clearance(mut self, value: f64) -> Self {
        self.config.access_clearance = sanitize_distance(value, self.config.access_clearance);
        self
    }

    pub fn wall_offset(mut self, value: f64) -> Self {
        self.config.wall_offset = sanitize_distance(value, self.config.wall_offset);
        self
    }

    pub fn corner_usage(mut self, value: bool) -> Self {
        self.config.corner_usage = value;
        self
    }

    pub fn grouping(mut self, value: bool) -> Self {
        self.config.grouping = value;
        self
    }

    pub fn grid_resolution(mut self, value: f64) -> Self {
        if value.is_finite() {
            self.config.grid_resolution = value.max(OptimizationConfig::MIN_GRID_RESOLUTION);
        }
        self
    }

    pub fn build(self) -> OptimizationConfig {
        self.config
    }
}

fn sanitize_distance(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

/// Partial configuration supplied by a caller; unset fields keep the type defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OptimizationOverrides {
    #[serde(default)]
    pub min_clearance: Option<f64>,
    #[serde(default)]
    pub access_clearance: Option<f64>,
    #[serde(default)]
    pub wall_offset: Option<f64>,
    #[serde(default)]
    pub corner_usage: Option<bool>,
    #[serde(default)]
    pub grouping: Option<bool>,
    #[serde(default)]
    pub grid_resolution: Option<f64>,
}

/// Part of an access zone around a placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessZoneKind {
    Front,
    Left,
    Right,
}

/// Region next to a placement that must stay clear for human interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccessZone {
    pub kind: AccessZoneKind,
    pub center: Vec2,
    pub radius: f64,
    /// Required zones are checked against [`MIN_ACCESS_WIDTH`].
    pub required: bool,
}

/// A proposed placement of one object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlacementLayout {
    pub position: Vec2,
    /// Heading in radians, measured from +z towards +x.
    pub rotation: f64,
    pub clearance_radius: f64,
    pub access_zones: Vec<AccessZone>,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl PlacementLayout {
    /// Unit vector the object faces.
    pub fn facing(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    /// `true` when the clearance discs of both layouts overlap.
    pub fn conflicts_with(&self, other: &PlacementLayout) -> bool {
        self.position.distance_to(&other.position) + EPSILON_GENERAL
            < self.clearance_radius + other.clearance_radius
    }
}

/// Result of an extra run with a different strategy, for comparison.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct StrategyAlternative {
    pub strategy: Strategy,
    pub max_objects: usize,
    pub efficiency: f64,
    pub layouts: Vec<PlacementLayout>,
}

/// Result of [`optimize_space`].
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct OptimizationResult {
    pub object_type: String,
    pub strategy: Strategy,
    pub config: OptimizationConfig,
    pub max_objects: usize,
    pub layouts: Vec<PlacementLayout>,
    /// Area-based estimate in `[0, 1]`, not exact coverage.
    pub efficiency: f64,
    pub warnings: Vec<String>,
    pub alternative_layouts: Option<Vec<StrategyAlternative>>,
}

impl OptimizationResult {
    /// Best single layout, if anything fits.
    pub fn best_layout(&self) -> Option<&PlacementLayout> {
        self.layouts.first()
    }
}

/// Wall edge with its inward normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallEdge {
    pub start: Vec2,
    pub end: Vec2,
    pub normal: Vec2,
}

/// Derived room measurements used by the optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomBounds {
    pub area: f64,
    pub perimeter: f64,
    pub walls: Vec<WallEdge>,
    pub corners: Vec<Vec2>,
    pub centroid: Vec2,
    /// Area minus a wall buffer of half a meter along the perimeter, never negative.
    pub usable_area: f64,
}

impl RoomBounds {
    pub fn from_floor(floor: &FloorPolygon) -> Self {
        let ccw = floor.is_ccw();
        let walls = floor
            .edges()
            .map(|(start, end)| WallEdge {
                start,
                end,
                normal: geometry::inward_normal(start, end, ccw),
            })
            .collect();
        let area = floor.area();
        let perimeter = floor.perimeter();

        Self {
            area,
            perimeter,
            walls,
            corners: floor.vertices().to_vec(),
            centroid: floor.centroid(),
            usable_area: (area - perimeter * WALL_BUFFER).max(0.0),
        }
    }
}

/// One cell of the candidate grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCell {
    pub position: Vec2,
    pub is_valid: bool,
    pub is_corner: bool,
    pub distance_to_wall: f64,
    pub clearance_radius: f64,
    pub occupied: bool,
}

/// Upper bound on placements from area alone: `⌊A / (π·r²)⌋`.
pub fn capacity_ceiling(area: f64, radius: f64) -> usize {
    if radius <= EPSILON_GENERAL {
        return usize::MAX;
    }
    (area / (PI * radius * radius) + EPSILON_GENERAL).floor().max(0.0) as usize
}

/// Optimizes placements for one object type with the type's default configuration.
///
/// # Parameters
/// * `floor` - Validated floor polygon
/// * `object_type` - Free-form type tag; unknown tags use the generic configuration
/// * `strategy` - Candidate ordering
/// * `overrides` - Optional partial configuration
pub fn optimize_space(
    floor: &FloorPolygon,
    object_type: &str,
    strategy: Strategy,
    overrides: Option<&OptimizationOverrides>,
) -> OptimizationResult {
    let spec = catalog::spec_for_type(object_type);
    let mut config = OptimizationConfig::for_kind(spec.kind);
    if let Some(overrides) = overrides {
        config = config.with_overrides(overrides);
    }
    optimize_space_with_config(floor, object_type, &spec, strategy, config)
}

/// Like [`optimize_space`], with a fully resolved spec and configuration.
///
/// Runs the requested strategy plus one run per other strategy, returned as
/// alternatives.
pub fn optimize_space_with_config(
    floor: &FloorPolygon,
    object_type: &str,
    spec: &FurnitureSpec,
    strategy: Strategy,
    config: OptimizationConfig,
) -> OptimizationResult {
    let bounds = RoomBounds::from_floor(floor);
    let mut result = single_run(floor, &bounds, object_type, spec, strategy, config);

    let alternatives = Strategy::ALL
        .iter()
        .copied()
        .filter(|s| *s != strategy)
        .map(|s| {
            let run = run_strategy(floor, &bounds, object_type, spec, s, &config);
            StrategyAlternative {
                strategy: s,
                max_objects: run.layouts.len(),
                efficiency: run.efficiency,
                layouts: run.layouts,
            }
        })
        .collect();
    result.alternative_layouts = Some(alternatives);
    result
}

/// Runs one strategy only; `alternative_layouts` stays `None`.
pub fn optimize_strategy(
    floor: &FloorPolygon,
    object_type: &str,
    spec: &FurnitureSpec,
    strategy: Strategy,
    config: OptimizationConfig,
) -> OptimizationResult {
    let bounds = RoomBounds::from_floor(floor);
    single_run(floor, &bounds, object_type, spec, strategy, config)
}

fn single_run(
    floor: &FloorPolygon,
    bounds: &RoomBounds,
    object_type: &str,
    spec: &FurnitureSpec,
    strategy: Strategy,
    config: OptimizationConfig,
) -> OptimizationResult {
    let run = run_strategy(floor, bounds, object_type, spec, strategy, &config);

    info!(
        object_type,
        strategy = %strategy,
        max_objects = run.layouts.len(),
        efficiency = run.efficiency,
        "Space optimization finished"
    );

    OptimizationResult {
        object_type: object_type.to_string(),
        strategy,
        config,
        max_objects: run.layouts.len(),
        layouts: run.layouts,
        efficiency: run.efficiency,
        warnings: run.warnings,
        alternative_layouts: None,
    }
}

struct StrategyRun {
    layouts: Vec<PlacementLayout>,
    efficiency: f64,
    warnings: Vec<String>,
}

fn run_strategy(
    floor: &FloorPolygon,
    bounds: &RoomBounds,
    object_type: &str,
    spec: &FurnitureSpec,
    strategy: Strategy,
    config: &OptimizationConfig,
) -> StrategyRun {
    let mut warnings = Vec::new();
    let radius = config.effective_radius();

    if bounds.area + EPSILON_GENERAL < spec.constraints.min_room_size {
        warnings.push(format!(
            "Room area {:.1} m² is below the minimum of {:.1} m² for {}",
            bounds.area, spec.constraints.min_room_size, object_type
        ));
        return StrategyRun {
            layouts: Vec::new(),
            efficiency: 0.0,
            warnings,
        };
    }

    let mut ceiling = capacity_ceiling(bounds.area, radius);
    if let Some(max) = spec.constraints.max_per_room {
        ceiling = ceiling.min(max as usize);
    }

    let mut cells = build_grid(floor, bounds, config);
    let mut candidates = filter_candidates(&cells, config);
    order_candidates(&mut candidates, &cells, bounds, strategy);

    debug!(
        object_type,
        strategy = %strategy,
        cells = cells.len(),
        candidates = candidates.len(),
        ceiling,
        "Grid prepared"
    );

    let layouts = place_greedy(&mut cells, &candidates, bounds, object_type, config, ceiling);

    let claimed: f64 = layouts
        .iter()
        .map(|l| PI * l.clearance_radius * l.clearance_radius)
        .sum();
    let efficiency = if layouts.is_empty() {
        0.0
    } else if bounds.usable_area <= EPSILON_GENERAL {
        1.0
    } else {
        (claimed / bounds.usable_area).min(1.0)
    };

    if layouts.is_empty() {
        warnings.push(format!(
            "No valid placement found for {} with the {} strategy",
            object_type, strategy
        ));
    }
    if ceiling <= 1 {
        warnings.push(format!(
            "Limited space: room area supports at most {} {}",
            ceiling, object_type
        ));
    }
    if efficiency > CROWDING_THRESHOLD {
        warnings.push(format!(
            "Layout is crowded: clearance zones cover {:.0}% of the usable area",
            efficiency * 100.0
        ));
    }
    let narrow_access = layouts
        .iter()
        .flat_map(|l| l.access_zones.iter())
        .any(|z| z.required && z.radius + EPSILON_GENERAL < MIN_ACCESS_WIDTH);
    if narrow_access {
        warnings.push(format!(
            "Access clearance {:.2} m is below the recommended {:.2} m pathway width",
            config.access_clearance, MIN_ACCESS_WIDTH
        ));
    }

    StrategyRun {
        layouts,
        efficiency,
        warnings,
    }
}

/// Builds the uniform candidate grid over the room's bounding box.
fn build_grid(floor: &FloorPolygon, bounds: &RoomBounds, config: &OptimizationConfig) -> Vec<GridCell> {
    let rect = floor.bounds();
    let step = config.grid_resolution.max(OptimizationConfig::MIN_GRID_RESOLUTION);
    let nx = ((rect.width() / step).ceil() as usize).max(1);
    let nz = ((rect.depth() / step).ceil() as usize).max(1);
    let probe_limit = config.effective_radius() + CLEARANCE_PROBE_MARGIN;

    let mut cells = Vec::with_capacity(nx * nz);
    for j in 0..nz {
        for i in 0..nx {
            let position = Vec2::new(
                rect.min.x + (i as f64 + 0.5) * step,
                rect.min.z + (j as f64 + 0.5) * step,
            );
            let inside = floor.contains(position);
            let distance_to_wall = floor.distance_to_wall(position);
            let is_valid = inside && distance_to_wall + EPSILON_GENERAL >= config.wall_offset;
            let is_corner = bounds
                .corners
                .iter()
                .any(|c| c.distance_to(&position) <= 2.0 * step);
            let clearance_radius = if is_valid {
                probe_free_radius(floor, position, probe_limit)
            } else {
                0.0
            };

            cells.push(GridCell {
                position,
                is_valid,
                is_corner,
                distance_to_wall,
                clearance_radius,
                occupied: false,
            });
        }
    }
    cells
}

/// Largest free distance along the 8 compass directions, capped at `limit`.
fn probe_free_radius(floor: &FloorPolygon, origin: Vec2, limit: f64) -> f64 {
    let mut best: f64 = 0.0;
    for k in 0..8 {
        let dir = Vec2::from_angle(k as f64 * PI / 4.0);
        let mut free = 0.0;
        let mut t = CLEARANCE_PROBE_STEP;
        while t <= limit + EPSILON_GENERAL {
            if !floor.contains(origin + dir * t) {
                break;
            }
            free = t;
            t += CLEARANCE_PROBE_STEP;
        }
        best = best.max(free);
        if best >= limit {
            break;
        }
    }
    best.min(limit)
}

fn filter_candidates(cells: &[GridCell], config: &OptimizationConfig) -> Vec<usize> {
    cells
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.is_valid
                && !c.occupied
                && c.clearance_radius + EPSILON_GENERAL >= config.min_clearance
                && c.distance_to_wall + EPSILON_GENERAL >= config.wall_offset
                && (config.corner_usage || !c.is_corner)
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Sorts candidate indices by strategy. The sort is stable, so ties keep grid order.
fn order_candidates(candidates: &mut [usize], cells: &[GridCell], bounds: &RoomBounds, strategy: Strategy) {
    let center_distance = |idx: usize| cells[idx].position.distance_to(&bounds.centroid);

    match strategy {
        Strategy::Maximize => {
            let score = |idx: usize| {
                let cell = &cells[idx];
                let corner = if cell.is_corner { 2.0 } else { 0.0 };
                let wall = if cell.distance_to_wall < WALL_ADJACENT_DISTANCE {
                    1.0
                } else {
                    0.0
                };
                corner + wall
            };
            candidates.sort_by(|&a, &b| desc(score(a), score(b)));
        }
        Strategy::Comfort => {
            candidates.sort_by(|&a, &b| desc(cells[a].clearance_radius, cells[b].clearance_radius));
        }
        Strategy::Ergonomic => {
            candidates.sort_by(|&a, &b| desc(center_distance(a), center_distance(b)));
        }
        Strategy::Aesthetic => {
            if candidates.is_empty() {
                return;
            }
            let mean = candidates.iter().map(|&i| center_distance(i)).sum::<f64>()
                / candidates.len() as f64;
            let deviation = |idx: usize| (center_distance(idx) - mean).abs();
            candidates.sort_by(|&a, &b| {
                deviation(a)
                    .partial_cmp(&deviation(b))
                    .unwrap_or(Ordering::Equal)
            });
        }
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn place_greedy(
    cells: &mut [GridCell],
    candidates: &[usize],
    bounds: &RoomBounds,
    object_type: &str,
    config: &OptimizationConfig,
    ceiling: usize,
) -> Vec<PlacementLayout> {
    let radius = config.effective_radius();
    let mut layouts: Vec<PlacementLayout> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for &idx in candidates {
        if layouts.len() >= ceiling {
            break;
        }
        if cells[idx].occupied {
            continue;
        }
        let position = cells[idx].position;
        let blocked = layouts
            .iter()
            .any(|l| position.distance_to(&l.position) + EPSILON_GENERAL < radius + l.clearance_radius);
        if blocked {
            continue;
        }

        let rotation = if config.access_clearance > config.min_clearance {
            (bounds.centroid - position).angle()
        } else {
            0.0
        };
        let mut layout = PlacementLayout {
            position,
            rotation,
            clearance_radius: radius,
            access_zones: access_zones(position, rotation, config),
            group_id: None,
        };

        if config.grouping {
            layout.group_id = Some(assign_group(&mut groups, &layouts, &layout, object_type));
        }

        for cell in cells.iter_mut() {
            if cell.position.distance_to(&position) < radius {
                cell.occupied = true;
            }
        }
        layouts.push(layout);
    }
    layouts
}

fn access_zones(position: Vec2, rotation: f64, config: &OptimizationConfig) -> Vec<AccessZone> {
    let facing = Vec2::from_angle(rotation);
    let side = facing.perpendicular();
    vec![
        AccessZone {
            kind: AccessZoneKind::Front,
            center: position + facing * config.access_clearance,
            radius: config.access_clearance,
            required: true,
        },
        AccessZone {
            kind: AccessZoneKind::Left,
            center: position + side * config.min_clearance,
            radius: config.min_clearance,
            required: false,
        },
        AccessZone {
            kind: AccessZoneKind::Right,
            center: position - side * config.min_clearance,
            radius: config.min_clearance,
            required: false,
        },
    ]
}

/// Joins the first group with a member within 1.25× the combined radii, else opens a new one.
fn assign_group(
    groups: &mut Vec<Vec<usize>>,
    layouts: &[PlacementLayout],
    layout: &PlacementLayout,
    object_type: &str,
) -> String {
    let next_index = layouts.len();
    let joined = groups.iter_mut().enumerate().find_map(|(gid, members)| {
        let near = members.iter().any(|&m| {
            layouts[m].position.distance_to(&layout.position)
                <= 1.25 * (layouts[m].clearance_radius + layout.clearance_radius)
        });
        if near {
            members.push(next_index);
            Some(gid)
        } else {
            None
        }
    });

    let gid = match joined {
        Some(gid) => gid,
        None => {
            groups.push(vec![next_index]);
            groups.len() - 1
        }
    };
    format!("{}-group-{}", object_type.trim().to_ascii_lowercase(), gid + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionResolver, CollisionConfig};
    use crate::model::{Scene, SceneObject};
    use crate::types::Vec3;

    fn room(w: f64, d: f64) -> FloorPolygon {
        FloorPolygon::rectangle(w, d).unwrap()
    }

    fn assert_count_bound(result: &OptimizationResult, area: f64) {
        let bound = capacity_ceiling(area, result.config.effective_radius());
        assert!(
            result.max_objects <= bound,
            "{} layouts exceed the area bound {}",
            result.max_objects,
            bound
        );
        assert!((0.0..=1.0).contains(&result.efficiency));
    }

    #[test]
    fn desk_fits_in_twenty_square_meters() {
        let floor = room(5.0, 4.0);
        let result = optimize_space(&floor, "Desk", Strategy::Maximize, None);

        assert!(result.max_objects >= 1);
        assert_eq!(result.max_objects, result.layouts.len());
        assert!((result.config.access_clearance - 1.2).abs() < EPSILON_GENERAL);
        assert!(
            !result.warnings.iter().any(|w| w.contains("minimum") || w.contains("Limited space")),
            "unexpected size warning: {:?}",
            result.warnings
        );
        assert_count_bound(&result, floor.area());
    }

    #[test]
    fn layout_count_respects_area_bound_for_every_strategy() {
        let floor = FloorPolygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(6.0, 0.0),
            Vec2::new(6.0, 3.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(3.0, 6.0),
            Vec2::new(0.0, 6.0),
        ])
        .unwrap();

        for object_type in ["desk", "chair", "table", "sofa", "bed", "bookcase", "lamp"] {
            for strategy in Strategy::ALL {
                let result = optimize_space(&floor, object_type, strategy, None);
                assert_count_bound(&result, floor.area());
                for layout in &result.layouts {
                    assert!(floor.contains(layout.position));
                }
            }
        }
    }

    #[test]
    fn small_room_limits_tables() {
        let floor = room(3.0, 3.0);
        let result = optimize_space(&floor, "Table", Strategy::Maximize, None);
        assert!(result.max_objects <= 1);
        assert!(result.warnings.iter().any(|w| w.contains("Limited space")));
    }

    #[test]
    fn room_below_minimum_size_yields_nothing() {
        let floor = room(2.0, 1.5);
        let result = optimize_space(&floor, "sofa", Strategy::Comfort, None);
        assert_eq!(result.max_objects, 0);
        assert!(result.layouts.is_empty());
        assert!(!result.warnings.is_empty());
        assert_eq!(result.efficiency, 0.0);
    }

    #[test]
    fn unknown_type_uses_generic_config() {
        let floor = room(4.0, 4.0);
        let result = optimize_space(&floor, "aquarium", Strategy::Maximize, None);
        assert_eq!(result.config, OptimizationConfig::GENERIC);
        assert!(result.max_objects >= 1);
        // generic access clearance 0.8 is below the pathway width
        assert!(result.warnings.iter().any(|w| w.contains("pathway width")));
    }

    #[test]
    fn overrides_are_merged_into_type_defaults() {
        let floor = room(5.0, 5.0);
        let overrides = OptimizationOverrides {
            access_clearance: Some(1.5),
            grid_resolution: Some(0.01),
            ..Default::default()
        };
        let result = optimize_space(&floor, "chair", Strategy::Comfort, Some(&overrides));
        assert!((result.config.access_clearance - 1.5).abs() < EPSILON_GENERAL);
        assert!((result.config.min_clearance - 0.4).abs() < EPSILON_GENERAL);
        assert!(
            (result.config.grid_resolution - OptimizationConfig::MIN_GRID_RESOLUTION).abs()
                < EPSILON_GENERAL
        );
    }

    #[test]
    fn layouts_do_not_overlap_under_collision_checks() {
        let floor = room(6.0, 5.0);
        let result = optimize_space(&floor, "chair", Strategy::Maximize, None);
        assert!(result.layouts.len() >= 2);

        // squares inscribed in each clearance disc
        let objects = result.layouts.iter().enumerate().map(|(i, l)| {
            let side = l.clearance_radius * std::f64::consts::SQRT_2;
            SceneObject::new(
                format!("c{i}"),
                "chair",
                Vec3::new(l.position.x, 0.0, l.position.z),
                Vec3::new(side, 1.0, side),
            )
        });
        let scene = Scene::from_objects(objects);
        let mut resolver = CollisionResolver::new(CollisionConfig::default());
        for i in 0..result.layouts.len() {
            let report = resolver.detect_collisions(&scene, &format!("c{i}"), None, &[]);
            assert!(!report.has_collision, "layout {i} collides: {:?}", report.colliding_object_ids);
        }
    }

    #[test]
    fn strategies_produce_alternatives() {
        let floor = room(5.0, 4.0);
        let result = optimize_space(&floor, "desk", Strategy::Comfort, None);
        let alternatives = result.alternative_layouts.as_ref().unwrap();
        assert_eq!(alternatives.len(), 3);
        assert!(alternatives.iter().all(|a| a.strategy != Strategy::Comfort));
    }

    #[test]
    fn maximize_prefers_corners() {
        let floor = room(5.0, 4.0);
        let result = optimize_space(&floor, "desk", Strategy::Maximize, None);
        let first = result.best_layout().unwrap();
        let near_corner = floor
            .vertices()
            .iter()
            .any(|v| v.distance_to(&first.position) <= 2.0 * result.config.grid_resolution);
        assert!(near_corner);
    }

    #[test]
    fn rotation_faces_room_center_when_access_dominates() {
        let floor = room(5.0, 4.0);
        let result = optimize_space(&floor, "desk", Strategy::Maximize, None);
        let centroid = floor.centroid();
        for layout in &result.layouts {
            let to_center = (centroid - layout.position).normalized();
            assert!(layout.facing().dot(&to_center) > 0.99);
            assert_eq!(layout.access_zones.len(), 3);
        }
    }

    #[test]
    fn grouping_tags_layouts() {
        let floor = room(6.0, 6.0);
        let result = optimize_space(&floor, "chair", Strategy::Maximize, None);
        assert!(result.layouts.iter().all(|l| l.group_id.is_some()));
    }

    #[test]
    fn strategy_parse_round_trips() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::parse(strategy.code()), Some(strategy));
        }
        assert_eq!(Strategy::parse("fastest"), None);
    }
}
