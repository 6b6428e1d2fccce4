//! Multi-type layout generation.
//!
//! The [`LayoutGenerator`] turns a room and a set of furniture requirements
//! into ranked [`GeneratedLayout`]s. Requirements come from a template, an ad
//! hoc type list, or area-tiered defaults. Per strategy, every required type
//! gets one optimizer run and up to [`MAX_COMPOSITES`] composites are formed by
//! index-aligned pairing of the per-type candidates. This is a bounded-time
//! approximation, not a search over all combinations.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::analyzer::{self, ConstraintKind, RoomAnalysisResult, ZoneClass};
use crate::catalog::{self, FurnitureKind, FurnitureSpec, WallPreference};
use crate::error::PlannerResult;
use crate::geometry;
use crate::model::{RoomInput, SceneObject};
use crate::optimizer::{
    self, AccessZone, OptimizationConfig, OptimizationOverrides, PlacementLayout, Strategy,
};
use crate::templates::{self, CardinalFacing, LayoutTemplate};
use crate::types::{EPSILON_GENERAL, Footprint, Vec2};
use crate::validator::{
    DOOR_KEEP_CLEAR, IssueCategory, PlacementValidator, StandardValidator, ValidationReport,
};

/// Composite layouts built per strategy.
pub const MAX_COMPOSITES: usize = 3;

/// Layouts scoring above this are kept even when invalid.
pub const RETAIN_SCORE: f64 = 60.0;

/// Minimum gap between two placements of one layout.
const PLACEMENT_GAP: f64 = 0.1;

/// Step of the slot grid used by template layouts.
const SLOT_STEP: f64 = 0.25;

/// Distance kept between a wall-snapped object and its wall.
const WALL_SNAP_CLEARANCE: f64 = 0.3;

/// One object of a generated layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlannedPlacement {
    pub object_type: String,
    #[serde(default)]
    pub kind: Option<FurnitureKind>,
    pub position: Vec2,
    /// Heading in radians, measured from +z towards +x.
    pub rotation: f64,
    pub width: f64,
    pub depth: f64,
    pub clearance_radius: f64,
    #[serde(default)]
    pub access_zones: Vec<AccessZone>,
    /// Whether the object is meant to stand against a wall.
    #[serde(default)]
    pub wall_placement: bool,
}

impl PlannedPlacement {
    /// Placement with catalog dimensions for `object_type`.
    pub fn new(object_type: &str, position: Vec2, rotation: f64) -> Self {
        let spec = catalog::spec_for_type(object_type);
        Self {
            object_type: object_type.to_string(),
            kind: spec.kind,
            position,
            rotation,
            width: spec.dimensions.width,
            depth: spec.dimensions.depth,
            clearance_radius: OptimizationConfig::for_kind(spec.kind).effective_radius(),
            access_zones: Vec::new(),
            wall_placement: spec.usage.wall_placement == WallPreference::Required,
        }
    }

    pub fn from_layout(object_type: &str, spec: &FurnitureSpec, layout: &PlacementLayout) -> Self {
        Self {
            object_type: object_type.to_string(),
            kind: spec.kind,
            position: layout.position,
            rotation: layout.rotation,
            width: spec.dimensions.width,
            depth: spec.dimensions.depth,
            clearance_radius: layout.clearance_radius,
            access_zones: layout.access_zones.clone(),
            wall_placement: false,
        }
    }

    /// Half of the longest footprint side.
    pub fn reach(&self) -> f64 {
        0.5 * self.width.max(self.depth)
    }

    /// Corners of the rotated footprint's bounding rectangle.
    pub fn corners(&self) -> [Vec2; 4] {
        let (w, d) = self.footprint_size();
        let (hx, hz) = (w / 2.0, d / 2.0);
        let p = self.position;
        [
            Vec2::new(p.x - hx, p.z - hz),
            Vec2::new(p.x + hx, p.z - hz),
            Vec2::new(p.x + hx, p.z + hz),
            Vec2::new(p.x - hx, p.z + hz),
        ]
    }
}

impl Footprint for PlannedPlacement {
    fn footprint_center(&self) -> Vec2 {
        self.position
    }

    /// Axis-aligned extent of the rotated footprint.
    fn footprint_size(&self) -> (f64, f64) {
        let (s, c) = (self.rotation.sin().abs(), self.rotation.cos().abs());
        (self.width * c + self.depth * s, self.width * s + self.depth * c)
    }
}

/// One required furniture type with its quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Requirement {
    pub object_type: String,
    pub kind: Option<FurnitureKind>,
    pub quantity: u32,
    #[serde(default)]
    pub wall_placement: bool,
    #[serde(default)]
    pub facing: Option<CardinalFacing>,
}

impl Requirement {
    fn of(object_type: &str, quantity: u32) -> Self {
        Self {
            object_type: object_type.to_string(),
            kind: FurnitureKind::parse(object_type),
            quantity,
            wall_placement: false,
            facing: None,
        }
    }
}

/// What to generate layouts for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayoutRequest {
    #[serde(default)]
    pub room_id: String,
    /// Built-in template id; takes precedence over `object_types`.
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub object_types: Vec<String>,
    /// Defaults to a single [`Strategy::default`] run.
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    #[serde(default)]
    pub overrides: Option<OptimizationOverrides>,
}

/// Layout metrics, each on a 0–100 scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayoutMetrics {
    pub score: f64,
    pub space_efficiency: f64,
    pub accessibility: f64,
    pub ergonomics: f64,
    pub safety: f64,
}

impl LayoutMetrics {
    /// Equal-weight blend of the four component metrics.
    pub fn blended(&self) -> f64 {
        0.25 * (self.space_efficiency + self.accessibility + self.ergonomics + self.safety)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ZoneSummary {
    pub zone_id: String,
    pub class: ZoneClass,
    pub placements: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedLayout {
    pub id: String,
    pub strategy: Strategy,
    #[serde(default)]
    pub template_id: Option<String>,
    pub placements: Vec<PlannedPlacement>,
    pub metrics: LayoutMetrics,
    pub validation: ValidationReport,
    pub zone_summaries: Vec<ZoneSummary>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Ids of notable layouts within a result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayoutRecommendations {
    pub preferred: Option<String>,
    pub most_efficient: Option<String>,
    pub most_accessible: Option<String>,
    pub alternatives: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayoutSummary {
    pub requirements: Vec<Requirement>,
    pub strategies: Vec<Strategy>,
    pub generated: usize,
    pub retained: usize,
    pub notes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayoutGenerationResult {
    pub room_id: String,
    /// Ranked by score, best first.
    pub layouts: Vec<GeneratedLayout>,
    pub recommendations: LayoutRecommendations,
    pub summary: LayoutSummary,
}

/// Requirements derived from room area when nothing else is requested.
pub fn default_requirements(area: f64) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    if area >= 6.0 {
        requirements.push(Requirement::of("desk", 1));
        requirements.push(Requirement::of("chair", 1));
    }
    if area >= 12.0 {
        requirements.push(Requirement::of("table", 1));
        requirements.push(Requirement::of("bookcase", 1));
    }
    if area >= 20.0 {
        requirements.push(Requirement::of("sofa", 1));
    }
    requirements
}

fn requirements_from_template(template: &LayoutTemplate) -> Vec<Requirement> {
    template
        .required_items()
        .map(|item| Requirement {
            object_type: item.kind.code().to_string(),
            kind: Some(item.kind),
            quantity: item.required,
            wall_placement: item.wall_placement,
            facing: item.facing,
        })
        .collect()
}

/// One requirement per distinct tag, counting repeats.
fn requirements_from_types(object_types: &[String]) -> Vec<Requirement> {
    let mut requirements: Vec<Requirement> = Vec::new();
    for tag in object_types {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        match requirements.iter_mut().find(|r| r.object_type.eq_ignore_ascii_case(tag)) {
            Some(existing) => existing.quantity += 1,
            None => requirements.push(Requirement::of(tag, 1)),
        }
    }
    requirements
}

/// Candidates from one optimizer run for one requirement.
struct TypeRun<'a> {
    requirement: &'a Requirement,
    spec: FurnitureSpec,
    layouts: Vec<PlacementLayout>,
}

/// Generates and ranks multi-type layouts.
pub struct LayoutGenerator {
    validator: Box<dyn PlacementValidator>,
}

impl Default for LayoutGenerator {
    fn default() -> Self {
        Self::new(Box::new(StandardValidator))
    }
}

impl LayoutGenerator {
    pub fn new(validator: Box<dyn PlacementValidator>) -> Self {
        Self { validator }
    }

    /// Generates ranked layouts for a room.
    ///
    /// A room too small for the template or the area-tiered defaults yields
    /// an empty result with an explanatory note.
    ///
    /// # Errors
    /// `InvalidInput` for a degenerate floor, `UnknownTemplate` for an
    /// unknown template id.
    pub fn generate_layouts(
        &self,
        room: &RoomInput,
        objects: &[SceneObject],
        request: &LayoutRequest,
    ) -> PlannerResult<LayoutGenerationResult> {
        let template = request
            .template_id
            .as_deref()
            .map(templates::find_template)
            .transpose()?;
        let analysis = analyzer::analyze_room(room, objects, &request.room_id)?;
        let floor = room.floor_polygon()?;
        let area = analysis.geometry.area;

        let mut strategies: Vec<Strategy> = Vec::new();
        for s in &request.strategies {
            if !strategies.contains(s) {
                strategies.push(*s);
            }
        }
        if strategies.is_empty() {
            strategies.push(Strategy::default());
        }

        let mut notes = Vec::new();
        let requirements = match &template {
            Some(t) if !t.accepts_area(area) => {
                notes.push(format!(
                    "Room area {:.1} m² is below the {:.1} m² minimum of template '{}'",
                    area, t.min_area, t.id
                ));
                Vec::new()
            }
            Some(t) => requirements_from_template(t),
            None if !request.object_types.is_empty() => requirements_from_types(&request.object_types),
            None => default_requirements(area),
        };

        if requirements.is_empty() {
            if notes.is_empty() {
                notes.push(format!("Room area {:.1} m² is too small for any furniture", area));
            }
            info!(room_id = %request.room_id, area, "No layout requirements for room");
            return Ok(LayoutGenerationResult {
                room_id: request.room_id.clone(),
                layouts: Vec::new(),
                recommendations: LayoutRecommendations::default(),
                summary: LayoutSummary {
                    requirements,
                    strategies,
                    generated: 0,
                    retained: 0,
                    notes,
                },
            });
        }

        let requested: u32 = requirements.iter().map(|r| r.quantity).sum();
        let mut layouts = Vec::new();

        for &strategy in &strategies {
            let runs: Vec<TypeRun<'_>> = requirements
                .iter()
                .map(|requirement| {
                    let spec = catalog::spec_for_type(&requirement.object_type);
                    let mut config = OptimizationConfig::for_kind(spec.kind);
                    if let Some(overrides) = &request.overrides {
                        config = config.with_overrides(overrides);
                    }
                    let result = optimizer::optimize_strategy(
                        &floor,
                        &requirement.object_type,
                        &spec,
                        strategy,
                        config,
                    );
                    notes.extend(result.warnings.iter().cloned());
                    TypeRun {
                        requirement,
                        spec,
                        layouts: result.layouts,
                    }
                })
                .collect();

            for (index, placements) in compose(&analysis, &runs).into_iter().enumerate() {
                layouts.push(self.evaluate(
                    format!("{}-{}", strategy, index + 1),
                    strategy,
                    None,
                    &analysis,
                    placements,
                    requested,
                    Vec::new(),
                ));
            }

            if let Some(t) = &template {
                layouts.push(self.template_layout(&analysis, t, strategy));
            }
        }

        notes.dedup();
        let generated = layouts.len();
        layouts.sort_by(|a, b| {
            b.metrics
                .score
                .partial_cmp(&a.metrics.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        layouts.retain(|l| l.validation.is_valid || l.metrics.score > RETAIN_SCORE);

        let recommendations = recommend(&layouts);
        info!(
            room_id = %request.room_id,
            generated,
            retained = layouts.len(),
            "Layout generation finished"
        );

        Ok(LayoutGenerationResult {
            room_id: request.room_id.clone(),
            recommendations,
            summary: LayoutSummary {
                requirements,
                strategies,
                generated,
                retained: layouts.len(),
                notes,
            },
            layouts,
        })
    }

    /// Lays out a template's required items in the room's best zones.
    ///
    /// Returns `Ok(None)` when the room is smaller than the template minimum.
    ///
    /// # Errors
    /// `UnknownTemplate` for an unknown id, `InvalidInput` for a degenerate floor.
    pub fn generate_from_template(
        &self,
        room: &RoomInput,
        objects: &[SceneObject],
        room_id: &str,
        template_id: &str,
        strategy: Option<Strategy>,
    ) -> PlannerResult<Option<GeneratedLayout>> {
        let template = templates::find_template(template_id)?;
        let analysis = analyzer::analyze_room(room, objects, room_id)?;

        if !template.accepts_area(analysis.geometry.area) {
            info!(
                room_id,
                template_id,
                area = analysis.geometry.area,
                min_area = template.min_area,
                "Room too small for template"
            );
            return Ok(None);
        }

        Ok(Some(self.template_layout(
            &analysis,
            &template,
            strategy.unwrap_or_default(),
        )))
    }

    fn template_layout(
        &self,
        analysis: &RoomAnalysisResult,
        template: &LayoutTemplate,
        strategy: Strategy,
    ) -> GeneratedLayout {
        let mut placements: Vec<PlannedPlacement> = Vec::new();
        let mut notes = Vec::new();

        for item in template.required_items() {
            let spec = catalog::builtin_spec(item.kind);
            let mut zones = analysis.zones_ranked(&[ZoneClass::Optimal, ZoneClass::Good]);
            if zones.iter().any(|z| z.recommends(item.kind)) {
                zones.retain(|z| z.recommends(item.kind));
            }

            let mut placed = 0;
            'zones: for zone in zones {
                for slot in zone_slots(analysis, zone.rect(), strategy) {
                    if placed >= item.required {
                        break 'zones;
                    }
                    let (position, wall_facing) = if item.wall_placement {
                        let (p, facing) = snap_to_wall(analysis, slot, spec.dimensions.depth);
                        (p, Some(facing))
                    } else {
                        (slot, None)
                    };
                    let rotation = match (item.facing, wall_facing) {
                        (Some(facing), _) => facing.rotation(),
                        (None, Some(angle)) => angle,
                        (None, None) => (analysis.geometry.centroid - position).angle(),
                    };

                    let mut candidate = PlannedPlacement::new(item.kind.code(), position, rotation);
                    candidate.wall_placement = item.wall_placement;
                    if footprint_inside(analysis, &candidate) && fits(analysis, &placements, &candidate) {
                        placements.push(candidate);
                        placed += 1;
                    }
                }
            }

            if placed < item.required {
                notes.push(format!("Placed {} of {} {}", placed, item.required, item.kind));
            }
        }

        debug!(
            template_id = %template.id,
            placements = placements.len(),
            "Template layout assembled"
        );

        let requested = template.required_items().map(|i| i.required).sum();
        self.evaluate(
            format!("{}-{}", template.id, strategy),
            strategy,
            Some(template.id.clone()),
            analysis,
            placements,
            requested,
            notes,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        id: String,
        strategy: Strategy,
        template_id: Option<String>,
        analysis: &RoomAnalysisResult,
        placements: Vec<PlannedPlacement>,
        requested: u32,
        notes: Vec<String>,
    ) -> GeneratedLayout {
        let validation = self.validator.validate(analysis, &placements);
        let sub = validation.sub_scores;
        let safety_violations = validation
            .violations
            .iter()
            .filter(|v| v.category == IssueCategory::Safety)
            .count();

        let mut metrics = LayoutMetrics {
            score: 0.0,
            space_efficiency: if requested == 0 {
                0.0
            } else {
                (100.0 * placements.len() as f64 / requested as f64).min(100.0)
            },
            accessibility: 0.5 * (sub.ada_pathway_width + sub.maneuvering_space),
            ergonomics: sub.workflow_efficiency,
            safety: (sub.fire_egress - 20.0 * safety_violations as f64).clamp(0.0, 100.0),
        };
        metrics.score = validation.score.unwrap_or_else(|| metrics.blended());

        let zone_summaries = analysis
            .zones
            .iter()
            .filter(|z| z.class != ZoneClass::Restricted)
            .map(|z| {
                let rect = z.rect();
                ZoneSummary {
                    zone_id: z.id.clone(),
                    class: z.class,
                    placements: placements.iter().filter(|p| rect.contains(p.position)).count(),
                }
            })
            .collect();

        GeneratedLayout {
            id,
            strategy,
            template_id,
            placements,
            metrics,
            validation,
            zone_summaries,
            notes,
        }
    }
}

/// Index-aligned composites: composite `c` draws each type's candidates from
/// index `c` on, skipping ones that clash with what is already placed.
fn compose(analysis: &RoomAnalysisResult, runs: &[TypeRun<'_>]) -> Vec<Vec<PlannedPlacement>> {
    let mut composites: Vec<Vec<PlannedPlacement>> = Vec::new();

    for c in 0..MAX_COMPOSITES {
        let mut placements: Vec<PlannedPlacement> = Vec::new();
        for run in runs {
            let mut taken = 0;
            for layout in run.layouts.iter().skip(c) {
                if taken >= run.requirement.quantity {
                    break;
                }
                let candidate =
                    PlannedPlacement::from_layout(&run.requirement.object_type, &run.spec, layout);
                if fits(analysis, &placements, &candidate) {
                    placements.push(candidate);
                    taken += 1;
                }
            }
        }

        let duplicate = composites.iter().any(|existing| {
            existing.len() == placements.len()
                && existing
                    .iter()
                    .zip(&placements)
                    .all(|(a, b)| a.position.distance_to(&b.position) < EPSILON_GENERAL)
        });
        if !placements.is_empty() && !duplicate {
            composites.push(placements);
        }
    }
    composites
}

/// Free of other placements, doors and the clearance of existing objects.
fn fits(analysis: &RoomAnalysisResult, placed: &[PlannedPlacement], candidate: &PlannedPlacement) -> bool {
    if !analysis.contains(candidate.position) {
        return false;
    }
    if placed.iter().any(|p| candidate.gap_to(p) < PLACEMENT_GAP) {
        return false;
    }
    analysis.blocking_obstacles().all(|obstacle| {
        let keep_clear = if obstacle.kind == ConstraintKind::Door {
            obstacle.clearance_required.max(DOOR_KEEP_CLEAR)
        } else {
            obstacle.clearance_required
        };
        candidate.gap_to(obstacle) >= keep_clear
    })
}

fn footprint_inside(analysis: &RoomAnalysisResult, candidate: &PlannedPlacement) -> bool {
    candidate.corners().iter().all(|c| {
        analysis.contains(*c) || analysis.distance_to_wall(*c) <= EPSILON_GENERAL
    })
}

/// Slot points inside a zone rectangle, ordered by strategy.
fn zone_slots(analysis: &RoomAnalysisResult, rect: crate::types::Rect, strategy: Strategy) -> Vec<Vec2> {
    let nx = (rect.width() / SLOT_STEP).round() as usize;
    let nz = (rect.depth() / SLOT_STEP).round() as usize;
    let mut slots = Vec::with_capacity((nx + 1) * (nz + 1));
    for j in 0..=nz {
        for i in 0..=nx {
            let p = Vec2::new(
                rect.min.x + i as f64 * SLOT_STEP,
                rect.min.z + j as f64 * SLOT_STEP,
            );
            if analysis.contains(p) {
                slots.push(p);
            }
        }
    }

    let centroid = analysis.geometry.centroid;
    let key = |p: &Vec2| -> f64 {
        match strategy {
            Strategy::Maximize => analysis.distance_to_wall(*p),
            Strategy::Comfort => -analysis.distance_to_wall(*p),
            Strategy::Ergonomic => -p.distance_to(&centroid),
            Strategy::Aesthetic => p.distance_to(&centroid),
        }
    };
    slots.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal));
    slots
}

/// Moves `point` towards its nearest wall until the object's back keeps the
/// snap clearance. Returns the new position and a heading facing into the room.
fn snap_to_wall(analysis: &RoomAnalysisResult, point: Vec2, depth: f64) -> (Vec2, f64) {
    let nearest = analysis.walls.iter().min_by(|a, b| {
        let da = geometry::distance_point_to_segment(point, a.start, a.end);
        let db = geometry::distance_point_to_segment(point, b.start, b.end);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    match nearest {
        Some(wall) => {
            let foot = geometry::closest_point_on_segment(point, wall.start, wall.end);
            let target = foot + wall.normal * (WALL_SNAP_CLEARANCE + depth / 2.0);
            (target, wall.normal.angle())
        }
        None => (point, 0.0),
    }
}

fn recommend(layouts: &[GeneratedLayout]) -> LayoutRecommendations {
    let best_by = |metric: fn(&LayoutMetrics) -> f64| {
        layouts
            .iter()
            .fold(None::<&GeneratedLayout>, |best, l| match best {
                Some(b) if metric(&b.metrics) >= metric(&l.metrics) => Some(b),
                _ => Some(l),
            })
            .map(|l| l.id.clone())
    };

    let preferred = layouts.first().map(|l| l.id.clone());
    LayoutRecommendations {
        alternatives: layouts
            .iter()
            .skip(1)
            .take(3)
            .map(|l| l.id.clone())
            .collect(),
        most_efficient: best_by(|m| m.space_efficiency),
        most_accessible: best_by(|m| m.accessibility),
        preferred,
    }
}
