//! Interactive collision detection and resolution.
//!
//! A [`CollisionResolver`] is created per scene or editing session. It keeps a
//! bounding-box cache keyed by object id, a capped audit log and running
//! performance counters. The scene itself is only read, through the
//! [`BoundsResolver`] trait; applying a resolved position is the caller's job.

use std::collections::{HashMap, VecDeque};
use std::f64::consts::PI;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::model::Scene;
use crate::types::{BoundingBox, EPSILON_GENERAL, Vec3};

/// Maximum number of retained collision events.
pub const MAX_COLLISION_EVENTS: usize = 1000;

/// Hard cap on candidate positions evaluated by one resolution.
pub const MAX_POSITIONS_TESTED: usize = 5000;

/// Number of rays used by [`SearchPattern::Radial`].
const RADIAL_RAYS: usize = 16;

/// Resolves object ids to world-space geometry.
pub trait BoundsResolver {
    /// World-space bounding box of an object.
    fn world_bounds(&self, id: &str) -> Option<BoundingBox>;

    /// World position of an object's pivot.
    fn world_position(&self, id: &str) -> Option<Vec3>;

    /// Ids of all objects that take part in collision tests.
    fn collidable_ids(&self) -> Vec<String>;
}

impl BoundsResolver for Scene {
    fn world_bounds(&self, id: &str) -> Option<BoundingBox> {
        self.get(id).map(|o| o.bounds)
    }

    fn world_position(&self, id: &str) -> Option<Vec3> {
        self.get(id).map(|o| o.position)
    }

    fn collidable_ids(&self) -> Vec<String> {
        self.objects()
            .iter()
            .filter(|o| o.is_collidable())
            .map(|o| o.id.clone())
            .collect()
    }
}

/// Order in which candidate positions are visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchPattern {
    /// Archimedean spiral with roughly one step between samples.
    #[default]
    Spiral,
    /// Fixed angular rays at increasing radii.
    Radial,
    /// Expanding square lattice rings.
    Grid,
}

impl SearchPattern {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "spiral" => Some(SearchPattern::Spiral),
            "radial" => Some(SearchPattern::Radial),
            "grid" => Some(SearchPattern::Grid),
            _ => None,
        }
    }
}

/// Configuration for collision resolution.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollisionConfig {
    pub enabled: bool,
    /// Distance between neighbouring candidates, at least [`Self::MIN_STEP_SIZE`].
    pub search_step_size: f64,
    /// Search radius, clamped to `MIN_SEARCH_DISTANCE..=MAX_SEARCH_DISTANCE`.
    pub max_search_distance: f64,
    pub search_pattern: SearchPattern,
    /// Only accept positions on multiples of the step size. A free candidate
    /// whose snapped position collides is skipped and the search goes on.
    pub respect_grid_snap: bool,
    /// Retry above and below when no horizontal position is free.
    pub search_vertical: bool,
    pub vertical_step_size: f64,
}

impl CollisionConfig {
    pub const DEFAULT_STEP_SIZE: f64 = 0.25;
    pub const DEFAULT_MAX_SEARCH_DISTANCE: f64 = 5.0;
    pub const DEFAULT_VERTICAL_STEP_SIZE: f64 = 0.5;
    pub const MIN_STEP_SIZE: f64 = 0.1;
    pub const MIN_SEARCH_DISTANCE: f64 = 1.0;
    pub const MAX_SEARCH_DISTANCE: f64 = 50.0;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> CollisionConfigBuilder {
        CollisionConfigBuilder::default()
    }

    /// Returns a copy with step sizes clamped to their minimums and the
    /// search distance to its allowed range.
    pub fn clamped(mut self) -> Self {
        self.search_step_size = clamp_min(self.search_step_size, Self::MIN_STEP_SIZE, Self::DEFAULT_STEP_SIZE);
        self.max_search_distance = clamp_min(
            self.max_search_distance,
            Self::MIN_SEARCH_DISTANCE,
            Self::DEFAULT_MAX_SEARCH_DISTANCE,
        )
        .min(Self::MAX_SEARCH_DISTANCE);
        self.vertical_step_size = clamp_min(
            self.vertical_step_size,
            Self::MIN_STEP_SIZE,
            Self::DEFAULT_VERTICAL_STEP_SIZE,
        );
        self
    }

    /// Applies the set fields of `update`, then clamps.
    pub fn merged(&self, update: &CollisionConfigUpdate) -> Self {
        Self {
            enabled: update.enabled.unwrap_or(self.enabled),
            search_step_size: update.search_step_size.unwrap_or(self.search_step_size),
            max_search_distance: update.max_search_distance.unwrap_or(self.max_search_distance),
            search_pattern: update.search_pattern.unwrap_or(self.search_pattern),
            respect_grid_snap: update.respect_grid_snap.unwrap_or(self.respect_grid_snap),
            search_vertical: update.search_vertical.unwrap_or(self.search_vertical),
            vertical_step_size: update.vertical_step_size.unwrap_or(self.vertical_step_size),
        }
        .clamped()
    }
}

fn clamp_min(value: f64, min: f64, fallback: f64) -> f64 {
    if value.is_finite() { value.max(min) } else { fallback }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_step_size: Self::DEFAULT_STEP_SIZE,
            max_search_distance: Self::DEFAULT_MAX_SEARCH_DISTANCE,
            search_pattern: SearchPattern::Spiral,
            respect_grid_snap: false,
            search_vertical: false,
            vertical_step_size: Self::DEFAULT_VERTICAL_STEP_SIZE,
        }
    }
}

/// Builder for [`CollisionConfig`].
#[derive(Clone, Debug, Default)]
pub struct CollisionConfigBuilder {
    config: CollisionConfig,
}

impl CollisionConfigBuilder {
    pub fn enabled(mut self, value: bool) -> Self {
        self.config.enabled = value;
        self
    }

    pub fn search_step_size(mut self, value: f64) -> Self {
        self.config.search_step_size = value;
        self
    }

    pub fn max_search_distance(mut self, value: f64) -> Self {
        self.config.max_search_distance = value;
        self
    }

    pub fn search_pattern(mut self, value: SearchPattern) -> Self {
        self.config.search_pattern = value;
        self
    }

    pub fn respect_grid_snap(mut self, value: bool) -> Self {
        self.config.respect_grid_snap = value;
        self
    }

    pub fn search_vertical(mut self, value: bool) -> Self {
        self.config.search_vertical = value;
        self
    }

    pub fn vertical_step_size(mut self, value: f64) -> Self {
        self.config.vertical_step_size = value;
        self
    }

    pub fn build(self) -> CollisionConfig {
        self.config.clamped()
    }
}

/// Partial configuration, merged into the resolver's current settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollisionConfigUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub search_step_size: Option<f64>,
    #[serde(default)]
    pub max_search_distance: Option<f64>,
    #[serde(default)]
    pub search_pattern: Option<SearchPattern>,
    #[serde(default)]
    pub respect_grid_snap: Option<bool>,
    #[serde(default)]
    pub search_vertical: Option<bool>,
    #[serde(default)]
    pub vertical_step_size: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollisionDetail {
    pub object_id: String,
    pub center_distance: f64,
    pub overlap_volume: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollisionReport {
    pub object_id: String,
    pub has_collision: bool,
    pub colliding_object_ids: Vec<String>,
    pub collisions: Vec<CollisionDetail>,
}

impl CollisionReport {
    fn new(object_id: &str, collisions: Vec<CollisionDetail>) -> Self {
        Self {
            object_id: object_id.to_string(),
            has_collision: !collisions.is_empty(),
            colliding_object_ids: collisions.iter().map(|c| c.object_id.clone()).collect(),
            collisions,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollisionResolution {
    pub object_id: String,
    pub resolved: bool,
    pub original_position: Vec3,
    /// Equals `original_position` when nothing was found.
    pub new_position: Vec3,
    pub distance_moved: f64,
    pub positions_tested: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollisionOperation {
    Detect,
    Resolve,
    Move,
    Place,
}

/// Audit trail entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollisionEvent {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub operation: CollisionOperation,
    pub object_id: String,
    pub has_collision: bool,
    #[serde(default)]
    pub resolved: Option<bool>,
    /// Set when the user accepted a colliding position on purpose.
    #[serde(default)]
    pub user_override: bool,
}

impl CollisionEvent {
    pub fn new(operation: CollisionOperation, object_id: impl Into<String>, has_collision: bool) -> Self {
        Self {
            timestamp_ms: now_millis(),
            operation,
            object_id: object_id.into(),
            has_collision,
            resolved: None,
            user_override: false,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceStats {
    pub detections: u64,
    pub average_detection_ms: f64,
    pub resolutions: u64,
    pub average_resolution_ms: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl PerformanceStats {
    fn record_detection(&mut self, elapsed_ms: f64) {
        self.detections += 1;
        self.average_detection_ms += (elapsed_ms - self.average_detection_ms) / self.detections as f64;
    }

    fn record_resolution(&mut self, elapsed_ms: f64) {
        self.resolutions += 1;
        self.average_resolution_ms += (elapsed_ms - self.average_resolution_ms) / self.resolutions as f64;
    }
}

/// Stateful collision detector and resolver for one scene.
#[derive(Clone, Debug, Default)]
pub struct CollisionResolver {
    config: CollisionConfig,
    bounds_cache: HashMap<String, BoundingBox>,
    events: VecDeque<CollisionEvent>,
    stats: PerformanceStats,
}

impl CollisionResolver {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config: config.clamped(),
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Merges `update` into the current configuration.
    pub fn update_config(&mut self, update: &CollisionConfigUpdate) {
        self.config = self.config.merged(update);
        debug!(config = ?self.config, "Collision config updated");
    }

    /// Drops the cached box of one object. Call after moving it.
    pub fn invalidate_cache(&mut self, id: &str) {
        self.bounds_cache.remove(id);
    }

    pub fn clear_cache(&mut self) {
        self.bounds_cache.clear();
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.stats
    }

    /// Appends to the audit log, dropping the oldest entry beyond the cap.
    pub fn log_collision_event(&mut self, event: CollisionEvent) {
        if self.events.len() >= MAX_COLLISION_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Most recent events in chronological order, at most `limit` of them.
    pub fn collision_events(&self, limit: Option<usize>) -> Vec<CollisionEvent> {
        let take = limit.unwrap_or(self.events.len()).min(self.events.len());
        self.events
            .iter()
            .skip(self.events.len() - take)
            .cloned()
            .collect()
    }

    fn cached_bounds<R: BoundsResolver + ?Sized>(&mut self, scene: &R, id: &str) -> Option<BoundingBox> {
        if let Some(bounds) = self.bounds_cache.get(id) {
            self.stats.cache_hits += 1;
            return Some(*bounds);
        }
        self.stats.cache_misses += 1;
        let bounds = scene.world_bounds(id)?;
        self.bounds_cache.insert(id.to_string(), bounds);
        Some(bounds)
    }

    /// Checks an object against all other collidable objects.
    ///
    /// With `test_position` the object's box is moved there hypothetically;
    /// the scene is not touched. Unknown ids report no collision.
    pub fn detect_collisions<R: BoundsResolver + ?Sized>(
        &mut self,
        scene: &R,
        id: &str,
        test_position: Option<Vec3>,
        exclude_ids: &[String],
    ) -> CollisionReport {
        let started = Instant::now();
        let collisions = match (self.cached_bounds(scene, id), scene.world_position(id)) {
            (Some(bounds), Some(position)) => {
                let subject = match test_position {
                    Some(target) => bounds.translated(target - position),
                    None => bounds,
                };
                self.collisions_for(scene, id, &subject, exclude_ids)
            }
            _ => Vec::new(),
        };
        self.stats
            .record_detection(started.elapsed().as_secs_f64() * 1000.0);
        CollisionReport::new(id, collisions)
    }

    fn collisions_for<R: BoundsResolver + ?Sized>(
        &mut self,
        scene: &R,
        id: &str,
        subject: &BoundingBox,
        exclude_ids: &[String],
    ) -> Vec<CollisionDetail> {
        let mut collisions = Vec::new();
        for other_id in scene.collidable_ids() {
            if other_id == id || exclude_ids.contains(&other_id) {
                continue;
            }
            let Some(other) = self.cached_bounds(scene, &other_id) else {
                continue;
            };
            if subject.intersects(&other) {
                collisions.push(CollisionDetail {
                    center_distance: subject.center().distance_to(&other.center()),
                    overlap_volume: subject.overlap_volume(&other),
                    object_id: other_id,
                });
            }
        }
        collisions
    }

    /// Searches for the nearest collision-free position of an object.
    ///
    /// The scene is not modified. `positions_tested` counts every candidate
    /// evaluated, including the initial check at the current position.
    pub fn resolve_collisions<R: BoundsResolver + ?Sized>(
        &mut self,
        scene: &R,
        id: &str,
        exclude_ids: &[String],
        config_override: Option<&CollisionConfigUpdate>,
    ) -> CollisionResolution {
        let started = Instant::now();
        let config = match config_override {
            Some(update) => self.config.merged(update),
            None => self.config,
        };
        let origin = scene.world_position(id).unwrap_or_default();

        let (resolution, was_colliding) = if !config.enabled {
            (unresolved(id, origin, 0), false)
        } else {
            self.search(scene, id, origin, exclude_ids, &config)
        };

        self.stats
            .record_resolution(started.elapsed().as_secs_f64() * 1000.0);
        let mut event = CollisionEvent::new(CollisionOperation::Resolve, id, was_colliding);
        event.resolved = Some(resolution.resolved);
        self.log_collision_event(event);

        info!(
            object_id = id,
            resolved = resolution.resolved,
            distance_moved = resolution.distance_moved,
            positions_tested = resolution.positions_tested,
            "Collision resolution finished"
        );
        resolution
    }

    fn search<R: BoundsResolver + ?Sized>(
        &mut self,
        scene: &R,
        id: &str,
        origin: Vec3,
        exclude_ids: &[String],
        config: &CollisionConfig,
    ) -> (CollisionResolution, bool) {
        let Some(bounds) = self.cached_bounds(scene, id) else {
            // unknown objects never collide
            return (resolved(id, origin, origin, 1), false);
        };

        let mut tested = 1;
        if self.collisions_for(scene, id, &bounds, exclude_ids).is_empty() {
            return (resolved(id, origin, origin, tested), false);
        }

        let offsets = search_offsets(config, MAX_POSITIONS_TESTED + 1);
        let mut layers = vec![0.0];
        if config.search_vertical {
            layers.extend([config.vertical_step_size, -config.vertical_step_size]);
        }

        for dy in layers {
            // the vertical layers also try straight up or down first
            let start = if dy == 0.0 { 1 } else { 0 };
            for &(dx, dz) in &offsets[start..] {
                if tested >= MAX_POSITIONS_TESTED {
                    debug!(object_id = id, tested, "Collision search budget exhausted");
                    return (unresolved(id, origin, tested), true);
                }
                let candidate = Vec3::new(origin.x + dx, origin.y + dy, origin.z + dz);
                tested += 1;
                if !self.is_free(scene, id, &bounds, origin, candidate, exclude_ids) {
                    continue;
                }

                if config.respect_grid_snap {
                    let snapped = snap_to_grid(candidate, config.search_step_size);
                    if snapped.distance_to(&candidate) > EPSILON_GENERAL {
                        if tested >= MAX_POSITIONS_TESTED {
                            continue;
                        }
                        tested += 1;
                        if !self.is_free(scene, id, &bounds, origin, snapped, exclude_ids) {
                            continue;
                        }
                        return (resolved(id, origin, snapped, tested), true);
                    }
                }
                return (resolved(id, origin, candidate, tested), true);
            }
        }

        (unresolved(id, origin, tested), true)
    }

    fn is_free<R: BoundsResolver + ?Sized>(
        &mut self,
        scene: &R,
        id: &str,
        bounds: &BoundingBox,
        origin: Vec3,
        candidate: Vec3,
        exclude_ids: &[String],
    ) -> bool {
        let moved = bounds.translated(candidate - origin);
        self.collisions_for(scene, id, &moved, exclude_ids).is_empty()
    }
}

fn resolved(id: &str, origin: Vec3, position: Vec3, tested: usize) -> CollisionResolution {
    CollisionResolution {
        object_id: id.to_string(),
        resolved: true,
        original_position: origin,
        new_position: position,
        distance_moved: origin.distance_to(&position),
        positions_tested: tested,
    }
}

fn unresolved(id: &str, origin: Vec3, tested: usize) -> CollisionResolution {
    CollisionResolution {
        object_id: id.to_string(),
        resolved: false,
        original_position: origin,
        new_position: origin,
        distance_moved: 0.0,
        positions_tested: tested,
    }
}

fn snap_to_grid(position: Vec3, step: f64) -> Vec3 {
    Vec3::new(
        (position.x / step).round() * step,
        position.y,
        (position.z / step).round() * step,
    )
}

/// Horizontal offsets `(dx, dz)` in visiting order, starting with `(0, 0)`.
///
/// At most `limit` offsets are produced, whatever the search distance.
fn search_offsets(config: &CollisionConfig, limit: usize) -> Vec<(f64, f64)> {
    let step = config.search_step_size;
    let max = config.max_search_distance;
    let mut offsets = vec![(0.0, 0.0)];

    match config.search_pattern {
        SearchPattern::Spiral => {
            let mut theta = 2.0 * PI;
            while offsets.len() < limit {
                let r = step * theta / (2.0 * PI);
                if r > max + EPSILON_GENERAL {
                    break;
                }
                offsets.push((r * theta.sin(), r * theta.cos()));
                theta += step / r.max(step);
            }
        }
        SearchPattern::Radial => {
            let mut ring = 1;
            while offsets.len() < limit && ring as f64 * step <= max + EPSILON_GENERAL {
                let r = ring as f64 * step;
                for k in 0..RADIAL_RAYS {
                    let angle = k as f64 * 2.0 * PI / RADIAL_RAYS as f64;
                    offsets.push((r * angle.sin(), r * angle.cos()));
                }
                ring += 1;
            }
        }
        SearchPattern::Grid => {
            let mut k: i64 = 1;
            while offsets.len() < limit && k as f64 * step <= max + EPSILON_GENERAL {
                let mut ring: Vec<(f64, f64)> = square_ring(k)
                    .map(|(i, j)| (i as f64 * step, j as f64 * step))
                    .filter(|(dx, dz)| dx.hypot(*dz) <= max + EPSILON_GENERAL)
                    .collect();
                ring.sort_by(|a, b| {
                    a.0.hypot(a.1)
                        .partial_cmp(&b.0.hypot(b.1))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                offsets.extend(ring);
                k += 1;
            }
        }
    }
    offsets.truncate(limit);
    offsets
}

/// Lattice cells on the border of the square of half-width `k`.
fn square_ring(k: i64) -> impl Iterator<Item = (i64, i64)> {
    let horizontal = (-k..=k).flat_map(move |i| [(i, -k), (i, k)]);
    let vertical = (-k + 1..k).flat_map(move |j| [(-k, j), (k, j)]);
    horizontal.chain(vertical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SceneObject;

    fn cube(id: &str, x: f64, z: f64, size: f64) -> SceneObject {
        SceneObject::new(id, "box", Vec3::new(x, 0.0, z), Vec3::new(size, 1.0, size))
    }

    #[test]
    fn detects_overlap_and_ignores_touching() {
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 1.0), cube("b", 0.5, 0.0, 1.0), cube("c", 3.0, 0.0, 1.0)]);
        let mut resolver = CollisionResolver::new(CollisionConfig::default());

        let report = resolver.detect_collisions(&scene, "a", None, &[]);
        assert!(report.has_collision);
        assert_eq!(report.colliding_object_ids, vec!["b".to_string()]);
        assert!((report.collisions[0].center_distance - 0.5).abs() < 1e-9);
        assert!((report.collisions[0].overlap_volume - 0.5).abs() < 1e-9);

        // touching faces do not collide
        let report = resolver.detect_collisions(&scene, "a", Some(Vec3::new(2.0, 0.0, 0.0)), &[]);
        assert!(!report.has_collision);

        let report = resolver.detect_collisions(&scene, "a", None, &["b".to_string()]);
        assert!(!report.has_collision);
    }

    #[test]
    fn unknown_and_hidden_objects_do_not_collide() {
        let mut hidden = cube("hidden", 0.0, 0.0, 1.0);
        hidden.visible = false;
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 1.0), hidden]);
        let mut resolver = CollisionResolver::default();

        assert!(!resolver.detect_collisions(&scene, "a", None, &[]).has_collision);
        assert!(!resolver.detect_collisions(&scene, "ghost", None, &[]).has_collision);
    }

    #[test]
    fn non_colliding_object_is_left_in_place() {
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 1.0), cube("b", 5.0, 0.0, 1.0)]);
        let mut resolver = CollisionResolver::new(CollisionConfig::default());

        let result = resolver.resolve_collisions(&scene, "a", &[], None);
        assert!(result.resolved);
        assert_eq!(result.distance_moved, 0.0);
        assert_eq!(result.positions_tested, 1);
    }

    #[test]
    fn spiral_search_finds_nearby_position() {
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 1.0), cube("b", 0.5, 0.0, 1.0)]);
        let config = CollisionConfig::builder()
            .search_pattern(SearchPattern::Spiral)
            .search_step_size(0.5)
            .build();
        let mut resolver = CollisionResolver::new(config);

        let result = resolver.resolve_collisions(&scene, "a", &[], None);
        assert!(result.resolved);
        assert!(result.distance_moved > 0.0 && result.distance_moved < 2.0);
        assert!(result.positions_tested > 1);
        assert!(!resolver
            .detect_collisions(&scene, "a", Some(result.new_position), &[])
            .has_collision);
        // the scene itself is untouched
        assert_eq!(scene.get("a").unwrap().position, Vec3::zero());
    }

    #[test]
    fn radial_and_grid_patterns_resolve() {
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 1.0), cube("b", 0.5, 0.0, 1.0)]);
        for pattern in [SearchPattern::Radial, SearchPattern::Grid] {
            let mut resolver = CollisionResolver::new(
                CollisionConfig::builder().search_pattern(pattern).build(),
            );
            let result = resolver.resolve_collisions(&scene, "a", &[], None);
            assert!(result.resolved, "{pattern:?} did not resolve");
            assert!(result.distance_moved <= CollisionConfig::DEFAULT_MAX_SEARCH_DISTANCE + 1e-9);
        }
    }

    #[test]
    fn surrounded_object_is_not_resolved() {
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 0.5), cube("slab", 0.0, 0.0, 10.0)]);
        let config = CollisionConfig::builder().max_search_distance(1.0).build();
        let mut resolver = CollisionResolver::new(config);

        let result = resolver.resolve_collisions(&scene, "a", &[], None);
        assert!(!result.resolved);
        assert_eq!(result.new_position, result.original_position);
        assert!(result.positions_tested > 1);
    }

    #[test]
    fn vertical_fallback_lifts_over_flat_obstacles() {
        let scene = Scene::from_objects([
            SceneObject::new("a", "box", Vec3::zero(), Vec3::new(0.5, 0.3, 0.5)),
            SceneObject::new("slab", "rug", Vec3::zero(), Vec3::new(10.0, 0.3, 10.0)),
        ]);
        let config = CollisionConfig::builder()
            .max_search_distance(1.0)
            .search_vertical(true)
            .vertical_step_size(0.5)
            .build();
        let mut resolver = CollisionResolver::new(config);

        let result = resolver.resolve_collisions(&scene, "a", &[], None);
        assert!(result.resolved);
        assert!((result.new_position.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn disabled_resolver_tests_nothing() {
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 1.0), cube("b", 0.5, 0.0, 1.0)]);
        let mut resolver = CollisionResolver::new(CollisionConfig::default());
        let update = CollisionConfigUpdate {
            enabled: Some(false),
            ..Default::default()
        };

        let result = resolver.resolve_collisions(&scene, "a", &[], Some(&update));
        assert!(!result.resolved);
        assert_eq!(result.positions_tested, 0);
        assert!(resolver.config().enabled);
    }

    #[test]
    fn grid_snap_rounds_accepted_position() {
        let scene = Scene::from_objects([cube("a", 0.1, 0.1, 1.0), cube("b", 0.6, 0.1, 1.0)]);
        let config = CollisionConfig::builder()
            .search_pattern(SearchPattern::Grid)
            .search_step_size(0.5)
            .respect_grid_snap(true)
            .build();
        let mut resolver = CollisionResolver::new(config);

        let result = resolver.resolve_collisions(&scene, "a", &[], None);
        assert!(result.resolved);
        let p = result.new_position;
        assert!(((p.x / 0.5).round() * 0.5 - p.x).abs() < 1e-9);
        assert!(((p.z / 0.5).round() * 0.5 - p.z).abs() < 1e-9);
    }

    #[test]
    fn offsets_stay_within_the_position_budget() {
        for pattern in [SearchPattern::Spiral, SearchPattern::Radial, SearchPattern::Grid] {
            let config = CollisionConfig {
                search_step_size: 0.1,
                max_search_distance: 1e5,
                search_pattern: pattern,
                ..Default::default()
            };
            let offsets = search_offsets(&config, MAX_POSITIONS_TESTED + 1);
            assert_eq!(offsets.len(), MAX_POSITIONS_TESTED + 1, "{pattern:?}");
            assert_eq!(offsets[0], (0.0, 0.0));
        }

        assert_eq!(square_ring(1).count(), 8);
        assert_eq!(square_ring(3).count(), 24);
    }

    #[test]
    fn large_search_distance_is_bounded() {
        let scene = Scene::from_objects([cube("a", 0.0, 0.0, 0.5), cube("slab", 0.0, 0.0, 1000.0)]);
        for pattern in [SearchPattern::Radial, SearchPattern::Grid] {
            let mut resolver = CollisionResolver::default();
            let update = CollisionConfigUpdate {
                search_step_size: Some(0.1),
                max_search_distance: Some(150.0),
                search_pattern: Some(pattern),
                ..Default::default()
            };

            let started = Instant::now();
            let result = resolver.resolve_collisions(&scene, "a", &[], Some(&update));
            assert!(!result.resolved, "{pattern:?}");
            assert_eq!(result.positions_tested, MAX_POSITIONS_TESTED);
            assert!(started.elapsed().as_secs_f64() < 5.0, "{pattern:?} took too long");
        }

        let config = CollisionConfig::builder().max_search_distance(1e6).build();
        assert!((config.max_search_distance - CollisionConfig::MAX_SEARCH_DISTANCE).abs() < 1e-9);
    }

    #[test]
    fn snapped_collisions_keep_searching() {
        // the first free candidate (0.5, -0.5) snaps onto the post at (1, -1)
        let scene = Scene::from_objects([
            cube("a", 0.5, 0.5, 0.5),
            cube("b", 0.5, 0.5, 0.5),
            cube("post", 1.0, -1.0, 0.5),
        ]);
        let config = CollisionConfig::builder()
            .search_pattern(SearchPattern::Grid)
            .search_step_size(1.0)
            .max_search_distance(3.0)
            .respect_grid_snap(true)
            .build();
        let mut resolver = CollisionResolver::new(config);

        let result = resolver.resolve_collisions(&scene, "a", &[], None);
        assert!(result.resolved);
        let p = result.new_position;
        assert!((p.x - p.x.round()).abs() < 1e-9 && (p.z - p.z.round()).abs() < 1e-9);
        assert!((p.x - 1.0).abs() > 1e-9 || (p.z + 1.0).abs() > 1e-9);
        assert!(!resolver.detect_collisions(&scene, "a", Some(p), &[]).has_collision);
    }

    #[test]
    fn update_config_clamps_degenerate_values() {
        let mut resolver = CollisionResolver::default();
        resolver.update_config(&CollisionConfigUpdate {
            search_step_size: Some(0.0),
            max_search_distance: Some(0.2),
            search_pattern: Some(SearchPattern::Radial),
            ..Default::default()
        });
        let config = resolver.config();
        assert!((config.search_step_size - CollisionConfig::MIN_STEP_SIZE).abs() < 1e-9);
        assert!((config.max_search_distance - CollisionConfig::MIN_SEARCH_DISTANCE).abs() < 1e-9);
        assert_eq!(config.search_pattern, SearchPattern::Radial);
    }

    #[test]
    fn event_log_is_capped() {
        let mut resolver = CollisionResolver::default();
        for i in 0..MAX_COLLISION_EVENTS + 25 {
            resolver.log_collision_event(CollisionEvent::new(CollisionOperation::Move, format!("obj-{i}"), false));
        }
        let events = resolver.collision_events(None);
        assert_eq!(events.len(), MAX_COLLISION_EVENTS);
        let last = resolver.collision_events(Some(1));
        assert_eq!(last[0].object_id, format!("obj-{}", MAX_COLLISION_EVENTS + 24));
        assert_eq!(events[0].object_id, "obj-25");
    }

    #[test]
    fn cache_is_invalidated_after_moves() {
        let mut scene = Scene::from_objects([cube("a", 0.0, 0.0, 1.0), cube("b", 0.5, 0.0, 1.0)]);
        let mut resolver = CollisionResolver::default();
        assert!(resolver.detect_collisions(&scene, "a", None, &[]).has_collision);

        scene.move_object("b", Vec3::new(4.0, 0.0, 0.0));
        // stale cache still sees the old box
        assert!(resolver.detect_collisions(&scene, "a", None, &[]).has_collision);
        resolver.invalidate_cache("b");
        assert!(!resolver.detect_collisions(&scene, "a", None, &[]).has_collision);

        let stats = resolver.performance_stats();
        assert_eq!(stats.detections, 3);
        assert!(stats.cache_hits > 0);
    }
}
