//! Scoring of proposed placements for accessibility, safety and ergonomics.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::analyzer::{ConstraintKind, Priority, RoomAnalysisResult};
use crate::catalog::{self, FurnitureKind};
use crate::geometry;
use crate::layout::PlannedPlacement;
use crate::optimizer::MIN_ACCESS_WIDTH;
use crate::types::{EPSILON_GENERAL, Footprint};

/// Placements closer than this to a door block it.
pub const DOOR_KEEP_CLEAR: f64 = 1.0;

/// Gap between two placements below which passing between them is hard.
const MIN_PASSAGE: f64 = 0.6;

/// Points deducted from the overall score per violation.
const VIOLATION_PENALTY: f64 = 10.0;

/// Area of concern a [`ValidationIssue`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Clearance,
    Accessibility,
    Safety,
    Ergonomics,
}

/// A single violation or warning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    /// Human-readable description naming the furniture involved.
    pub message: String,
    /// Indices into the validated placement list.
    #[serde(default)]
    pub placements: Vec<usize>,
}

impl ValidationIssue {
    fn new(category: IssueCategory, message: String, placements: Vec<usize>) -> Self {
        Self {
            category,
            message,
            placements,
        }
    }
}

/// Compliance sub-scores, each on a 0–100 scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComplianceScores {
    /// Percentage of access paths that keep their full width.
    pub ada_pathway_width: f64,
    /// Mean free space around each placement against the minimum access width.
    pub maneuvering_space: f64,
    /// Loses 50 per blocked door, drops to 0 when a fire exit is blocked.
    pub fire_egress: f64,
    /// Percentage of satisfiable grouping rules that hold.
    pub workflow_efficiency: f64,
}

impl ComplianceScores {
    /// Unweighted mean of the four sub-scores.
    pub fn mean(&self) -> f64 {
        (self.ada_pathway_width + self.maneuvering_space + self.fire_egress + self.workflow_efficiency)
            / 4.0
    }
}

/// Outcome of validating a placement set.
///
/// # Fields
/// * `score` - Overall 0–100 score; `None` when the validator does not compute one
/// * `is_valid` - `true` when there are no violations
/// * `violations` - Issues that make the layout unusable
/// * `warnings` - Issues worth fixing that do not invalidate the layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationReport {
    pub score: Option<f64>,
    pub is_valid: bool,
    pub violations: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub sub_scores: ComplianceScores,
}

/// Validates a set of proposed placements in an analyzed room.
pub trait PlacementValidator: Send + Sync {
    /// Checks `placements` against the room's walls, doors and paths.
    fn validate(&self, analysis: &RoomAnalysisResult, placements: &[PlannedPlacement]) -> ValidationReport;
}

/// Built-in heuristic validator.
///
/// Placements outside the room, too close to a door or overlapping any
/// other footprint are violations. Everything else it checks is reported as
/// a warning. The score is the mean sub-score minus a fixed penalty per
/// violation.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardValidator;

impl PlacementValidator for StandardValidator {
    fn validate(&self, analysis: &RoomAnalysisResult, placements: &[PlannedPlacement]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        for (i, p) in placements.iter().enumerate() {
            if !analysis.contains(p.position) {
                violations.push(ValidationIssue::new(
                    IssueCategory::Safety,
                    format!("{} at ({:.2}, {:.2}) is outside the room", p.object_type, p.position.x, p.position.z),
                    vec![i],
                ));
            }

            for door in analysis.doors() {
                if p.gap_to(door) < DOOR_KEEP_CLEAR {
                    violations.push(ValidationIssue::new(
                        IssueCategory::Accessibility,
                        format!("{} blocks {}", p.object_type, door.id),
                        vec![i],
                    ));
                }
            }

            for obstacle in analysis
                .blocking_obstacles()
                .filter(|c| c.kind == ConstraintKind::ExistingObject)
            {
                if p.gap_to(obstacle) <= EPSILON_GENERAL {
                    violations.push(ValidationIssue::new(
                        IssueCategory::Clearance,
                        format!("{} overlaps existing {}", p.object_type, obstacle.id),
                        vec![i],
                    ));
                }
            }

            let narrow_front = p
                .access_zones
                .iter()
                .any(|z| z.required && z.radius + EPSILON_GENERAL < MIN_ACCESS_WIDTH);
            if narrow_front {
                warnings.push(ValidationIssue::new(
                    IssueCategory::Accessibility,
                    format!("{} has less than {:.1} m of front access", p.object_type, MIN_ACCESS_WIDTH),
                    vec![i],
                ));
            }
        }

        for i in 0..placements.len() {
            for j in i + 1..placements.len() {
                let gap = placements[i].gap_to(&placements[j]);
                if gap <= EPSILON_GENERAL {
                    violations.push(ValidationIssue::new(
                        IssueCategory::Clearance,
                        format!("{} and {} overlap", placements[i].object_type, placements[j].object_type),
                        vec![i, j],
                    ));
                } else if gap < MIN_PASSAGE && !grouped(&placements[i], &placements[j]) {
                    warnings.push(ValidationIssue::new(
                        IssueCategory::Clearance,
                        format!(
                            "{} and {} are only {:.2} m apart",
                            placements[i].object_type, placements[j].object_type, gap
                        ),
                        vec![i, j],
                    ));
                }
            }
        }

        for conflict in &analysis.clearance_conflicts {
            warnings.push(ValidationIssue::new(
                IssueCategory::Clearance,
                format!(
                    "Existing objects '{}' and '{}' are {:.2} m apart, {:.2} m required",
                    conflict.first_id, conflict.second_id, conflict.gap, conflict.required
                ),
                Vec::new(),
            ));
        }

        let (workflow_efficiency, ungrouped) = workflow_score(placements);
        for i in ungrouped {
            warnings.push(ValidationIssue::new(
                IssueCategory::Ergonomics,
                format!("{} is far from its usual companions", placements[i].object_type),
                vec![i],
            ));
        }

        let sub_scores = ComplianceScores {
            ada_pathway_width: pathway_score(analysis, placements),
            maneuvering_space: maneuvering_score(analysis, placements),
            fire_egress: egress_score(analysis, placements),
            workflow_efficiency,
        };
        let score = (sub_scores.mean() - VIOLATION_PENALTY * violations.len() as f64).clamp(0.0, 100.0);

        ValidationReport {
            score: Some(score),
            is_valid: violations.is_empty(),
            violations,
            warnings,
            sub_scores,
        }
    }
}

fn grouping_distance(a: &PlannedPlacement, b: &PlannedPlacement) -> Option<f64> {
    let (ka, kb) = (a.kind?, b.kind?);
    catalog::builtin_spec(ka)
        .usage
        .grouping
        .iter()
        .find(|rule| rule.with == kb)
        .map(|rule| rule.max_distance)
}

fn grouped(a: &PlannedPlacement, b: &PlannedPlacement) -> bool {
    grouping_distance(a, b).or_else(|| grouping_distance(b, a)).is_some()
}

/// Share of satisfiable grouping rules that hold, and the placements that break one.
fn workflow_score(placements: &[PlannedPlacement]) -> (f64, Vec<usize>) {
    let present: Vec<Option<FurnitureKind>> = placements.iter().map(|p| p.kind).collect();
    let mut checked = 0usize;
    let mut satisfied = 0usize;
    let mut ungrouped = Vec::new();

    for (i, p) in placements.iter().enumerate() {
        let Some(kind) = p.kind else { continue };
        for rule in catalog::builtin_spec(kind).usage.grouping {
            if !present.contains(&Some(rule.with)) {
                continue;
            }
            checked += 1;
            let near = placements.iter().any(|q| {
                q.kind == Some(rule.with)
                    && q.position.distance_to(&p.position) <= rule.max_distance + p.reach() + q.reach()
            });
            if near {
                satisfied += 1;
            } else if !ungrouped.contains(&i) {
                ungrouped.push(i);
            }
        }
    }

    let score = if checked == 0 {
        100.0
    } else {
        100.0 * satisfied as f64 / checked as f64
    };
    (score, ungrouped)
}

/// Share of access paths that keep their full width free of placements.
fn pathway_score(analysis: &RoomAnalysisResult, placements: &[PlannedPlacement]) -> f64 {
    if analysis.paths.is_empty() {
        return 100.0;
    }
    let clear = analysis
        .paths
        .iter()
        .filter(|path| {
            placements.iter().all(|p| {
                let distance = geometry::distance_point_to_segment(p.position, path.start, path.end);
                distance - p.reach() >= path.width / 2.0
            })
        })
        .count();
    100.0 * clear as f64 / analysis.paths.len() as f64
}

fn maneuvering_score(analysis: &RoomAnalysisResult, placements: &[PlannedPlacement]) -> f64 {
    if placements.is_empty() {
        return 100.0;
    }
    let total: f64 = placements
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let wall = (analysis.distance_to_wall(p.position) - p.reach()).max(0.0);
            let nearest = placements
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| p.gap_to(q))
                .fold(f64::INFINITY, f64::min);
            // objects meant for walls are judged by their neighbors only
            let free = if p.wall_placement { nearest } else { nearest.min(wall.max(MIN_ACCESS_WIDTH)) };
            (free / MIN_ACCESS_WIDTH).min(1.0)
        })
        .sum();
    100.0 * total / placements.len() as f64
}

fn egress_score(analysis: &RoomAnalysisResult, placements: &[PlannedPlacement]) -> f64 {
    let mut score: f64 = 100.0;
    for door in analysis.doors() {
        let blocked = placements.iter().any(|p| p.gap_to(door) < DOOR_KEEP_CLEAR);
        if !blocked {
            continue;
        }
        if door.priority == Priority::Critical {
            return 0.0;
        }
        score -= 50.0;
    }
    score.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_room;
    use crate::model::{Opening, RoomInput, SceneObject};
    use crate::types::{Vec2, Vec3};

    fn room(w: f64, d: f64) -> RoomInput {
        RoomInput::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(w, 0.0),
            Vec2::new(w, d),
            Vec2::new(0.0, d),
        ])
        .with_opening(Opening::door(Vec2::new(w / 2.0, 0.0), 0.9))
    }

    #[test]
    fn empty_layout_scores_full_marks() {
        let analysis = analyze_room(&room(5.0, 4.0), &[], "r1").unwrap();
        let report = StandardValidator.validate(&analysis, &[]);
        assert!(report.is_valid);
        assert_eq!(report.score, Some(100.0));
    }

    #[test]
    fn surfaces_existing_clearance_conflicts() {
        let objects = vec![
            SceneObject::new("a", "chair", Vec3::new(2.0, 0.0, 2.0), Vec3::new(0.5, 0.9, 0.5)),
            SceneObject::new("b", "chair", Vec3::new(3.0, 0.0, 2.0), Vec3::new(0.5, 0.9, 0.5)),
        ];
        let analysis = analyze_room(&room(5.0, 4.0), &objects, "r1").unwrap();
        let report = StandardValidator.validate(&analysis, &[]);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.category == IssueCategory::Clearance && w.message.contains("'a'")));
    }

    #[test]
    fn flags_overlap_and_blocked_door() {
        let analysis = analyze_room(&room(5.0, 4.0), &[], "r1").unwrap();
        let placements = vec![
            PlannedPlacement::new("desk", Vec2::new(1.5, 2.5), 0.0),
            PlannedPlacement::new("desk", Vec2::new(1.8, 2.5), 0.0),
            PlannedPlacement::new("bookcase", Vec2::new(2.5, 0.5), 0.0),
        ];
        let report = StandardValidator.validate(&analysis, &placements);

        assert!(!report.is_valid);
        assert!(report
            .violations
            .iter()
            .any(|v| v.category == IssueCategory::Clearance && v.placements == vec![0, 1]));
        assert!(report
            .violations
            .iter()
            .any(|v| v.category == IssueCategory::Accessibility && v.placements == vec![2]));
        assert!(report.sub_scores.fire_egress < 100.0);
        assert!(report.score.unwrap() < 100.0);
    }

    #[test]
    fn placements_outside_the_room_are_violations() {
        let analysis = analyze_room(&room(4.0, 4.0), &[], "r1").unwrap();
        let report = StandardValidator.validate(&analysis, &[PlannedPlacement::new("chair", Vec2::new(9.0, 9.0), 0.0)]);
        assert!(report
            .violations
            .iter()
            .any(|v| v.category == IssueCategory::Safety));
    }

    #[test]
    fn grouping_rules_drive_workflow_score() {
        let analysis = analyze_room(&room(8.0, 6.0), &[], "r1").unwrap();
        let together = vec![
            PlannedPlacement::new("desk", Vec2::new(2.0, 4.0), 0.0),
            PlannedPlacement::new("chair", Vec2::new(2.0, 3.0), 0.0),
        ];
        let apart = vec![
            PlannedPlacement::new("desk", Vec2::new(1.5, 4.5), 0.0),
            PlannedPlacement::new("chair", Vec2::new(6.5, 1.5), 0.0),
        ];

        let near = StandardValidator.validate(&analysis, &together);
        let far = StandardValidator.validate(&analysis, &apart);
        assert!((near.sub_scores.workflow_efficiency - 100.0).abs() < 1e-9);
        assert!(far.sub_scores.workflow_efficiency < near.sub_scores.workflow_efficiency);
        assert!(far.warnings.iter().any(|w| w.category == IssueCategory::Ergonomics));
    }
}
