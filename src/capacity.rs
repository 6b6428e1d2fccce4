//! Batch capacity reports over many rooms and furniture types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::catalog::FurnitureKind;
use crate::error::PlannerError;
use crate::model::FloorPolygon;
use crate::optimizer::{self, Strategy};

/// One capacity question: how many of `object_type` fit in `room_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CapacityRequest {
    pub room_id: String,
    pub object_type: String,
    /// Defaults to [`Strategy::default`].
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapacityOutcome {
    Completed {
        max_objects: usize,
        efficiency: f64,
        #[serde(default)]
        warnings: Vec<String>,
    },
    Failed {
        error: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CapacityReportItem {
    pub room_id: String,
    pub object_type: String,
    pub strategy: Strategy,
    pub outcome: CapacityOutcome,
}

impl CapacityReportItem {
    pub fn max_objects(&self) -> Option<usize> {
        match self.outcome {
            CapacityOutcome::Completed { max_objects, .. } => Some(max_objects),
            CapacityOutcome::Failed { .. } => None,
        }
    }
}

/// Capacity of one catalog kind in a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KindCapacity {
    pub kind: FurnitureKind,
    pub max_objects: usize,
    pub efficiency: f64,
}

/// Answers each request against the given rooms, in request order.
///
/// Requests naming an unknown room yield a `Failed` item; the rest of the
/// batch still runs.
pub fn capacity_report(
    rooms: &HashMap<String, FloorPolygon>,
    requests: &[CapacityRequest],
) -> Vec<CapacityReportItem> {
    let items: Vec<CapacityReportItem> = requests
        .iter()
        .map(|request| {
            let strategy = request.strategy.unwrap_or_default();
            let outcome = match rooms.get(&request.room_id) {
                Some(floor) => {
                    let result = optimizer::optimize_space(floor, &request.object_type, strategy, None);
                    CapacityOutcome::Completed {
                        max_objects: result.max_objects,
                        efficiency: result.efficiency,
                        warnings: result.warnings,
                    }
                }
                None => {
                    let err = PlannerError::NotFound {
                        kind: "room",
                        id: request.room_id.clone(),
                    };
                    warn!(room_id = %request.room_id, "Capacity request for unknown room");
                    CapacityOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };
            CapacityReportItem {
                room_id: request.room_id.clone(),
                object_type: request.object_type.clone(),
                strategy,
                outcome,
            }
        })
        .collect();

    let failed = items.iter().filter(|i| i.max_objects().is_none()).count();
    info!(requests = requests.len(), failed, "Capacity report finished");
    items
}

/// Maximum object count per catalog kind, in catalog order.
pub fn room_capacity(floor: &FloorPolygon, strategy: Strategy) -> Vec<KindCapacity> {
    FurnitureKind::ALL
        .iter()
        .map(|&kind| {
            let spec = crate::catalog::builtin_spec(kind);
            let config = optimizer::OptimizationConfig::for_kind(Some(kind));
            let result = optimizer::optimize_strategy(floor, kind.code(), &spec, strategy, config);
            KindCapacity {
                kind,
                max_objects: result.max_objects,
                efficiency: result.efficiency,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms() -> HashMap<String, FloorPolygon> {
        let mut rooms = HashMap::new();
        rooms.insert("office".to_string(), FloorPolygon::rectangle(5.0, 4.0).unwrap());
        rooms.insert("closet".to_string(), FloorPolygon::rectangle(1.0, 1.0).unwrap());
        rooms
    }

    fn request(room_id: &str, object_type: &str) -> CapacityRequest {
        CapacityRequest {
            room_id: room_id.to_string(),
            object_type: object_type.to_string(),
            strategy: None,
        }
    }

    #[test]
    fn unknown_room_fails_only_its_item() {
        let items = capacity_report(
            &rooms(),
            &[request("office", "desk"), request("attic", "desk"), request("office", "chair")],
        );

        assert_eq!(items.len(), 3);
        assert!(items[0].max_objects().unwrap() > 0);
        match &items[1].outcome {
            CapacityOutcome::Failed { error } => assert!(error.contains("attic")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(items[2].max_objects().unwrap() >= items[0].max_objects().unwrap());
        assert_eq!(items[0].strategy, Strategy::default());
    }

    #[test]
    fn small_room_reports_zero_with_warning() {
        let items = capacity_report(&rooms(), &[request("closet", "double_bed")]);
        match &items[0].outcome {
            CapacityOutcome::Completed {
                max_objects,
                warnings,
                ..
            } => {
                assert_eq!(*max_objects, 0);
                assert!(!warnings.is_empty());
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn room_capacity_covers_every_kind() {
        let floor = FloorPolygon::rectangle(6.0, 5.0).unwrap();
        let capacities = room_capacity(&floor, Strategy::Maximize);
        assert_eq!(capacities.len(), FurnitureKind::COUNT);
        for c in &capacities {
            assert!((0.0..=1.0).contains(&c.efficiency), "{:?}", c);
        }
        let chairs = capacities.iter().find(|c| c.kind == FurnitureKind::Chair).unwrap();
        let beds = capacities.iter().find(|c| c.kind == FurnitureKind::DoubleBed).unwrap();
        assert!(chairs.max_objects > beds.max_objects);
    }

    #[test]
    fn outcome_is_tagged_by_status() {
        let outcome = CapacityOutcome::Failed {
            error: "room 'x' not found".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
    }
}
