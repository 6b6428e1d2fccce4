//! Furniture placement planning for rooms.
//!
//! Pipeline: [`analyzer`] classifies a room into zones and constraints,
//! [`optimizer`] packs one furniture type into a floor, [`layout`] combines
//! several types into ranked layouts scored by a [`validator`], and
//! [`collision`] keeps interactive edits free of overlaps.

pub mod analyzer;
pub mod api;
pub mod capacity;
pub mod catalog;
pub mod collision;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod optimizer;
pub mod templates;
pub mod types;
pub mod validator;

pub use analyzer::{RoomAnalysisResult, analyze_room};
pub use capacity::{CapacityOutcome, CapacityReportItem, CapacityRequest, capacity_report, room_capacity};
pub use catalog::{FurnitureCatalog, FurnitureKind, FurnitureSpec};
pub use collision::{CollisionConfig, CollisionResolver};
pub use error::{PlannerError, PlannerResult};
pub use layout::{GeneratedLayout, LayoutGenerationResult, LayoutGenerator, LayoutRequest, PlannedPlacement};
pub use model::{FloorPolygon, RoomInput, Scene, SceneObject};
pub use optimizer::{OptimizationResult, Strategy, optimize_space};
pub use validator::{PlacementValidator, StandardValidator, ValidationReport};
