//! Predefined furniture manifests per room category.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::FurnitureKind;
use crate::error::{PlannerError, PlannerResult};

/// Fixed facing applied to template placements, in world axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardinalFacing {
    /// +z
    North,
    /// +x
    East,
    South,
    West,
}

impl CardinalFacing {
    /// Rotation in radians, measured from +z towards +x.
    pub fn rotation(self) -> f64 {
        use std::f64::consts::{FRAC_PI_2, PI};
        match self {
            CardinalFacing::North => 0.0,
            CardinalFacing::East => FRAC_PI_2,
            CardinalFacing::South => PI,
            CardinalFacing::West => 3.0 * FRAC_PI_2,
        }
    }
}

/// Kind of room a template is meant for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomCategory {
    Office,
    Meeting,
    Living,
    Education,
}

/// One furniture line of a template.
///
/// # Fields
/// * `required` - Count the layout generator tries to place
/// * `preferred` - Ideal count, reported to clients only
/// * `optional` - Further count a client may add by hand
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TemplateItem {
    pub kind: FurnitureKind,
    pub required: u32,
    pub preferred: u32,
    pub optional: u32,
    /// Snap placements against the nearest wall.
    pub wall_placement: bool,
    /// Fixed facing; `None` faces the wall normal or the room centroid.
    pub facing: Option<CardinalFacing>,
}

impl TemplateItem {
    fn new(kind: FurnitureKind, required: u32, preferred: u32, optional: u32) -> Self {
        Self {
            kind,
            required,
            preferred,
            optional,
            wall_placement: false,
            facing: None,
        }
    }

    fn against_wall(mut self) -> Self {
        self.wall_placement = true;
        self
    }

    fn facing(mut self, facing: CardinalFacing) -> Self {
        self.facing = Some(facing);
        self
    }
}

/// Named furniture program for a room category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayoutTemplate {
    /// Stable id such as `single_office`.
    pub id: String,
    pub name: String,
    pub category: RoomCategory,
    /// Rooms smaller than this (m²) cannot use the template.
    pub min_area: f64,
    pub items: Vec<TemplateItem>,
}

impl LayoutTemplate {
    /// `true` when a room of `area` m² meets the template's minimum.
    pub fn accepts_area(&self, area: f64) -> bool {
        area + f64::EPSILON >= self.min_area
    }

    /// Items with a non-zero required quantity.
    pub fn required_items(&self) -> impl Iterator<Item = &TemplateItem> {
        self.items.iter().filter(|i| i.required > 0)
    }
}

fn template(id: &str, name: &str, category: RoomCategory, min_area: f64, items: Vec<TemplateItem>) -> LayoutTemplate {
    LayoutTemplate {
        id: id.to_string(),
        name: name.to_string(),
        category,
        min_area,
        items,
    }
}

/// All built-in templates.
pub fn builtin_templates() -> Vec<LayoutTemplate> {
    use FurnitureKind::*;

    vec![
        template(
            "single_office",
            "Single office",
            RoomCategory::Office,
            6.0,
            vec![
                TemplateItem::new(Desk, 1, 1, 0).against_wall(),
                TemplateItem::new(Chair, 1, 2, 0),
                TemplateItem::new(Bookcase, 0, 1, 1).against_wall(),
            ],
        ),
        template(
            "collaborative_office",
            "Collaborative office",
            RoomCategory::Office,
            20.0,
            vec![
                TemplateItem::new(Desk, 4, 6, 2).against_wall(),
                TemplateItem::new(Chair, 4, 6, 2),
                TemplateItem::new(Table, 1, 1, 0),
                TemplateItem::new(Bookcase, 0, 2, 2).against_wall(),
            ],
        ),
        template(
            "conference_room",
            "Conference room",
            RoomCategory::Meeting,
            15.0,
            vec![
                TemplateItem::new(Table, 1, 1, 0),
                TemplateItem::new(Chair, 6, 8, 4),
                TemplateItem::new(Tv, 0, 1, 1).against_wall(),
            ],
        ),
        template(
            "living_room",
            "Living room",
            RoomCategory::Living,
            12.0,
            vec![
                TemplateItem::new(Sofa, 1, 1, 1).against_wall(),
                TemplateItem::new(Table, 1, 1, 0),
                TemplateItem::new(Tv, 1, 1, 0).against_wall(),
                TemplateItem::new(Bookcase, 0, 1, 2).against_wall(),
            ],
        ),
        template(
            "classroom",
            "Classroom",
            RoomCategory::Education,
            40.0,
            vec![
                TemplateItem::new(Desk, 12, 20, 4).facing(CardinalFacing::North),
                TemplateItem::new(Chair, 12, 20, 4),
                TemplateItem::new(Table, 1, 1, 0),
                TemplateItem::new(Bookcase, 0, 2, 2).against_wall(),
                TemplateItem::new(Tv, 0, 1, 0).against_wall(),
            ],
        ),
    ]
}

/// Looks up a built-in template by id.
pub fn find_template(id: &str) -> PlannerResult<LayoutTemplate> {
    builtin_templates()
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| PlannerError::UnknownTemplate(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        let office = find_template("single_office").unwrap();
        assert_eq!(office.category, RoomCategory::Office);
        assert!(office.accepts_area(6.0));
        assert!(!office.accepts_area(5.9));
        assert_eq!(office.required_items().count(), 2);

        assert_eq!(
            find_template("ballroom"),
            Err(PlannerError::UnknownTemplate("ballroom".to_string()))
        );
    }

    #[test]
    fn every_template_requires_something() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), 5);
        for t in &templates {
            assert!(t.required_items().next().is_some(), "{} is empty", t.id);
            for item in &t.items {
                assert!(item.preferred >= item.required);
            }
        }
    }

    #[test]
    fn cardinal_rotations() {
        assert_eq!(CardinalFacing::North.rotation(), 0.0);
        assert!((CardinalFacing::West.rotation() - 1.5 * std::f64::consts::PI).abs() < 1e-12);
    }
}
