//! Classification of raw CAD primitives into the floor-plan model.
//!
//! The ingest adapter delivers [`RawEntity`] values in meters; this module
//! tags each one as wall / opening / restricted / other by the rule table
//! below (first match wins) and assembles the resulting [`FloorPlan`].

use crate::error::LayoutError;
use crate::floor_plan::{FloorPlan, Opening, OpeningKind, RestrictedZone, Wall};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Stroke weights above this (millimeters) read as wall outlines.
pub const WALL_STROKE_THRESHOLD: f64 = 0.5;

/// Annotations marking a zone as off-limits, matched case-insensitively.
const RESTRICTED_MARKERS: &[&str] = &["no entree", "no entry", "interdit", "restricted"];

/// Annotations marking an entrance or exit, matched case-insensitively.
const OPENING_MARKERS: &[&str] = &["entrée", "entree", "entrance", "sortie", "exit"];

/// What the ingest layer says the entity is, before classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RawEntityKind {
    Wall,
    Door,
    Window,
    Polyline,
    Text,
    Other,
}

/// A normalized ingest primitive. Coordinates are meters; `stroke_weight`
/// is the drawing line weight in millimeters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEntity {
    pub kind: RawEntityKind,
    pub layer: String,
    pub stroke_weight: f64,
    pub annotation: Option<String>,
    pub footprint: Rect,
}

impl RawEntity {
    pub fn new(kind: RawEntityKind, layer: impl Into<String>, footprint: Rect) -> Self {
        RawEntity {
            kind,
            layer: layer.into(),
            stroke_weight: 0.0,
            annotation: None,
            footprint,
        }
    }

    pub fn with_annotation(mut self, text: impl Into<String>) -> Self {
        self.annotation = Some(text.into());
        self
    }

    pub fn with_stroke_weight(mut self, weight: f64) -> Self {
        self.stroke_weight = weight;
        self
    }
}

/// Classified role of an entity in the floor-plan model.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityRole {
    Wall,
    Opening(OpeningKind),
    Restricted,
    Other,
}

impl EntityRole {
    /// Render color hint for the downstream visualization contract.
    pub fn color_hint(&self) -> Option<&'static str> {
        match self {
            EntityRole::Restricted => Some("#4a90d9"),
            EntityRole::Opening(_) => Some("#d94a4a"),
            EntityRole::Wall => Some("#555555"),
            EntityRole::Other => None,
        }
    }
}

/// Apply the classification rules in order; the first match wins.
pub fn classify(entity: &RawEntity) -> EntityRole {
    let annotation = entity
        .annotation
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    if RESTRICTED_MARKERS.iter().any(|m| annotation.contains(m)) {
        return EntityRole::Restricted;
    }

    if matches!(entity.kind, RawEntityKind::Door | RawEntityKind::Window)
        || OPENING_MARKERS.iter().any(|m| annotation.contains(m))
    {
        return EntityRole::Opening(opening_kind(entity, &annotation));
    }

    let layer = entity.layer.to_lowercase();
    if entity.kind == RawEntityKind::Wall
        || layer.contains("wall")
        || layer.contains("mur")
        || entity.stroke_weight > WALL_STROKE_THRESHOLD
    {
        return EntityRole::Wall;
    }

    EntityRole::Other
}

fn opening_kind(entity: &RawEntity, annotation: &str) -> OpeningKind {
    if annotation.contains("sortie") || annotation.contains("exit") {
        return OpeningKind::Exit;
    }
    if annotation.contains("entrée") || annotation.contains("entree") || annotation.contains("entrance")
    {
        return OpeningKind::Entrance;
    }
    match entity.kind {
        RawEntityKind::Window => OpeningKind::Window,
        _ => OpeningKind::InteriorDoor,
    }
}

/// Classify every entity and assemble the floor plan. `Other` entities are
/// dropped; entrance points are derived by [`FloorPlan::new`] from the
/// perimeter openings.
pub fn build_floor_plan(bounds: Rect, entities: &[RawEntity]) -> Result<FloorPlan, LayoutError> {
    let mut walls = Vec::new();
    let mut openings = Vec::new();
    let mut zones = Vec::new();

    for entity in entities {
        match classify(entity) {
            EntityRole::Wall => {
                let thickness = entity.footprint.width.min(entity.footprint.height).max(0.1);
                walls.push(Wall::new(entity.footprint, thickness, entity.layer.clone()));
            }
            EntityRole::Opening(kind) => {
                openings.push(Opening::new(entity.footprint, kind));
            }
            EntityRole::Restricted => {
                let label = entity
                    .annotation
                    .clone()
                    .unwrap_or_else(|| "restricted".to_string());
                zones.push(RestrictedZone::from_rect(entity.footprint, label));
            }
            EntityRole::Other => {}
        }
    }

    FloorPlan::new(bounds, walls, openings, zones)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(kind: RawEntityKind, layer: &str) -> RawEntity {
        RawEntity::new(kind, layer, Rect::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn restricted_annotation_wins_over_kind() {
        // Rule 1 beats rule 2 even for a door.
        let door = entity(RawEntityKind::Door, "doors").with_annotation("NO ENTRY");
        assert_eq!(classify(&door), EntityRole::Restricted);

        let zone = entity(RawEntityKind::Polyline, "misc").with_annotation("Zone interdite");
        assert_eq!(classify(&zone), EntityRole::Restricted);
    }

    #[test]
    fn openings_by_kind_and_annotation() {
        let door = entity(RawEntityKind::Door, "doors");
        assert_eq!(classify(&door), EntityRole::Opening(OpeningKind::InteriorDoor));

        let window = entity(RawEntityKind::Window, "glazing");
        assert_eq!(classify(&window), EntityRole::Opening(OpeningKind::Window));

        let exit = entity(RawEntityKind::Polyline, "misc").with_annotation("Sortie de secours");
        assert_eq!(classify(&exit), EntityRole::Opening(OpeningKind::Exit));

        let entrance = entity(RawEntityKind::Polyline, "misc").with_annotation("Entrée principale");
        assert_eq!(classify(&entrance), EntityRole::Opening(OpeningKind::Entrance));
    }

    #[test]
    fn walls_by_layer_and_stroke() {
        assert_eq!(classify(&entity(RawEntityKind::Wall, "a")), EntityRole::Wall);
        assert_eq!(
            classify(&entity(RawEntityKind::Polyline, "A-MUR-EXT")),
            EntityRole::Wall
        );
        assert_eq!(
            classify(&entity(RawEntityKind::Polyline, "WALLS")),
            EntityRole::Wall
        );
        let heavy = entity(RawEntityKind::Polyline, "misc").with_stroke_weight(0.8);
        assert_eq!(classify(&heavy), EntityRole::Wall);
    }

    #[test]
    fn unmatched_entities_ignored() {
        let label = entity(RawEntityKind::Text, "annotations");
        assert_eq!(classify(&label), EntityRole::Other);

        let plan = build_floor_plan(Rect::new(0.0, 0.0, 10.0, 10.0), &[label]).unwrap();
        assert!(plan.walls().is_empty());
        assert!(plan.openings().is_empty());
    }

    #[test]
    fn perimeter_door_yields_entrance_point() {
        let bounds = Rect::new(0.0, 0.0, 20.0, 15.0);
        let door = RawEntity::new(
            RawEntityKind::Door,
            "doors",
            Rect::new(9.5, 0.0, 1.0, 0.2),
        )
        .with_annotation("entrance");
        let plan = build_floor_plan(bounds, &[door]).unwrap();
        assert_eq!(plan.entrance_points().len(), 1);
    }
}
