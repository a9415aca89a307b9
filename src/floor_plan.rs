//! Normalized floor-plan model: walls, openings and restricted zones inside
//! a bounds rectangle, all in meters with the origin at the lower-left.
//!
//! A `FloorPlan` is built once per run, validated on construction, and
//! shared read-only by every candidate for the run's duration.

use crate::error::LayoutError;
use crate::geometry::{Point, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Openings within `PERIMETER_TOL` of the bounds edge count as perimeter
/// openings and contribute entrance points.
const PERIMETER_TOL: f64 = 0.05;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wall {
    pub rect: Rect,
    pub thickness: f64,
    pub layer: String,
}

impl Wall {
    pub fn new(rect: Rect, thickness: f64, layer: impl Into<String>) -> Self {
        Wall {
            rect,
            thickness,
            layer: layer.into(),
        }
    }

    /// Normalize a segment wall to a rect footprint by inflating the
    /// segment by half its thickness.
    pub fn from_segment(a: Point, b: Point, thickness: f64, layer: impl Into<String>) -> Self {
        let rect = Rect::from_corners(a, b).inflate(thickness / 2.0);
        Wall {
            rect,
            thickness,
            layer: layer.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpeningKind {
    Entrance,
    Exit,
    InteriorDoor,
    Window,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Opening {
    pub rect: Rect,
    pub kind: OpeningKind,
}

impl Opening {
    pub fn new(rect: Rect, kind: OpeningKind) -> Self {
        Opening { rect, kind }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestrictedZone {
    pub polygon: Polygon,
    pub label: String,
}

impl RestrictedZone {
    pub fn new(polygon: Polygon, label: impl Into<String>) -> Self {
        RestrictedZone {
            polygon,
            label: label.into(),
        }
    }

    pub fn from_rect(rect: Rect, label: impl Into<String>) -> Self {
        RestrictedZone {
            polygon: Polygon::from_rect(&rect),
            label: label.into(),
        }
    }
}

/// The immutable input model for one optimization run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FloorPlan {
    bounds: Rect,
    walls: Vec<Wall>,
    openings: Vec<Opening>,
    restricted_zones: Vec<RestrictedZone>,
    entrance_points: Vec<Point>,
}

impl FloorPlan {
    /// Validate and assemble a floor plan. Walls are clamped into the
    /// bounds; walls and zones with no area inside the bounds, non-finite
    /// coordinates, degenerate bounds and self-intersecting zone polygons
    /// are rejected.
    pub fn new(
        bounds: Rect,
        walls: Vec<Wall>,
        openings: Vec<Opening>,
        restricted_zones: Vec<RestrictedZone>,
    ) -> Result<Self, LayoutError> {
        if !bounds.is_valid() || bounds.is_degenerate() {
            return Err(LayoutError::InvalidFloorPlan(format!(
                "degenerate bounds {bounds:?}"
            )));
        }

        let mut clamped_walls = Vec::with_capacity(walls.len());
        for (i, mut wall) in walls.into_iter().enumerate() {
            if !wall.rect.is_valid() || !wall.thickness.is_finite() || wall.thickness <= 0.0 {
                return Err(LayoutError::InvalidFloorPlan(format!(
                    "wall {i} has a non-finite or non-positive extent"
                )));
            }
            let Some(inside) = clamp_rect(&wall.rect, &bounds) else {
                return Err(LayoutError::InvalidFloorPlan(format!(
                    "wall {i} lies entirely outside the drawing bounds"
                )));
            };
            wall.rect = inside;
            clamped_walls.push(wall);
        }

        for (i, opening) in openings.iter().enumerate() {
            if !opening.rect.is_valid() {
                return Err(LayoutError::InvalidFloorPlan(format!(
                    "opening {i} has a non-finite coordinate"
                )));
            }
        }

        for (i, zone) in restricted_zones.iter().enumerate() {
            let vertices = zone.polygon.vertices();
            if vertices.len() < 3 {
                return Err(LayoutError::InvalidFloorPlan(format!(
                    "restricted zone {i} has fewer than 3 vertices"
                )));
            }
            if vertices.iter().any(|v| !v.is_finite()) {
                return Err(LayoutError::InvalidFloorPlan(format!(
                    "restricted zone {i} has a non-finite vertex"
                )));
            }
            if zone.polygon.is_self_intersecting() {
                return Err(LayoutError::InvalidFloorPlan(format!(
                    "restricted zone {i} ({}) is self-intersecting",
                    zone.label
                )));
            }
        }

        let entrance_points = derive_entrance_points(&bounds, &openings);

        Ok(FloorPlan {
            bounds,
            walls: clamped_walls,
            openings,
            restricted_zones,
            entrance_points,
        })
    }

    /// Empty plan: just a bounds rectangle.
    pub fn empty(bounds: Rect) -> Result<Self, LayoutError> {
        Self::new(bounds, Vec::new(), Vec::new(), Vec::new())
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn openings(&self) -> &[Opening] {
        &self.openings
    }

    pub fn restricted_zones(&self) -> &[RestrictedZone] {
        &self.restricted_zones
    }

    /// Midpoints of perimeter openings, derived at construction.
    pub fn entrance_points(&self) -> &[Point] {
        &self.entrance_points
    }

    /// Sum of wall and restricted-zone areas. Overlaps are not subtracted;
    /// this feeds diagnostics and the catalog target, not the metrics.
    pub fn obstacle_area(&self) -> f64 {
        let walls: f64 = self.walls.iter().map(|w| w.rect.area()).sum();
        let zones: f64 = self
            .restricted_zones
            .iter()
            .map(|z| z.polygon.area())
            .sum();
        (walls + zones).min(self.bounds.area())
    }

    /// Bounds area not covered by obstacles.
    pub fn usable_area(&self) -> f64 {
        (self.bounds.area() - self.obstacle_area()).max(0.0)
    }

    /// Share of the drawing covered by obstacles, in [0, 1].
    pub fn obstacle_fraction(&self) -> f64 {
        let total = self.bounds.area();
        if total <= 0.0 {
            return 1.0;
        }
        self.obstacle_area() / total
    }
}

/// Intersection of `rect` with `bounds`, or None when nothing remains.
fn clamp_rect(rect: &Rect, bounds: &Rect) -> Option<Rect> {
    let x0 = rect.x.max(bounds.x);
    let y0 = rect.y.max(bounds.y);
    let x1 = rect.x_max().min(bounds.x_max());
    let y1 = rect.y_max().min(bounds.y_max());
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
}

fn derive_entrance_points(bounds: &Rect, openings: &[Opening]) -> Vec<Point> {
    openings
        .iter()
        .filter(|o| touches_perimeter(&o.rect, bounds))
        .map(|o| o.rect.center())
        .collect()
}

fn touches_perimeter(rect: &Rect, bounds: &Rect) -> bool {
    rect.x <= bounds.x + PERIMETER_TOL
        || rect.x_max() >= bounds.x_max() - PERIMETER_TOL
        || rect.y <= bounds.y + PERIMETER_TOL
        || rect.y_max() >= bounds.y_max() - PERIMETER_TOL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_bounds() {
        let result = FloorPlan::empty(Rect::new(0.0, 0.0, 0.0, 10.0));
        assert!(matches!(result, Err(LayoutError::InvalidFloorPlan(_))));
    }

    #[test]
    fn rejects_non_finite_wall() {
        let wall = Wall::new(Rect::new(f64::NAN, 0.0, 1.0, 1.0), 0.2, "walls");
        let result = FloorPlan::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![wall],
            Vec::new(),
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_self_intersecting_zone() {
        let bowtie = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ]);
        let result = FloorPlan::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Vec::new(),
            Vec::new(),
            vec![RestrictedZone::new(bowtie, "bad")],
        );
        assert!(result.is_err());
    }

    #[test]
    fn walls_clamped_into_bounds() {
        let wall = Wall::new(Rect::new(8.0, 2.0, 5.0, 1.0), 0.2, "walls");
        let plan = FloorPlan::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![wall],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(plan.walls()[0].rect.x_max(), 10.0);
    }

    #[test]
    fn perimeter_opening_becomes_entrance_point() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let door = Opening::new(Rect::new(4.0, 0.0, 1.0, 0.2), OpeningKind::Entrance);
        let interior = Opening::new(Rect::new(4.0, 5.0, 1.0, 0.2), OpeningKind::InteriorDoor);
        let plan = FloorPlan::new(bounds, Vec::new(), vec![door, interior], Vec::new()).unwrap();
        assert_eq!(plan.entrance_points().len(), 1);
        let p = plan.entrance_points()[0];
        assert!((p.x - 4.5).abs() < 1e-9 && (p.y - 0.1).abs() < 1e-9);
    }

    #[test]
    fn segment_wall_normalized_to_rect() {
        let wall = Wall::from_segment(Point::new(0.0, 5.0), Point::new(10.0, 5.0), 0.2, "mur");
        assert!((wall.rect.height - 0.2).abs() < 1e-9);
        assert!((wall.rect.width - 10.2).abs() < 1e-9);
    }

    #[test]
    fn usable_area_subtracts_obstacles() {
        let plan = FloorPlan::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![Wall::new(Rect::new(0.0, 0.0, 10.0, 1.0), 0.2, "walls")],
            Vec::new(),
            vec![RestrictedZone::from_rect(Rect::new(5.0, 5.0, 2.0, 2.0), "hs")],
        )
        .unwrap();
        assert!((plan.obstacle_area() - 14.0).abs() < 1e-9);
        assert!((plan.usable_area() - 86.0).abs() < 1e-9);
    }
}
