//! Metric computation and the weighted fitness score tying the placement
//! and corridor stages together. Everything here is a deterministic
//! function of the floor plan, the îlots and the corridors.

use crate::config::LayoutConfig;
use crate::corridor::{mst_weight, Corridor, UnionFind, ADA_MIN_WIDTH};
use crate::floor_plan::FloorPlan;
use crate::geometry::Point;
use crate::ilot::Ilot;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Σ îlot area / drawing area, capped at 1.
    pub space_utilization: f64,
    /// Largest corridor-connected îlot component over the îlot count.
    pub accessibility: f64,
    /// MST length over actual corridor length, capped at 1.
    pub corridor_efficiency: f64,
    /// Fraction of corridors counted accessible; 1 when ADA is disabled.
    pub ada_compliance: f64,
    /// Drawing area in square meters.
    pub total_area: f64,
    /// Area covered by îlots in square meters.
    pub used_area: f64,
    /// Total corridor length in meters.
    pub corridor_length: f64,
}

/// Compute the metrics record and the weighted fitness in [0, 1].
pub fn evaluate(
    plan: &FloorPlan,
    ilots: &[Ilot],
    corridors: &[Corridor],
    config: &LayoutConfig,
) -> (Metrics, f64) {
    let total_area = plan.bounds().area();
    let used_area: f64 = ilots.iter().map(Ilot::area).sum();
    let space_utilization = if total_area > 0.0 {
        (used_area / total_area).min(1.0)
    } else {
        0.0
    };

    let accessibility = accessibility(ilots, corridors);

    let corridor_length: f64 = corridors.iter().map(|c| c.length).sum();
    let corridor_efficiency = if corridors.is_empty() || corridor_length <= 0.0 {
        1.0
    } else {
        let centers: Vec<Point> = ilots.iter().map(Ilot::center).collect();
        (mst_weight(&centers) / corridor_length).min(1.0)
    };

    let ada_compliance = if !config.ada_compliance || corridors.is_empty() {
        1.0
    } else {
        let accessible = corridors.iter().filter(|c| c.accessible).count();
        accessible as f64 / corridors.len() as f64
    };

    let w = &config.fitness_weights;
    let fitness = (w.space * space_utilization
        + w.access * accessibility
        + w.corridor * corridor_efficiency
        + w.ada * ada_compliance)
        .clamp(0.0, 1.0);

    (
        Metrics {
            space_utilization,
            accessibility,
            corridor_efficiency,
            ada_compliance,
            total_area,
            used_area,
            corridor_length,
        },
        fitness,
    )
}

/// Size of the largest corridor-connected component over the îlot count.
/// An empty layout is trivially accessible.
fn accessibility(ilots: &[Ilot], corridors: &[Corridor]) -> f64 {
    if ilots.is_empty() {
        return 1.0;
    }
    let index_of: FnvHashMap<&str, usize> = ilots
        .iter()
        .enumerate()
        .map(|(i, ilot)| (ilot.id.as_str(), i))
        .collect();

    let mut uf = UnionFind::new(ilots.len());
    for corridor in corridors {
        let mut first: Option<usize> = None;
        for id in &corridor.connected_ilots {
            let Some(&i) = index_of.get(id.as_str()) else {
                continue;
            };
            match first {
                None => first = Some(i),
                Some(f) => {
                    uf.union(f, i);
                }
            }
        }
    }

    let mut sizes = vec![0usize; ilots.len()];
    let mut largest = 0;
    for i in 0..ilots.len() {
        let root = uf.find(i);
        sizes[root] += 1;
        largest = largest.max(sizes[root]);
    }
    largest as f64 / ilots.len() as f64
}

/// `true` when the corridor's accessible flag matches its width per the
/// ADA threshold. Used by the result integrity check.
pub fn ada_flag_consistent(corridor: &Corridor) -> bool {
    if corridor.width < ADA_MIN_WIDTH {
        !corridor.accessible
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::IdGen;
    use crate::geometry::Rect;
    use crate::ilot::{Rotation, SizeBucket};

    fn plan_10x10() -> FloorPlan {
        FloorPlan::empty(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap()
    }

    fn ilot(ids: &mut IdGen, x: f64, y: f64, side: f64) -> Ilot {
        Ilot::new(
            ids.next_ilot(),
            x,
            y,
            side,
            side,
            Rotation::Deg0,
            SizeBucket::Small,
        )
    }

    fn corridor(id: &str, a: Point, b: Point, width: f64, connected: &[&Ilot]) -> Corridor {
        Corridor {
            id: id.to_string(),
            path: vec![a, b],
            width,
            connected_ilots: connected.iter().map(|i| i.id.clone()).collect(),
            length: a.distance_to(b),
            accessible: width >= ADA_MIN_WIDTH,
        }
    }

    #[test]
    fn empty_layout_scores_full_marks_except_space() {
        let plan = plan_10x10();
        let config = LayoutConfig::default();
        let (metrics, fitness) = evaluate(&plan, &[], &[], &config);
        assert_eq!(metrics.space_utilization, 0.0);
        assert_eq!(metrics.accessibility, 1.0);
        assert_eq!(metrics.corridor_efficiency, 1.0);
        assert_eq!(metrics.ada_compliance, 1.0);
        // Only the space term is missing.
        assert!((fitness - 0.6).abs() < 1e-9);
    }

    #[test]
    fn single_ilot_fully_accessible() {
        let plan = plan_10x10();
        let config = LayoutConfig::default();
        let mut ids = IdGen::default();
        let ilots = vec![ilot(&mut ids, 4.0, 4.0, 2.0)];
        let (metrics, _) = evaluate(&plan, &ilots, &[], &config);
        assert_eq!(metrics.accessibility, 1.0);
        assert_eq!(metrics.corridor_efficiency, 1.0);
        assert!((metrics.used_area - 4.0).abs() < 1e-9);
    }

    #[test]
    fn disconnected_component_lowers_accessibility() {
        let plan = plan_10x10();
        let config = LayoutConfig::default();
        let mut ids = IdGen::default();
        let ilots = vec![
            ilot(&mut ids, 0.5, 0.5, 2.0),
            ilot(&mut ids, 4.0, 0.5, 2.0),
            ilot(&mut ids, 7.5, 7.5, 2.0),
        ];
        let c = corridor(
            "corridor-00",
            Point::new(2.5, 1.5),
            Point::new(4.0, 1.5),
            1.2,
            &[&ilots[0], &ilots[1]],
        );
        let (metrics, _) = evaluate(&plan, &ilots, &[c], &config);
        assert!((metrics.accessibility - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn ada_disabled_pins_term_to_one() {
        let plan = plan_10x10();
        let mut ids = IdGen::default();
        let ilots = vec![ilot(&mut ids, 0.5, 0.5, 2.0), ilot(&mut ids, 6.0, 0.5, 2.0)];
        let narrow = corridor(
            "corridor-00",
            Point::new(2.5, 1.5),
            Point::new(6.0, 1.5),
            1.0,
            &[&ilots[0], &ilots[1]],
        );

        let enabled = LayoutConfig::default();
        let (m1, _) = evaluate(&plan, &ilots, std::slice::from_ref(&narrow), &enabled);
        assert_eq!(m1.ada_compliance, 0.0);

        let disabled = LayoutConfig {
            ada_compliance: false,
            ..LayoutConfig::default()
        };
        let (m2, _) = evaluate(&plan, &ilots, &[narrow], &disabled);
        assert_eq!(m2.ada_compliance, 1.0);
    }

    #[test]
    fn over_packing_capped_at_one() {
        let plan = plan_10x10();
        let config = LayoutConfig::default();
        let mut ids = IdGen::default();
        // Deliberately oversized layout: 4 × 36 m² in a 100 m² room.
        let ilots: Vec<Ilot> = (0..4).map(|i| ilot(&mut ids, i as f64, 0.0, 6.0)).collect();
        let (metrics, fitness) = evaluate(&plan, &ilots, &[], &config);
        assert_eq!(metrics.space_utilization, 1.0);
        assert!(fitness <= 1.0);
    }

    #[test]
    fn efficiency_compares_mst_to_actual_length() {
        let plan = plan_10x10();
        let config = LayoutConfig::default();
        let mut ids = IdGen::default();
        let ilots = vec![ilot(&mut ids, 1.0, 1.0, 2.0), ilot(&mut ids, 7.0, 1.0, 2.0)];
        // Centers 6 m apart; a meandering 12 m corridor scores 0.5.
        let mut c = corridor(
            "corridor-00",
            Point::new(2.0, 2.0),
            Point::new(8.0, 2.0),
            1.2,
            &[&ilots[0], &ilots[1]],
        );
        c.length = 12.0;
        let (metrics, _) = evaluate(&plan, &ilots, &[c], &config);
        assert!((metrics.corridor_efficiency - 0.5).abs() < 1e-9);
    }
}
