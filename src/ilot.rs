//! Îlot model: rectangular workstation footprints in three size buckets,
//! and the catalog deriving per-bucket target counts from a configuration.

use crate::config::SizeMix;
use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 3] = [SizeBucket::Small, SizeBucket::Medium, SizeBucket::Large];

    /// Uniform sampling range for each side, in meters.
    pub fn side_range(self) -> (f64, f64) {
        match self {
            SizeBucket::Small => (1.5, 3.0),
            SizeBucket::Medium => (3.0, 5.0),
            SizeBucket::Large => (5.0, 8.0),
        }
    }

    /// Expected footprint area of the bucket (midpoint side squared),
    /// used to convert a target area into a target count.
    pub fn mean_area(self) -> f64 {
        let (lo, hi) = self.side_range();
        let side = (lo + hi) / 2.0;
        side * side
    }
}

/// Axis-aligned rotation. 90° and 270° swap the footprint's axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// A placed workstation. `x`/`y` anchor the lower-left corner of the
/// footprint after rotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ilot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: Rotation,
    pub bucket: SizeBucket,
    /// Ids of corridors touching this îlot, appended during synthesis.
    #[serde(default)]
    pub corridor_connections: Vec<String>,
}

impl Ilot {
    pub fn new(
        id: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rotation: Rotation,
        bucket: SizeBucket,
    ) -> Self {
        Ilot {
            id,
            x,
            y,
            width,
            height,
            rotation,
            bucket,
            corridor_connections: Vec::new(),
        }
    }

    /// The axis-aligned footprint actually occupied on the plan.
    pub fn rect(&self) -> Rect {
        let (w, h) = if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        Rect::new(self.x, self.y, w, h)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Per-bucket target counts for one candidate: the configured size mix
/// applied to the area budget `usable_area * density`, each bucket's share
/// divided by its mean footprint.
pub fn target_counts(mix: &SizeMix, usable_area: f64, density: f64) -> [usize; 3] {
    let budget = usable_area.max(0.0) * density.clamp(0.0, 1.0);
    let shares = [mix.small, mix.medium, mix.large];
    let mut counts = [0usize; 3];
    for (i, bucket) in SizeBucket::ALL.iter().enumerate() {
        let share = budget * shares[i] / 100.0;
        counts[i] = (share / bucket.mean_area()).round() as usize;
    }
    // An all-zero target would stall the search before it starts; seed at
    // least one îlot of the most-weighted bucket.
    if counts.iter().all(|&c| c == 0) && budget > 0.0 {
        let top = shares
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        counts[top] = 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_swaps_footprint_axes() {
        let ilot = Ilot::new(
            "ilot-00".into(),
            1.0,
            2.0,
            4.0,
            2.0,
            Rotation::Deg90,
            SizeBucket::Medium,
        );
        let rect = ilot.rect();
        assert_eq!(rect.width, 2.0);
        assert_eq!(rect.height, 4.0);
        // Area is rotation-invariant.
        assert_eq!(ilot.area(), 8.0);
    }

    #[test]
    fn counts_follow_mix_shares() {
        let mix = SizeMix {
            small: 100.0,
            medium: 0.0,
            large: 0.0,
        };
        // 100 m² room at 50% density: ~50 m² / 5.06 m² ≈ 10 small îlots.
        let counts = target_counts(&mix, 100.0, 0.5);
        assert_eq!(counts[1], 0);
        assert_eq!(counts[2], 0);
        assert!((9..=11).contains(&counts[0]), "got {}", counts[0]);
    }

    #[test]
    fn tiny_budget_still_targets_one_ilot() {
        let mix = SizeMix::default();
        let counts = target_counts(&mix, 4.0, 0.3);
        assert!(counts.iter().sum::<usize>() >= 1);
    }
}
