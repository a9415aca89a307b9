//! Row and column detection over a candidate's îlots, and the facing test
//! that decides where straight corridors can run between them.

use crate::ilot::Ilot;
use itertools::Itertools;

/// Îlots whose centers differ by no more than this (meters) along the
/// grouping axis fall into the same row.
pub const ROW_TOLERANCE: f64 = 0.5;

/// Rows separated by more than this gap are visually unrelated and never
/// face each other.
pub const GAP_MAX: f64 = 8.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Rows grouped by y-center; corridors run horizontally.
    Horizontal,
    /// Columns grouped by x-center; corridors run vertically.
    Vertical,
}

/// One detected row (or column): member indices into the îlot slice,
/// sorted along the row.
#[derive(Clone, Debug)]
pub struct Row {
    pub members: Vec<usize>,
    /// Footprint extent across the grouping axis (e.g. bottom/top edges
    /// for a horizontal row).
    pub band: (f64, f64),
    /// Footprint extent along the row.
    pub span: (f64, f64),
}

/// A pair of rows separated by a corridor-sized gap with overlapping spans.
#[derive(Clone, Debug)]
pub struct FacingRows {
    pub lower: usize,
    pub upper: usize,
    pub gap: f64,
    /// Coordinate of the gap midline on the grouping axis.
    pub midline: f64,
    /// Span interval shared by both rows.
    pub overlap: (f64, f64),
}

/// Group îlots into rows along the given axis. Rows with fewer than two
/// members carry no corridor information and are discarded.
pub fn detect_rows(ilots: &[Ilot], axis: Axis, tolerance: f64) -> Vec<Row> {
    let group_coord = |i: usize| -> f64 {
        let c = ilots[i].center();
        match axis {
            Axis::Horizontal => c.y,
            Axis::Vertical => c.x,
        }
    };
    let sort_coord = |i: usize| -> f64 {
        let c = ilots[i].center();
        match axis {
            Axis::Horizontal => c.x,
            Axis::Vertical => c.y,
        }
    };

    let ordered: Vec<usize> = (0..ilots.len())
        .sorted_by(|&a, &b| group_coord(a).total_cmp(&group_coord(b)).then(a.cmp(&b)))
        .collect();

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut anchor = f64::NEG_INFINITY;
    for &i in &ordered {
        let coord = group_coord(i);
        if rows.is_empty() || coord - anchor > tolerance {
            rows.push(vec![i]);
            anchor = coord;
        } else if let Some(row) = rows.last_mut() {
            row.push(i);
        }
    }

    rows.into_iter()
        .filter(|members| members.len() >= 2)
        .map(|mut members| {
            members.sort_by(|&a, &b| sort_coord(a).total_cmp(&sort_coord(b)).then(a.cmp(&b)));
            let mut band = (f64::INFINITY, f64::NEG_INFINITY);
            let mut span = (f64::INFINITY, f64::NEG_INFINITY);
            for &i in &members {
                let r = ilots[i].rect();
                let (b0, b1, s0, s1) = match axis {
                    Axis::Horizontal => (r.y, r.y_max(), r.x, r.x_max()),
                    Axis::Vertical => (r.x, r.x_max(), r.y, r.y_max()),
                };
                band.0 = band.0.min(b0);
                band.1 = band.1.max(b1);
                span.0 = span.0.min(s0);
                span.1 = span.1.max(s1);
            }
            Row {
                members,
                band,
                span,
            }
        })
        .collect()
}

/// Every pair of rows whose band gap admits a corridor
/// (`corridor_width ≤ gap ≤ gap_max`) and whose spans overlap.
pub fn facing_pairs(rows: &[Row], corridor_width: f64, gap_max: f64) -> Vec<FacingRows> {
    let order: Vec<usize> = (0..rows.len())
        .sorted_by(|&a, &b| rows[a].band.0.total_cmp(&rows[b].band.0).then(a.cmp(&b)))
        .collect();

    let mut pairs = Vec::new();
    for (oi, &i) in order.iter().enumerate() {
        for &j in &order[oi + 1..] {
            let gap = rows[j].band.0 - rows[i].band.1;
            if gap < corridor_width || gap > gap_max {
                continue;
            }
            let lo = rows[i].span.0.max(rows[j].span.0);
            let hi = rows[i].span.1.min(rows[j].span.1);
            if hi <= lo {
                continue;
            }
            pairs.push(FacingRows {
                lower: i,
                upper: j,
                gap,
                midline: rows[i].band.1 + gap / 2.0,
                overlap: (lo, hi),
            });
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilot::{Rotation, SizeBucket};

    fn ilot(id: usize, x: f64, y: f64, w: f64, h: f64) -> Ilot {
        Ilot::new(
            format!("ilot-{id:02}"),
            x,
            y,
            w,
            h,
            Rotation::Deg0,
            SizeBucket::Small,
        )
    }

    fn two_rows() -> Vec<Ilot> {
        // Row of five at y=1 and five at y=5, 2×2 footprints.
        let mut ilots = Vec::new();
        for i in 0..5 {
            ilots.push(ilot(i, 1.0 + i as f64 * 3.0, 1.0, 2.0, 2.0));
        }
        for i in 0..5 {
            ilots.push(ilot(5 + i, 1.0 + i as f64 * 3.0, 5.0, 2.0, 2.0));
        }
        ilots
    }

    #[test]
    fn groups_two_horizontal_rows() {
        let ilots = two_rows();
        let rows = detect_rows(&ilots, Axis::Horizontal, ROW_TOLERANCE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].members.len(), 5);
        assert_eq!(rows[1].members.len(), 5);
        // Members come back sorted along the row.
        assert_eq!(rows[0].members, vec![0, 1, 2, 3, 4]);
        assert_eq!(rows[0].band, (1.0, 3.0));
        assert_eq!(rows[1].band, (5.0, 7.0));
    }

    #[test]
    fn singleton_rows_discarded() {
        let ilots = vec![
            ilot(0, 1.0, 1.0, 2.0, 2.0),
            ilot(1, 4.0, 1.0, 2.0, 2.0),
            ilot(2, 1.0, 8.0, 2.0, 2.0),
        ];
        let rows = detect_rows(&ilots, Axis::Horizontal, ROW_TOLERANCE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].members.len(), 2);
    }

    #[test]
    fn facing_pair_found_for_corridor_sized_gap() {
        let ilots = two_rows();
        let rows = detect_rows(&ilots, Axis::Horizontal, ROW_TOLERANCE);
        let pairs = facing_pairs(&rows, 1.2, GAP_MAX);
        assert_eq!(pairs.len(), 1);
        let p = &pairs[0];
        assert!((p.gap - 2.0).abs() < 1e-9);
        assert!((p.midline - 4.0).abs() < 1e-9);
        assert_eq!(p.overlap, (1.0, 15.0));
    }

    #[test]
    fn wide_gap_not_facing() {
        let ilots = two_rows();
        let rows = detect_rows(&ilots, Axis::Horizontal, ROW_TOLERANCE);
        // Corridor wider than the 2 m gap: nothing faces.
        assert!(facing_pairs(&rows, 2.5, GAP_MAX).is_empty());
        // Gap above gap_max: nothing faces.
        assert!(facing_pairs(&rows, 1.2, 1.5).is_empty());
    }

    #[test]
    fn disjoint_spans_not_facing() {
        let ilots = vec![
            ilot(0, 0.0, 1.0, 2.0, 2.0),
            ilot(1, 3.0, 1.0, 2.0, 2.0),
            ilot(2, 10.0, 5.0, 2.0, 2.0),
            ilot(3, 13.0, 5.0, 2.0, 2.0),
        ];
        let rows = detect_rows(&ilots, Axis::Horizontal, ROW_TOLERANCE);
        assert_eq!(rows.len(), 2);
        assert!(facing_pairs(&rows, 1.2, GAP_MAX).is_empty());
    }

    #[test]
    fn vertical_columns_detected() {
        let ilots = vec![
            ilot(0, 1.0, 0.0, 2.0, 2.0),
            ilot(1, 1.0, 3.0, 2.0, 2.0),
            ilot(2, 6.0, 0.0, 2.0, 2.0),
            ilot(3, 6.0, 3.0, 2.0, 2.0),
        ];
        let cols = detect_rows(&ilots, Axis::Vertical, ROW_TOLERANCE);
        assert_eq!(cols.len(), 2);
        let pairs = facing_pairs(&cols, 1.2, GAP_MAX);
        assert_eq!(pairs.len(), 1);
        assert!((pairs[0].gap - 3.0).abs() < 1e-9);
        assert!((pairs[0].midline - 4.5).abs() < 1e-9);
    }
}
