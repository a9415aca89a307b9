//! Obstacle index: the two run-long read-only views of the floor plan.
//!
//! A static rectangle list (with a uniform bucket grid above
//! [`BUCKET_THRESHOLD`] obstacles) answers placement-disjointness queries,
//! and a rasterized walkability grid feeds A* corridor routing. Both are
//! built once per floor plan and shared by every candidate.

use crate::config::LayoutConfig;
use crate::floor_plan::FloorPlan;
use crate::geometry::{Point, Rect};
use bitflags::bitflags;
use fnv::{FnvHashMap, FnvHashSet};
use log::debug;

/// Above this obstacle count, rect queries go through the bucket grid.
pub const BUCKET_THRESHOLD: usize = 500;

/// Bucket edge length in meters for the uniform grid index.
const BUCKET_CELL: f64 = 8.0;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        /// Covered by a wall footprint.
        const WALL = 1;
        /// Inside the half-corridor-width inflation ring around a wall.
        const MARGIN = 2;
        /// Covered by a restricted zone.
        const RESTRICTED = 4;
    }
}

/// Neighbor offsets for 8-directional movement.
pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// A dense width×height array addressed by cell coordinates.
#[derive(Clone)]
pub struct GridData<T: Copy> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy> GridData<T> {
    pub fn new(width: usize, height: usize, initial: T) -> Self {
        GridData {
            width,
            height,
            data: vec![initial; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[y * self.width + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        &mut self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }
}

/// The rasterized walkability view of the floor plan.
#[derive(Clone)]
pub struct WalkGrid {
    origin: Point,
    cell_size: f64,
    cells: GridData<CellFlags>,
}

impl WalkGrid {
    fn new(bounds: &Rect, cell_size: f64) -> Self {
        let width = ((bounds.width / cell_size).ceil() as usize).max(1);
        let height = ((bounds.height / cell_size).ceil() as usize).max(1);
        WalkGrid {
            origin: Point::new(bounds.x, bounds.y),
            cell_size,
            cells: GridData::new(width, height, CellFlags::empty()),
        }
    }

    pub fn width(&self) -> usize {
        self.cells.width
    }

    pub fn height(&self) -> usize {
        self.cells.height
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn in_bounds(&self, cx: i32, cy: i32) -> bool {
        cx >= 0 && cy >= 0 && (cx as usize) < self.cells.width && (cy as usize) < self.cells.height
    }

    pub fn flags(&self, cx: i32, cy: i32) -> CellFlags {
        if !self.in_bounds(cx, cy) {
            return CellFlags::WALL;
        }
        *self.cells.get(cx as usize, cy as usize)
    }

    /// In bounds and free of every obstacle flag.
    #[inline]
    pub fn is_walkable(&self, cx: i32, cy: i32) -> bool {
        self.in_bounds(cx, cy) && self.cells.get(cx as usize, cy as usize).is_empty()
    }

    /// Cell containing the point, clamped onto the grid.
    pub fn to_cell(&self, p: Point) -> (i32, i32) {
        let cx = ((p.x - self.origin.x) / self.cell_size).floor() as i32;
        let cy = ((p.y - self.origin.y) / self.cell_size).floor() as i32;
        (
            cx.clamp(0, self.cells.width as i32 - 1),
            cy.clamp(0, self.cells.height as i32 - 1),
        )
    }

    pub fn cell_center(&self, cell: (i32, i32)) -> Point {
        Point::new(
            self.origin.x + (cell.0 as f64 + 0.5) * self.cell_size,
            self.origin.y + (cell.1 as f64 + 0.5) * self.cell_size,
        )
    }

    /// The square of side `2 * radius + 1` centered on the cell is fully
    /// walkable. Radius 0 degrades to a plain walkability test.
    pub fn has_clearance(&self, cx: i32, cy: i32, radius: i32) -> bool {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if !self.is_walkable(cx + dx, cy + dy) {
                    return false;
                }
            }
        }
        true
    }

    /// Closest walkable cell in expanding Chebyshev rings, scanned in a
    /// fixed order so results are stable run to run.
    pub fn nearest_walkable(&self, cell: (i32, i32), max_radius: i32) -> Option<(i32, i32)> {
        for r in 0..=max_radius {
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx.abs().max(dy.abs()) != r {
                        continue;
                    }
                    let c = (cell.0 + dx, cell.1 + dy);
                    if self.is_walkable(c.0, c.1) {
                        return Some(c);
                    }
                }
            }
        }
        None
    }

    /// Every cell traversed by the segment is walkable.
    pub fn is_segment_clear(&self, a: Point, b: Point) -> bool {
        line_cells(self.to_cell(a), self.to_cell(b))
            .into_iter()
            .all(|(cx, cy)| self.is_walkable(cx, cy))
    }
}

/// Supercover grid traversal between two cells: every cell the ideal
/// segment touches, including both sides of an exact diagonal crossing.
pub(crate) fn line_cells(a: (i32, i32), b: (i32, i32)) -> Vec<(i32, i32)> {
    let (mut x, mut y) = a;
    let dx = (b.0 - a.0).abs();
    let dy = (b.1 - a.1).abs();
    let sx = if b.0 >= a.0 { 1 } else { -1 };
    let sy = if b.1 >= a.1 { 1 } else { -1 };

    let mut cells = vec![(x, y)];
    let (mut ix, mut iy) = (0, 0);
    while ix < dx || iy < dy {
        let decision = (1 + 2 * ix) * dy - (1 + 2 * iy) * dx;
        if decision == 0 {
            cells.push((x + sx, y));
            cells.push((x, y + sy));
            x += sx;
            y += sy;
            ix += 1;
            iy += 1;
        } else if decision < 0 {
            x += sx;
            ix += 1;
        } else {
            y += sy;
            iy += 1;
        }
        cells.push((x, y));
    }
    cells
}

/// Placement and routing queries over the immutable floor plan.
pub struct ObstacleIndex {
    bounds: Rect,
    rects: Vec<Rect>,
    buckets: Option<FnvHashMap<(i32, i32), Vec<usize>>>,
    grid: WalkGrid,
}

impl ObstacleIndex {
    /// Rasterize the plan and collect the static obstacle rectangles.
    /// Walls are inflated by half the corridor width in the grid only; the
    /// rect list keeps raw footprints and applies clearance per query.
    pub fn build(plan: &FloorPlan, config: &LayoutConfig) -> Self {
        let bounds = *plan.bounds();
        let mut grid = WalkGrid::new(&bounds, config.grid_cell_size);
        let margin = config.corridor_width / 2.0;

        let mut rects = Vec::new();
        for wall in plan.walls() {
            rects.push(wall.rect);
            mark_rect(&mut grid, &wall.rect, CellFlags::WALL);
            mark_rect(&mut grid, &wall.rect.inflate(margin), CellFlags::MARGIN);
        }
        for zone in plan.restricted_zones() {
            let zone_bounds = zone.polygon.bounds();
            rects.push(zone_bounds);
            mark_zone(&mut grid, zone);
        }

        let buckets = (rects.len() > BUCKET_THRESHOLD).then(|| {
            let mut map: FnvHashMap<(i32, i32), Vec<usize>> = FnvHashMap::default();
            for (i, rect) in rects.iter().enumerate() {
                for key in bucket_range(&bounds, rect) {
                    map.entry(key).or_default().push(i);
                }
            }
            map
        });

        debug!(
            "obstacle index: {} rects, {}x{} grid cells, buckets: {}",
            rects.len(),
            grid.width(),
            grid.height(),
            buckets.is_some()
        );

        ObstacleIndex {
            bounds,
            rects,
            buckets,
            grid,
        }
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn grid(&self) -> &WalkGrid {
        &self.grid
    }

    pub fn obstacles(&self) -> &[Rect] {
        &self.rects
    }

    /// The rect fits entirely inside the drawing bounds and keeps at least
    /// `clearance` from every wall and restricted zone.
    pub fn is_valid_placement(&self, rect: &Rect, clearance: f64) -> bool {
        self.bounds.contains_rect(rect) && !self.overlaps_obstacle(rect, clearance)
    }

    fn overlaps_obstacle(&self, rect: &Rect, clearance: f64) -> bool {
        match &self.buckets {
            None => self
                .rects
                .iter()
                .any(|o| o.overlaps_with_clearance(rect, clearance)),
            Some(buckets) => {
                let mut seen = FnvHashSet::default();
                for key in bucket_range(&self.bounds, &rect.inflate(clearance)) {
                    if let Some(indices) = buckets.get(&key) {
                        for &i in indices {
                            if seen.insert(i)
                                && self.rects[i].overlaps_with_clearance(rect, clearance)
                            {
                                return true;
                            }
                        }
                    }
                }
                false
            }
        }
    }
}

fn bucket_range(bounds: &Rect, rect: &Rect) -> Vec<(i32, i32)> {
    let kx0 = ((rect.x - bounds.x) / BUCKET_CELL).floor() as i32;
    let ky0 = ((rect.y - bounds.y) / BUCKET_CELL).floor() as i32;
    let kx1 = ((rect.x_max() - bounds.x) / BUCKET_CELL).floor() as i32;
    let ky1 = ((rect.y_max() - bounds.y) / BUCKET_CELL).floor() as i32;
    let mut keys = Vec::new();
    for ky in ky0..=ky1 {
        for kx in kx0..=kx1 {
            keys.push((kx, ky));
        }
    }
    keys
}

/// Mark every cell strictly overlapped by the rect.
fn mark_rect(grid: &mut WalkGrid, rect: &Rect, flags: CellFlags) {
    if rect.is_degenerate() {
        return;
    }
    let (cx0, cy0) = grid.to_cell(Point::new(rect.x, rect.y));
    let (cx1, cy1) = grid.to_cell(Point::new(rect.x_max(), rect.y_max()));
    for cy in cy0..=cy1 {
        for cx in cx0..=cx1 {
            let cell = cell_rect(grid, cx, cy);
            if cell.overlaps(rect) {
                grid.cells
                    .get_mut(cx as usize, cy as usize)
                    .insert(flags);
            }
        }
    }
}

/// Mark every cell touched by the zone polygon: cells whose center lies
/// inside, plus cells crossed by a zone edge.
fn mark_zone(grid: &mut WalkGrid, zone: &crate::floor_plan::RestrictedZone) {
    let zb = zone.polygon.bounds();
    let (cx0, cy0) = grid.to_cell(Point::new(zb.x, zb.y));
    let (cx1, cy1) = grid.to_cell(Point::new(zb.x_max(), zb.y_max()));
    for cy in cy0..=cy1 {
        for cx in cx0..=cx1 {
            let cell = cell_rect(grid, cx, cy);
            let touched = zone.polygon.contains_point(cell.center())
                || zone
                    .polygon
                    .edges()
                    .any(|(a, b)| cell.intersects_segment(a, b));
            if touched {
                grid.cells
                    .get_mut(cx as usize, cy as usize)
                    .insert(CellFlags::RESTRICTED);
            }
        }
    }
}

fn cell_rect(grid: &WalkGrid, cx: i32, cy: i32) -> Rect {
    Rect::new(
        grid.origin.x + cx as f64 * grid.cell_size,
        grid.origin.y + cy as f64 * grid.cell_size,
        grid.cell_size,
        grid.cell_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor_plan::{RestrictedZone, Wall};

    fn plan_with_wall() -> FloorPlan {
        FloorPlan::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![Wall::new(Rect::new(4.0, 0.0, 0.4, 6.0), 0.4, "walls")],
            Vec::new(),
            vec![RestrictedZone::from_rect(Rect::new(7.0, 7.0, 2.0, 2.0), "hs")],
        )
        .unwrap()
    }

    #[test]
    fn wall_cells_unwalkable_with_margin() {
        let plan = plan_with_wall();
        let index = ObstacleIndex::build(&plan, &LayoutConfig::default());
        let grid = index.grid();

        let on_wall = grid.to_cell(Point::new(4.2, 3.0));
        assert!(!grid.is_walkable(on_wall.0, on_wall.1));

        // 0.5 m from the wall face: inside the 0.6 m inflation ring.
        let near_wall = grid.to_cell(Point::new(4.9, 3.0));
        assert!(!grid.is_walkable(near_wall.0, near_wall.1));

        let open = grid.to_cell(Point::new(8.0, 2.0));
        assert!(grid.is_walkable(open.0, open.1));
    }

    #[test]
    fn restricted_zone_cells_unwalkable() {
        let plan = plan_with_wall();
        let index = ObstacleIndex::build(&plan, &LayoutConfig::default());
        let grid = index.grid();
        let inside = grid.to_cell(Point::new(8.0, 8.0));
        assert!(!grid.is_walkable(inside.0, inside.1));
        assert!(grid.flags(inside.0, inside.1).contains(CellFlags::RESTRICTED));
    }

    #[test]
    fn placement_respects_clearance() {
        let plan = plan_with_wall();
        let index = ObstacleIndex::build(&plan, &LayoutConfig::default());

        // Far from everything.
        assert!(index.is_valid_placement(&Rect::new(6.0, 1.0, 2.0, 2.0), 1.2));
        // 0.6 m from the wall: violates a 1.2 m clearance.
        assert!(!index.is_valid_placement(&Rect::new(5.0, 1.0, 2.0, 2.0), 1.2));
        // Overlapping the restricted zone's rect.
        assert!(!index.is_valid_placement(&Rect::new(6.5, 6.5, 2.0, 2.0), 0.0));
        // Poking out of bounds.
        assert!(!index.is_valid_placement(&Rect::new(9.0, 1.0, 2.0, 2.0), 0.0));
    }

    #[test]
    fn bucketed_index_agrees_with_scan() {
        // 600 pillars force the bucket path.
        let mut walls = Vec::new();
        for i in 0..30 {
            for j in 0..20 {
                walls.push(Wall::new(
                    Rect::new(2.0 + i as f64 * 3.0, 2.0 + j as f64 * 3.0, 0.3, 0.3),
                    0.3,
                    "columns",
                ));
            }
        }
        let plan = FloorPlan::new(Rect::new(0.0, 0.0, 100.0, 70.0), walls, Vec::new(), Vec::new())
            .unwrap();
        let index = ObstacleIndex::build(&plan, &LayoutConfig::default());
        assert!(index.obstacles().len() > BUCKET_THRESHOLD);

        // Between pillars with room to spare at zero clearance.
        assert!(index.is_valid_placement(&Rect::new(2.8, 2.8, 1.5, 1.5), 0.0));
        // Clearance 1.2 cannot fit in a 3 m pitch minus a 0.3 m pillar.
        assert!(!index.is_valid_placement(&Rect::new(2.8, 2.8, 1.5, 1.5), 1.2));
    }

    #[test]
    fn segment_clearness() {
        let plan = plan_with_wall();
        let index = ObstacleIndex::build(&plan, &LayoutConfig::default());
        let grid = index.grid();
        // Crosses the wall.
        assert!(!grid.is_segment_clear(Point::new(1.0, 3.0), Point::new(9.0, 3.0)));
        // Passes above the wall's extent.
        assert!(grid.is_segment_clear(Point::new(1.0, 9.0), Point::new(6.0, 9.0)));
    }

    #[test]
    fn supercover_line_is_connected() {
        let cells = line_cells((0, 0), (5, 3));
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(5, 3)));
        for pair in cells.windows(2) {
            let dx = (pair[1].0 - pair[0].0).abs();
            let dy = (pair[1].1 - pair[0].1).abs();
            assert!(dx <= 1 && dy <= 1);
        }
    }

    #[test]
    fn nearest_walkable_escapes_blocked_cell() {
        let plan = plan_with_wall();
        let index = ObstacleIndex::build(&plan, &LayoutConfig::default());
        let grid = index.grid();
        let blocked = grid.to_cell(Point::new(4.2, 3.0));
        let free = grid.nearest_walkable(blocked, 10).unwrap();
        assert!(grid.is_walkable(free.0, free.1));
    }
}
