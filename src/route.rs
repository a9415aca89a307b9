//! Grid A* between îlot centers, with the corridor-width clearance check
//! folded into node expansion and a greedy line-of-sight smoothing pass
//! over the raw cell path.

use crate::geometry::Point;
use crate::obstacle::{line_cells, WalkGrid, NEIGHBORS_8};
use pathfinding::directed::astar::astar;

/// Cost of an orthogonal step.
pub const STEP_ORTHO: u32 = 10;
/// Cost of a diagonal step.
pub const STEP_DIAG: u32 = 14;

/// How far (in cells) an endpoint may be nudged to escape a cell swallowed
/// by wall inflation.
const ANCHOR_RADIUS: i32 = 8;

/// Clearance radius in cells for a corridor of the given width: the
/// half-corridor-width square every expanded node must admit.
pub fn clearance_cells(corridor_width: f64, cell_size: f64) -> i32 {
    ((corridor_width / 2.0) / cell_size).floor() as i32
}

/// Route an obstacle-free polyline from `start` to `goal`.
///
/// Expansion requires `clearance` cells of walkable space around every
/// node. The returned polyline runs through cell centers except for its
/// endpoints, which are the exact requested points so the corridor abuts
/// the îlots it connects. Returns `None` when no path exists; the caller
/// falls back to a direct segment.
pub fn route(grid: &WalkGrid, start: Point, goal: Point, clearance: i32) -> Option<Vec<Point>> {
    let start_cell = anchor_cell(grid, start)?;
    let goal_cell = anchor_cell(grid, goal)?;
    if start_cell == goal_cell {
        return Some(vec![start, goal]);
    }

    let (path, _cost) = astar(
        &start_cell,
        |&(x, y)| {
            NEIGHBORS_8
                .iter()
                .filter_map(move |&(dx, dy)| {
                    let nx = x + dx;
                    let ny = y + dy;
                    if !grid.has_clearance(nx, ny, clearance) {
                        return None;
                    }
                    let cost = if dx != 0 && dy != 0 {
                        STEP_DIAG
                    } else {
                        STEP_ORTHO
                    };
                    Some(((nx, ny), cost))
                })
                .collect::<Vec<_>>()
        },
        |&cell| octile(cell, goal_cell),
        |&cell| cell == goal_cell,
    )?;

    let smoothed = smooth(grid, &path);
    let mut points: Vec<Point> = smoothed.iter().map(|&c| grid.cell_center(c)).collect();
    if let Some(first) = points.first_mut() {
        *first = start;
    }
    if let Some(last) = points.last_mut() {
        *last = goal;
    }
    Some(points)
}

/// Octile distance scaled to the 10/14 step costs: admissible for
/// 8-directional movement.
fn octile(a: (i32, i32), b: (i32, i32)) -> u32 {
    let dx = (a.0 - b.0).unsigned_abs();
    let dy = (a.1 - b.1).unsigned_abs();
    STEP_ORTHO * dx.max(dy) + (STEP_DIAG - STEP_ORTHO) * dx.min(dy)
}

/// The cell holding the point, or the nearest walkable cell when wall
/// inflation swallowed it.
fn anchor_cell(grid: &WalkGrid, p: Point) -> Option<(i32, i32)> {
    let cell = grid.to_cell(p);
    if grid.is_walkable(cell.0, cell.1) {
        return Some(cell);
    }
    grid.nearest_walkable(cell, ANCHOR_RADIUS)
}

/// Greedy line-of-sight smoothing: from each kept node, jump to the
/// farthest later node reachable by a collision-free straight segment.
fn smooth(grid: &WalkGrid, path: &[(i32, i32)]) -> Vec<(i32, i32)> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let mut out = vec![path[0]];
    let mut i = 0;
    while i + 1 < path.len() {
        let mut j = path.len() - 1;
        while j > i + 1 && !line_of_sight(grid, path[i], path[j]) {
            j -= 1;
        }
        out.push(path[j]);
        i = j;
    }
    out
}

fn line_of_sight(grid: &WalkGrid, a: (i32, i32), b: (i32, i32)) -> bool {
    line_cells(a, b).into_iter().all(|(x, y)| grid.is_walkable(x, y))
}
