//! Corridor network synthesis for one candidate layout.
//!
//! Three stages, in order: straight corridors between facing îlot rows,
//! MST + A* completion of the remaining connected components, and optional
//! perimeter corridors outside the îlot bounding box. Every emitted
//! corridor registers itself on the îlots it connects.

use crate::candidate::IdGen;
use crate::config::LayoutConfig;
use crate::geometry::Point;
use crate::ilot::Ilot;
use crate::obstacle::ObstacleIndex;
use crate::route::{clearance_cells, route};
use crate::rows::{detect_rows, facing_pairs, Axis, FacingRows, Row, GAP_MAX, ROW_TOLERANCE};
use log::warn;
use serde::{Deserialize, Serialize};

/// Minimum corridor width, in meters, that counts as accessible.
pub const ADA_MIN_WIDTH: f64 = 1.22;

/// An orthogonal walking path of fixed width between îlots.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corridor {
    pub id: String,
    /// Ordered polyline of at least two points.
    pub path: Vec<Point>,
    pub width: f64,
    /// Ids of the îlots this corridor serves.
    pub connected_ilots: Vec<String>,
    /// Sum of segment lengths.
    pub length: f64,
    /// Wide enough for ADA (≥ 1.22 m) and verified obstacle-free. A*
    /// fallback segments are never accessible.
    pub accessible: bool,
}

impl Corridor {
    fn new(id: String, path: Vec<Point>, width: f64, connected: Vec<String>, clear: bool) -> Self {
        let length = path_length(&path);
        Corridor {
            id,
            path,
            width,
            connected_ilots: connected,
            length,
            accessible: width >= ADA_MIN_WIDTH && clear,
        }
    }
}

pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

/// Path-compressed union-find over integer-indexed îlots.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets holding `a` and `b`; false if already joined.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Kruskal MST over the complete Euclidean graph of the given points.
/// Edges come back in selection order (ascending weight, ties by index),
/// which keeps downstream corridor ids stable.
pub(crate) fn mst_edges(points: &[Point]) -> Vec<(usize, usize, f64)> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let mut edges = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            edges.push((i, j, points[i].distance_to(points[j])));
        }
    }
    edges.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));

    let mut uf = UnionFind::new(n);
    let mut selected = Vec::with_capacity(n - 1);
    for (i, j, w) in edges {
        if uf.union(i, j) {
            selected.push((i, j, w));
            if selected.len() == n - 1 {
                break;
            }
        }
    }
    selected
}

/// Total weight of the Euclidean MST; the "optimal" corridor length used
/// by the efficiency metric.
pub(crate) fn mst_weight(points: &[Point]) -> f64 {
    mst_edges(points).iter().map(|e| e.2).sum()
}

/// Synthesize the corridor network for the given îlots, appending corridor
/// ids to each connected îlot's `corridor_connections`.
pub fn synthesize(
    index: &ObstacleIndex,
    config: &LayoutConfig,
    ilots: &mut [Ilot],
    ids: &mut IdGen,
) -> Vec<Corridor> {
    for ilot in ilots.iter_mut() {
        ilot.corridor_connections.clear();
    }

    let mut corridors = Vec::new();
    let mut connectivity = UnionFind::new(ilots.len());

    // Stage A: straight corridors between facing rows, both axes.
    for axis in [Axis::Horizontal, Axis::Vertical] {
        let rows = detect_rows(ilots, axis, ROW_TOLERANCE);
        for pair in facing_pairs(&rows, config.corridor_width, GAP_MAX) {
            let corridor = facing_corridor(index, config, ilots, ids, axis, &rows, &pair);
            register(ilots, &mut connectivity, &corridor);
            corridors.push(corridor);
        }
    }

    // Stage B: connect the remaining components along MST edges.
    let components = component_members(&mut connectivity, ilots.len());
    if components.len() > 1 {
        let reps: Vec<usize> = components
            .iter()
            .map(|members| representative(ilots, members))
            .collect();
        let centers: Vec<Point> = reps.iter().map(|&i| ilots[i].center()).collect();
        let clearance = clearance_cells(config.corridor_width, index.grid().cell_size());

        for (a, b, _w) in mst_edges(&centers) {
            let (ia, ib) = (reps[a], reps[b]);
            let start = ilots[ia].center();
            let goal = ilots[ib].center();
            let (path, clear) = match route(index.grid(), start, goal, clearance) {
                Some(path) => (path, true),
                None => {
                    warn!(
                        "no corridor path between {} and {}, falling back to direct segment",
                        ilots[ia].id, ilots[ib].id
                    );
                    (vec![start, goal], false)
                }
            };
            let corridor = Corridor::new(
                ids.next_corridor(),
                path,
                config.corridor_width,
                vec![ilots[ia].id.clone(), ilots[ib].id.clone()],
                clear,
            );
            register(ilots, &mut connectivity, &corridor);
            corridors.push(corridor);
        }
    }

    // Stage C: optional perimeter corridors above and below the layout.
    if config.perimeter_corridors && !ilots.is_empty() {
        corridors.extend(perimeter_corridors(index, config, ilots, ids));
    }

    corridors
}

fn facing_corridor(
    index: &ObstacleIndex,
    config: &LayoutConfig,
    ilots: &[Ilot],
    ids: &mut IdGen,
    axis: Axis,
    rows: &[Row],
    pair: &FacingRows,
) -> Corridor {
    let (a, b) = match axis {
        Axis::Horizontal => (
            Point::new(pair.overlap.0, pair.midline),
            Point::new(pair.overlap.1, pair.midline),
        ),
        Axis::Vertical => (
            Point::new(pair.midline, pair.overlap.0),
            Point::new(pair.midline, pair.overlap.1),
        ),
    };
    let mut members: Vec<usize> = rows[pair.lower].members.clone();
    members.extend_from_slice(&rows[pair.upper].members);
    members.sort_unstable();
    let connected = members.iter().map(|&i| ilots[i].id.clone()).collect();
    let clear = index.grid().is_segment_clear(a, b);
    Corridor::new(
        ids.next_corridor(),
        vec![a, b],
        config.corridor_width,
        connected,
        clear,
    )
}

/// Append the corridor id to its îlots and join them in the union-find.
fn register(ilots: &mut [Ilot], connectivity: &mut UnionFind, corridor: &Corridor) {
    let mut first: Option<usize> = None;
    for (i, ilot) in ilots.iter_mut().enumerate() {
        if corridor.connected_ilots.iter().any(|id| *id == ilot.id) {
            ilot.corridor_connections.push(corridor.id.clone());
            match first {
                None => first = Some(i),
                Some(f) => {
                    connectivity.union(f, i);
                }
            }
        }
    }
}

/// Connected components as member lists, ordered by smallest member so the
/// result never depends on hash iteration.
fn component_members(uf: &mut UnionFind, n: usize) -> Vec<Vec<usize>> {
    let mut by_root: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..n {
        let root = uf.find(i);
        match by_root.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => by_root.push((root, vec![i])),
        }
    }
    let mut components: Vec<Vec<usize>> = by_root.into_iter().map(|(_, m)| m).collect();
    components.sort_by_key(|m| m[0]);
    components
}

/// The member îlot closest to the component centroid, ties to the lowest
/// index.
fn representative(ilots: &[Ilot], members: &[usize]) -> usize {
    let n = members.len() as f64;
    let cx = members.iter().map(|&i| ilots[i].center().x).sum::<f64>() / n;
    let cy = members.iter().map(|&i| ilots[i].center().y).sum::<f64>() / n;
    let centroid = Point::new(cx, cy);
    members
        .iter()
        .copied()
        .min_by(|&a, &b| {
            ilots[a]
                .center()
                .distance_to(centroid)
                .total_cmp(&ilots[b].center().distance_to(centroid))
                .then(a.cmp(&b))
        })
        .unwrap_or(members[0])
}

/// Straight corridors one corridor width above and below the îlot bounding
/// box, connected to the îlots lining the matching edge.
fn perimeter_corridors(
    index: &ObstacleIndex,
    config: &LayoutConfig,
    ilots: &mut [Ilot],
    ids: &mut IdGen,
) -> Vec<Corridor> {
    let mut x0 = f64::INFINITY;
    let mut x1 = f64::NEG_INFINITY;
    let mut y0 = f64::INFINITY;
    let mut y1 = f64::NEG_INFINITY;
    for ilot in ilots.iter() {
        let r = ilot.rect();
        x0 = x0.min(r.x);
        x1 = x1.max(r.x_max());
        y0 = y0.min(r.y);
        y1 = y1.max(r.y_max());
    }

    let bounds = index.bounds();
    let width = config.corridor_width;
    let mut corridors = Vec::new();

    for (line_y, edge, top) in [(y1 + width, y1, true), (y0 - width, y0, false)] {
        if line_y - width / 2.0 < bounds.y || line_y + width / 2.0 > bounds.y_max() {
            continue;
        }
        let a = Point::new(x0, line_y);
        let b = Point::new(x1, line_y);
        let connected: Vec<String> = ilots
            .iter()
            .filter(|ilot| {
                let r = ilot.rect();
                if top {
                    r.y_max() >= edge - width
                } else {
                    r.y <= edge + width
                }
            })
            .map(|ilot| ilot.id.clone())
            .collect();
        let clear = index.grid().is_segment_clear(a, b);
        let corridor = Corridor::new(ids.next_corridor(), vec![a, b], width, connected, clear);
        for ilot in ilots.iter_mut() {
            if corridor.connected_ilots.iter().any(|id| *id == ilot.id) {
                ilot.corridor_connections.push(corridor.id.clone());
            }
        }
        corridors.push(corridor);
    }
    corridors
}
