//! Per-iteration forces: repulsion, springs, gravity and parent-to-child propagation.

use super::info::{Bounds, LayoutInfo, LayoutNode};
use super::rng::XorShift64Star;
use crate::algo::CoseOptions;
use crate::graph::{BoundingBox, Point};
use std::collections::VecDeque;

/// Nodes closer than this to their gravity center feel no gravity.
const GRAVITY_DEAD_ZONE: f64 = 1.0;
/// Half-width of the random direction used when two centers coincide.
const MAX_RANDOM_DIRECTION: f64 = 1.0;

/// Where the line from the node's center along `(dx, dy)` leaves its rectangle.
pub(crate) fn clipping_point(n: &LayoutNode, dx: f64, dy: f64) -> (f64, f64) {
    let x = n.position_x;
    let y = n.position_y;
    if dx == 0.0 && dy == 0.0 {
        return (x, y);
    }

    let mut t_x = f64::INFINITY;
    let mut t_y = f64::INFINITY;
    if dx != 0.0 {
        t_x = (n.width / 2.0 / dx.abs()).max(0.0);
    }
    if dy != 0.0 {
        t_y = (n.height / 2.0 / dy.abs()).max(0.0);
    }
    let t = t_x.min(t_y);
    (x + t * dx, y + t * dy)
}

/// Diagonal of the overlap box of `a` and `b` (0 when they do not overlap). `(dx, dy)` points from
/// `a` towards `b`.
pub(crate) fn overlap_diagonal(a: &Bounds, b: &Bounds, dx: f64, dy: f64) -> f64 {
    let overlap_x = if dx > 0.0 {
        a.max_x - b.min_x
    } else {
        b.max_x - a.min_x
    };
    let overlap_y = if dy > 0.0 {
        a.max_y - b.min_y
    } else {
        b.max_y - a.min_y
    };
    if overlap_x >= 0.0 && overlap_y >= 0.0 {
        (overlap_x * overlap_x + overlap_y * overlap_y).sqrt()
    } else {
        0.0
    }
}

/// Clamps the vector's length to `max`, keeping its direction.
pub(crate) fn limit_force(fx: f64, fy: f64, max: f64) -> (f64, f64) {
    if fx.is_nan() || fy.is_nan() {
        return (0.0, 0.0);
    }
    let fx = fx.clamp(-f64::MAX, f64::MAX);
    let fy = fy.clamp(-f64::MAX, f64::MAX);
    // Normalize first so huge forces do not overflow the length.
    let m = fx.abs().max(fy.abs());
    if m == 0.0 {
        return (0.0, 0.0);
    }
    let (ux, uy) = (fx / m, fy / m);
    let len = ux.hypot(uy);
    if m * len > max {
        (max * ux / len, max * uy / len)
    } else {
        (fx, fy)
    }
}

pub(crate) fn root_gravity_center(bb: &BoundingBox, legacy: bool) -> Point {
    if legacy {
        // Cytoscape swaps the viewport extents here and ignores the box origin.
        Point {
            x: bb.h / 2.0,
            y: bb.w / 2.0,
        }
    } else {
        bb.center()
    }
}

impl LayoutInfo {
    /// Repulsion between every pair of siblings (nodes of the same group).
    pub(crate) fn apply_repulsion(&mut self, opts: &CoseOptions, rng: &mut XorShift64Star) {
        for g in 0..self.graph_set.len() {
            let len = self.graph_set[g].len();
            for j in 0..len {
                for k in (j + 1)..len {
                    let a = self.graph_set[g][j];
                    let b = self.graph_set[g][k];
                    self.repel_pair(a, b, opts, rng);
                }
            }
        }
    }

    fn repel_pair(&mut self, a: usize, b: usize, opts: &CoseOptions, rng: &mut XorShift64Star) {
        let n1 = &self.nodes[a];
        let n2 = &self.nodes[b];
        if n1.is_locked && n2.is_locked {
            return;
        }

        let mut dx = n2.position_x - n1.position_x;
        let mut dy = n2.position_y - n1.position_y;
        if dx == 0.0 && dy == 0.0 {
            dx = rng.next_f64_symmetric(MAX_RANDOM_DIRECTION);
            dy = rng.next_f64_symmetric(MAX_RANDOM_DIRECTION);
        }

        let overlap = overlap_diagonal(&n1.rect(), &n2.rect(), dx, dy);
        let (fx, fy) = if overlap > 0.0 {
            let force = opts.node_overlap * overlap;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist == 0.0 {
                return;
            }
            (force * dx / dist, force * dy / dist)
        } else {
            let (x1, y1) = clipping_point(n1, dx, dy);
            let (x2, y2) = clipping_point(n2, -dx, -dy);
            let lx = x2 - x1;
            let ly = y2 - y1;
            let dist_sq = lx * lx + ly * ly;
            if dist_sq == 0.0 {
                return;
            }
            let dist = dist_sq.sqrt();
            let force = (n1.repulsion + n2.repulsion) / dist_sq;
            (force * lx / dist, force * ly / dist)
        };

        if !self.nodes[a].is_locked {
            self.nodes[a].offset_x -= fx;
            self.nodes[a].offset_y -= fy;
        }
        if !self.nodes[b].is_locked {
            self.nodes[b].offset_x += fx;
            self.nodes[b].offset_y += fy;
        }
    }

    /// Spring force `(ideal - gap)^2 / elasticity` along every edge, where `gap` is the signed
    /// distance between the clipped boundary points.
    pub(crate) fn apply_edge_forces(&mut self) {
        for e in 0..self.edges.len() {
            let edge = &self.edges[e];
            let source = &self.nodes[edge.source];
            let target = &self.nodes[edge.target];

            let dx = target.position_x - source.position_x;
            let dy = target.position_y - source.position_y;
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            let (x1, y1) = clipping_point(source, dx, dy);
            let (x2, y2) = clipping_point(target, -dx, -dy);
            let dist = (dx * dx + dy * dy).sqrt();
            let ux = dx / dist;
            let uy = dy / dist;
            // Negative once the two rectangles pass each other along the center line.
            let gap = (x2 - x1) * ux + (y2 - y1) * uy;
            if gap == 0.0 {
                continue;
            }

            let deviation = gap - edge.ideal_length;
            // Positive pulls the endpoints together.
            let force = deviation * deviation.abs() / edge.elasticity;
            let fx = force * ux;
            let fy = force * uy;

            let (s, t) = (edge.source, edge.target);
            if !self.nodes[s].is_locked {
                self.nodes[s].offset_x += fx;
                self.nodes[s].offset_y += fy;
            }
            if !self.nodes[t].is_locked {
                self.nodes[t].offset_x -= fx;
                self.nodes[t].offset_y -= fy;
            }
        }
    }

    /// Constant-magnitude pull towards each group's center: the layout center for the root group,
    /// the owning compound for nested groups.
    pub(crate) fn apply_gravity(&mut self, opts: &CoseOptions) {
        if opts.gravity == 0.0 {
            return;
        }
        let root_center = root_gravity_center(&self.bounding_box, opts.legacy_root_gravity_center);
        for g in 0..self.graph_set.len() {
            let (cx, cy) = match self.group_owner[g] {
                None => (root_center.x, root_center.y),
                Some(owner) => (self.nodes[owner].position_x, self.nodes[owner].position_y),
            };
            for k in 0..self.graph_set[g].len() {
                let n = &mut self.nodes[self.graph_set[g][k]];
                if n.is_locked {
                    continue;
                }
                let dx = cx - n.position_x;
                let dy = cy - n.position_y;
                let d = (dx * dx + dy * dy).sqrt();
                if d > GRAVITY_DEAD_ZONE {
                    n.offset_x += opts.gravity * dx / d;
                    n.offset_y += opts.gravity * dy / d;
                }
            }
        }
    }

    /// Hands every unlocked compound's offset down to its children, top-down.
    pub(crate) fn propagate_forces(&mut self) {
        let mut queue: VecDeque<usize> = self
            .graph_set
            .first()
            .into_iter()
            .flatten()
            .copied()
            .collect();
        while let Some(idx) = queue.pop_front() {
            if !self.nodes[idx].is_compound() {
                continue;
            }
            if !self.nodes[idx].is_locked {
                let off_x = self.nodes[idx].offset_x;
                let off_y = self.nodes[idx].offset_y;
                for k in 0..self.nodes[idx].children.len() {
                    let child = self.nodes[idx].children[k];
                    self.nodes[child].offset_x += off_x;
                    self.nodes[child].offset_y += off_y;
                }
                self.nodes[idx].offset_x = 0.0;
                self.nodes[idx].offset_y = 0.0;
            }
            queue.extend(self.nodes[idx].children.iter().copied());
        }
    }

    /// Moves unlocked leaves by their clamped offsets and rebuilds compound geometry. Returns the
    /// total displacement.
    pub(crate) fn update_positions(&mut self, temperature: f64) -> f64 {
        self.reset_compound_bounds();
        let mut total = 0.0f64;
        for idx in 0..self.nodes.len() {
            let n = &mut self.nodes[idx];
            if n.is_compound() {
                continue;
            }
            if !n.is_locked {
                let (dx, dy) = limit_force(n.offset_x, n.offset_y, temperature);
                n.position_x += dx;
                n.position_y += dy;
                total += (dx * dx + dy * dy).sqrt();
                n.refresh_bounds_from_position();
            }
            n.offset_x = 0.0;
            n.offset_y = 0.0;
            self.update_ancestry_boundaries(idx);
        }
        self.finish_compound_geometry();
        total
    }
}
