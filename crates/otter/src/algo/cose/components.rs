//! Packs disconnected components into rows once the simulation is done.

use super::info::{Bounds, LayoutInfo};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct ComponentBox {
    members: Vec<usize>,
    bounds: Bounds,
    /// Contains a locked node, so none of its members move.
    anchored: bool,
}

impl LayoutInfo {
    /// Shelf-packs components (largest area first) into rows of width
    /// `sqrt(total_area) * w / h`, then recenters the packing on the previous layout center.
    /// Components holding a locked node stay where they are; free components are pushed down
    /// until they clear them.
    pub fn separate_components(&mut self, spacing: f64) {
        if self.component_count < 2 {
            return;
        }
        let _span = tracing::debug_span!("cose.separate_components").entered();

        let mut by_id: IndexMap<usize, ComponentBox> = IndexMap::new();
        for (idx, n) in self.nodes.iter().enumerate() {
            let rect = n.rect();
            let c = by_id.entry(n.component_id).or_insert_with(|| ComponentBox {
                members: Vec::new(),
                bounds: rect,
                anchored: false,
            });
            c.members.push(idx);
            c.bounds = c.bounds.union(&rect);
            c.anchored |= n.is_locked;
        }
        let mut components: Vec<ComponentBox> = by_id.into_values().collect();
        let Some(before) = components
            .iter()
            .map(|c| c.bounds)
            .reduce(|a, b| a.union(&b))
        else {
            return;
        };

        components.sort_by(|a, b| b.bounds.area().total_cmp(&a.bounds.area()));

        let total_area: f64 = components.iter().map(|c| c.bounds.area()).sum();
        let bb = self.bounding_box;
        let max_row_width = total_area.sqrt() * bb.w / bb.h;

        let mut x = 0.0f64;
        let mut y = 0.0f64;
        let mut used_width = 0.0f64;
        let mut row_height = 0.0f64;
        let mut placed: Vec<(f64, f64)> = Vec::with_capacity(components.len());
        for c in &components {
            placed.push((x, y));
            let w = c.bounds.width();
            let h = c.bounds.height();
            x += w + spacing;
            used_width += w + spacing;
            row_height = row_height.max(h);
            if used_width > max_row_width {
                y += row_height + spacing;
                x = 0.0;
                used_width = 0.0;
                row_height = 0.0;
            }
        }

        let packed = components
            .iter()
            .zip(&placed)
            .map(|(c, &(px, py))| Bounds {
                min_x: px,
                max_x: px + c.bounds.width(),
                min_y: py,
                max_y: py + c.bounds.height(),
            })
            .reduce(|a, b| a.union(&b))
            .unwrap_or(before);
        // The first anchored component pins the packing; otherwise keep the previous center.
        let (shift_x, shift_y) = match components.iter().zip(&placed).find(|(c, _)| c.anchored) {
            Some((c, &(px, py))) => (c.bounds.min_x - px, c.bounds.min_y - py),
            None => (
                (before.min_x + before.max_x) / 2.0 - (packed.min_x + packed.max_x) / 2.0,
                (before.min_y + before.max_y) / 2.0 - (packed.min_y + packed.max_y) / 2.0,
            ),
        };

        // Anchored boxes never move, so free slots have to clear them.
        let mut occupied: Vec<Bounds> = components
            .iter()
            .filter(|c| c.anchored)
            .map(|c| c.bounds)
            .collect();
        let mut pushed = 0usize;
        for (c, &(px, py)) in components.iter().zip(&placed) {
            if c.anchored {
                continue;
            }
            let mut target = c.bounds;
            target.translate(px - c.bounds.min_x + shift_x, py - c.bounds.min_y + shift_y);
            while let Some(obstacle) = occupied
                .iter()
                .find(|o| too_close(&target, o, spacing))
                .copied()
            {
                let dy = obstacle.max_y + spacing - target.min_y;
                target.translate(0.0, dy);
                pushed += 1;
            }
            occupied.push(target);

            let dx = target.min_x - c.bounds.min_x;
            let dy = target.min_y - c.bounds.min_y;
            for &idx in &c.members {
                self.nodes[idx].translate(dx, dy);
            }
        }
        self.refresh_compound_bounds();

        tracing::debug!(
            components = components.len(),
            anchored = components.iter().filter(|c| c.anchored).count(),
            pushed,
            max_row_width,
            "separated components"
        );
    }
}

/// Whether `a` comes closer than `spacing` to `b` on both axes.
fn too_close(a: &Bounds, b: &Bounds, spacing: f64) -> bool {
    const EPS: f64 = 1e-9;
    a.min_x < b.max_x + spacing - EPS
        && b.min_x < a.max_x + spacing - EPS
        && a.min_y < b.max_y + spacing - EPS
        && b.min_y < a.max_y + spacing - EPS
}

#[cfg(test)]
mod tests {
    use super::too_close;
    use crate::algo::CoseOptions;
    use crate::algo::cose::info::{Bounds, LayoutInfo};
    use crate::graph::{Graph, Node};

    #[test]
    fn single_component_is_left_alone() {
        let g = Graph {
            nodes: vec![Node::new("a", 10.0, 10.0).at(3.0, 4.0)],
            edges: Vec::new(),
        };
        let mut info = LayoutInfo::build(&g, &CoseOptions::default());
        info.separate_components(40.0);
        assert_eq!((info.nodes[0].position_x, info.nodes[0].position_y), (3.0, 4.0));
    }

    #[test]
    fn larger_components_are_placed_first() {
        let g = Graph {
            nodes: vec![
                Node::new("small", 10.0, 10.0).at(0.0, 0.0),
                Node::new("big", 100.0, 100.0).at(0.0, 0.0),
            ],
            edges: Vec::new(),
        };
        let opts = CoseOptions {
            bounding_box: Some(crate::graph::BoundingBox {
                x1: 0.0,
                y1: 0.0,
                w: 1000.0,
                h: 100.0,
            }),
            ..Default::default()
        };
        let mut info = LayoutInfo::build(&g, &opts);
        info.separate_components(40.0);
        let small = info.node("small").unwrap().rect();
        let big = info.node("big").unwrap().rect();
        // Wide target rows keep both on one shelf, big one on the left.
        assert!((small.min_x - big.max_x - 40.0).abs() < 1e-9);
        assert!((small.min_y - big.min_y).abs() < 1e-9);
    }

    #[test]
    fn free_components_clear_every_anchored_component() {
        let g = Graph {
            nodes: vec![
                Node::new("a", 10.0, 10.0).at(0.0, 0.0).locked(),
                Node::new("b", 10.0, 10.0).at(0.0, 100.0).locked(),
                Node::new("c", 10.0, 10.0).at(300.0, 300.0),
            ],
            edges: Vec::new(),
        };
        let mut info = LayoutInfo::build(&g, &CoseOptions::default());
        info.separate_components(40.0);
        let a = info.node("a").unwrap().rect();
        let b = info.node("b").unwrap().rect();
        let c = info.node("c").unwrap().rect();
        assert_eq!(a, Bounds::around(0.0, 0.0, 10.0, 10.0));
        assert_eq!(b, Bounds::around(0.0, 100.0, 10.0, 10.0));
        assert!(!too_close(&c, &a, 40.0));
        assert!(!too_close(&c, &b, 40.0));
    }

    #[test]
    fn too_close_needs_a_spacing_gap_on_one_axis() {
        let a = Bounds::around(0.0, 0.0, 10.0, 10.0);
        assert!(too_close(&a, &Bounds::around(0.0, 45.0, 10.0, 10.0), 40.0));
        assert!(!too_close(&a, &Bounds::around(0.0, 50.0, 10.0, 10.0), 40.0));
        assert!(!too_close(&a, &Bounds::around(50.0, 0.0, 10.0, 10.0), 40.0));
    }

    #[test]
    fn anchored_components_do_not_move() {
        let g = Graph {
            nodes: vec![
                Node::new("a", 10.0, 10.0).at(0.0, 0.0).locked(),
                Node::new("b", 10.0, 10.0).at(0.0, 0.0),
            ],
            edges: Vec::new(),
        };
        let mut info = LayoutInfo::build(&g, &CoseOptions::default());
        info.separate_components(40.0);
        assert_eq!((info.nodes[0].position_x, info.nodes[0].position_y), (0.0, 0.0));
        let b = info.nodes[1].rect();
        let a = info.nodes[0].rect();
        assert!(b.min_x >= a.max_x + 40.0 - 1e-9 || b.min_y >= a.max_y + 40.0 - 1e-9);
    }
}
