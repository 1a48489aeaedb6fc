//! Flat simulation model built from the input graph.

use super::rng::XorShift64Star;
use crate::algo::CoseOptions;
use crate::graph::{BoundingBox, Graph, Padding};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn around(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: cx - width / 2.0,
            max_x: cx + width / 2.0,
            min_y: cy - height / 2.0,
            max_y: cy + height / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, other: &Bounds, eps: f64) -> bool {
        other.min_x >= self.min_x - eps
            && other.max_x <= self.max_x + eps
            && other.min_y >= self.min_y - eps
            && other.max_y <= self.max_y + eps
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.min_x += dx;
        self.max_x += dx;
        self.min_y += dy;
        self.max_y += dy;
    }
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub position_x: f64,
    pub position_y: f64,
    /// Force accumulated during the current iteration.
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
    /// `None` only while a compound is being rebuilt during a position-update pass.
    pub bounds: Option<Bounds>,
    pub padding: Padding,
    pub is_locked: bool,
    pub component_id: usize,
    pub repulsion: f64,
}

impl LayoutNode {
    pub fn is_compound(&self) -> bool {
        !self.children.is_empty()
    }

    /// Current bounds, falling back to the box around the center.
    pub fn rect(&self) -> Bounds {
        self.bounds.unwrap_or_else(|| {
            Bounds::around(self.position_x, self.position_y, self.width, self.height)
        })
    }

    pub(crate) fn refresh_bounds_from_position(&mut self) {
        self.bounds = Some(Bounds::around(
            self.position_x,
            self.position_y,
            self.width,
            self.height,
        ));
    }

    pub(crate) fn translate(&mut self, dx: f64, dy: f64) {
        self.position_x += dx;
        self.position_y += dy;
        if let Some(b) = self.bounds.as_mut() {
            b.translate(dx, dy);
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutEdge {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub ideal_length: f64,
    pub elasticity: f64,
}

#[derive(Debug, Clone)]
pub struct LayoutInfo {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    /// Group 0 holds the root-level nodes; every other group holds the children of one compound.
    pub graph_set: Vec<Vec<usize>>,
    pub index_to_graph: Vec<usize>,
    /// Compound owning each group (`None` for group 0).
    pub group_owner: Vec<Option<usize>>,
    pub id_to_idx: FxHashMap<String, usize>,
    pub bounding_box: BoundingBox,
    pub component_count: usize,
    pub dropped_edges: Vec<String>,
}

impl LayoutInfo {
    pub fn build(graph: &Graph, opts: &CoseOptions) -> Self {
        let _span = tracing::debug_span!("cose.build").entered();
        let bounding_box = opts.effective_bounding_box();

        let mut nodes: Vec<LayoutNode> = Vec::with_capacity(graph.nodes.len());
        let mut parent_ids: Vec<Option<&str>> = Vec::with_capacity(graph.nodes.len());
        let mut id_to_idx: FxHashMap<String, usize> = FxHashMap::default();
        id_to_idx.reserve(graph.nodes.len());
        for n in &graph.nodes {
            if id_to_idx.contains_key(n.id.as_str()) {
                tracing::warn!(node_id = %n.id, "duplicate node id; keeping the first occurrence");
                continue;
            }
            let width = if n.width.is_finite() { n.width.max(1.0) } else { 1.0 };
            let height = if n.height.is_finite() { n.height.max(1.0) } else { 1.0 };
            let x = if n.x.is_finite() { n.x } else { 0.0 };
            let y = if n.y.is_finite() { n.y } else { 0.0 };
            let repulsion = n
                .repulsion
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(opts.node_repulsion);
            id_to_idx.insert(n.id.clone(), nodes.len());
            parent_ids.push(n.parent.as_deref());
            nodes.push(LayoutNode {
                id: n.id.clone(),
                parent: None,
                children: Vec::new(),
                position_x: x,
                position_y: y,
                offset_x: 0.0,
                offset_y: 0.0,
                width,
                height,
                bounds: Some(Bounds::around(x, y, width, height)),
                padding: sanitize_padding(n.padding),
                is_locked: n.locked,
                component_id: 0,
                repulsion,
            });
        }

        // Parent links; unknown parents and self-parents leave the node at root level.
        for (idx, parent_id) in parent_ids.iter().enumerate() {
            nodes[idx].parent = parent_id
                .and_then(|p| id_to_idx.get(p).copied())
                .filter(|&p| p != idx);
        }
        for idx in 0..nodes.len() {
            if let Some(p) = nodes[idx].parent {
                nodes[p].children.push(idx);
            }
        }
        break_parent_cycles(&mut nodes);

        let (graph_set, group_owner) = build_graph_set(&nodes);
        let mut index_to_graph = vec![0usize; nodes.len()];
        for (g, members) in graph_set.iter().enumerate() {
            for &idx in members {
                index_to_graph[idx] = g;
            }
        }

        let mut edges: Vec<LayoutEdge> = Vec::with_capacity(graph.edges.len());
        let mut dropped_edges: Vec<String> = Vec::new();
        for e in &graph.edges {
            let (Some(&source), Some(&target)) = (
                id_to_idx.get(e.source.as_str()),
                id_to_idx.get(e.target.as_str()),
            ) else {
                dropped_edges.push(e.id.clone());
                continue;
            };
            let mut ideal_length = e
                .ideal_length
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(opts.ideal_edge_length);
            let elasticity = e
                .elasticity
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(opts.edge_elasticity);
            if index_to_graph[source] != index_to_graph[target] {
                let (_, source_depth, target_depth) =
                    lowest_common_group(&nodes, &index_to_graph, source, target);
                ideal_length *= (source_depth + target_depth) as f64 * opts.nesting_factor;
            }
            edges.push(LayoutEdge {
                id: e.id.clone(),
                source,
                target,
                ideal_length,
                elasticity,
            });
        }
        if !dropped_edges.is_empty() {
            tracing::warn!(
                count = dropped_edges.len(),
                edges = ?dropped_edges,
                "dropping edges with a missing endpoint"
            );
        }

        let component_count = assign_components(&mut nodes, &edges);

        let mut info = Self {
            nodes,
            edges,
            graph_set,
            index_to_graph,
            group_owner,
            id_to_idx,
            bounding_box,
            component_count,
            dropped_edges,
        };
        info.refresh_compound_bounds();

        tracing::debug!(
            nodes = info.nodes.len(),
            edges = info.edges.len(),
            groups = info.graph_set.len(),
            components = info.component_count,
            "built layout info"
        );
        info
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.id_to_idx.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn has_compounds(&self) -> bool {
        self.graph_set.len() > 1
    }

    /// Places unlocked leaf nodes uniformly inside the bounding box.
    pub(crate) fn randomize_positions(&mut self, rng: &mut XorShift64Star) {
        let bb = self.bounding_box;
        for n in &mut self.nodes {
            if n.is_compound() || n.is_locked {
                continue;
            }
            n.position_x = bb.x1 + rng.next_f64_unit() * bb.w;
            n.position_y = bb.y1 + rng.next_f64_unit() * bb.h;
            n.refresh_bounds_from_position();
        }
        self.refresh_compound_bounds();
    }
}

fn sanitize_padding(p: Padding) -> Padding {
    let side = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
    Padding {
        left: side(p.left),
        right: side(p.right),
        top: side(p.top),
        bottom: side(p.bottom),
    }
}

/// Promotes nodes that cannot be reached from a root-level node (parent cycles) to root level.
fn break_parent_cycles(nodes: &mut [LayoutNode]) {
    let mut reached = vec![false; nodes.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for (idx, n) in nodes.iter().enumerate() {
        if n.parent.is_none() {
            reached[idx] = true;
            queue.push_back(idx);
        }
    }
    loop {
        while let Some(idx) = queue.pop_front() {
            for &child in &nodes[idx].children {
                if !reached[child] {
                    reached[child] = true;
                    queue.push_back(child);
                }
            }
        }
        let Some(orphan) = reached.iter().position(|r| !r) else {
            break;
        };
        if let Some(p) = nodes[orphan].parent.take() {
            nodes[p].children.retain(|&c| c != orphan);
        }
        tracing::warn!(node_id = %nodes[orphan].id, "parent chain forms a cycle; moving node to root level");
        reached[orphan] = true;
        queue.push_back(orphan);
    }
}

fn build_graph_set(nodes: &[LayoutNode]) -> (Vec<Vec<usize>>, Vec<Option<usize>>) {
    let root: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.parent.is_none())
        .map(|(idx, _)| idx)
        .collect();
    let mut queue: VecDeque<usize> = root.iter().copied().collect();
    let mut graph_set = vec![root];
    let mut group_owner = vec![None];
    while let Some(idx) = queue.pop_front() {
        let children = &nodes[idx].children;
        if children.is_empty() {
            continue;
        }
        graph_set.push(children.clone());
        group_owner.push(Some(idx));
        queue.extend(children.iter().copied());
    }
    (graph_set, group_owner)
}

/// Groups visited from `node` up to the root group (always ends with group 0).
fn group_chain(nodes: &[LayoutNode], index_to_graph: &[usize], node: usize) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut cur = node;
    loop {
        chain.push(index_to_graph[cur]);
        match nodes[cur].parent {
            Some(p) => cur = p,
            None => break,
        }
    }
    chain
}

/// Lowest group containing both endpoints (after walking up through parents), plus the number of
/// parent hops each endpoint needs to reach it.
pub(crate) fn lowest_common_group(
    nodes: &[LayoutNode],
    index_to_graph: &[usize],
    source: usize,
    target: usize,
) -> (usize, usize, usize) {
    let source_chain = group_chain(nodes, index_to_graph, source);
    let target_chain = group_chain(nodes, index_to_graph, target);
    for (source_depth, g) in source_chain.iter().enumerate() {
        if let Some(target_depth) = target_chain.iter().position(|t| t == g) {
            return (*g, source_depth, target_depth);
        }
    }
    (
        0,
        source_chain.len().saturating_sub(1),
        target_chain.len().saturating_sub(1),
    )
}

/// Union-find over edges and parent links; returns the number of components.
fn assign_components(nodes: &mut [LayoutNode], edges: &[LayoutEdge]) -> usize {
    let mut parent: Vec<usize> = (0..nodes.len()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    let mut union = |a: usize, b: usize| {
        let ra = find(&mut parent, a);
        let rb = find(&mut parent, b);
        if ra != rb {
            parent[ra.max(rb)] = ra.min(rb);
        }
    };
    for e in edges {
        union(e.source, e.target);
    }
    for idx in 0..nodes.len() {
        if let Some(p) = nodes[idx].parent {
            union(idx, p);
        }
    }

    let mut dense: FxHashMap<usize, usize> = FxHashMap::default();
    for idx in 0..nodes.len() {
        let root = find(&mut parent, idx);
        let next = dense.len();
        let id = *dense.entry(root).or_insert(next);
        nodes[idx].component_id = id;
    }
    dense.len()
}

#[cfg(test)]
mod tests {
    use super::LayoutInfo;
    use crate::algo::CoseOptions;
    use crate::graph::{Edge, Graph, Node};

    fn nested() -> Graph {
        Graph {
            nodes: vec![
                Node::new("g", 10.0, 10.0),
                Node::new("p", 10.0, 10.0).with_parent("g"),
                Node::new("c", 10.0, 10.0).with_parent("p"),
                Node::new("d", 10.0, 10.0).with_parent("p"),
                Node::new("r", 10.0, 10.0),
            ],
            edges: vec![Edge::new("c-r", "c", "r"), Edge::new("c-d", "c", "d")],
        }
    }

    #[test]
    fn graph_set_mirrors_nesting() {
        let info = LayoutInfo::build(&nested(), &CoseOptions::default());
        let ids = |g: &[usize]| g.iter().map(|&i| info.nodes[i].id.as_str()).collect::<Vec<_>>();
        assert_eq!(info.graph_set.len(), 3);
        assert_eq!(ids(&info.graph_set[0]), vec!["g", "r"]);
        assert_eq!(ids(&info.graph_set[1]), vec!["p"]);
        assert_eq!(ids(&info.graph_set[2]), vec!["c", "d"]);
        assert_eq!(info.group_owner, vec![None, Some(0), Some(1)]);
        assert_eq!(info.index_to_graph, vec![0, 1, 2, 2, 0]);
    }

    #[test]
    fn cross_group_edges_scale_ideal_length_by_depth() {
        let opts = CoseOptions::default();
        let info = LayoutInfo::build(&nested(), &opts);
        // c -> p -> g reaches group 0 in two hops, r is already there.
        let cross = &info.edges[0];
        assert!((cross.ideal_length - 32.0 * 2.0 * 1.2).abs() < 1e-9);
        let sibling = &info.edges[1];
        assert!((sibling.ideal_length - 32.0).abs() < 1e-9);
    }

    #[test]
    fn compounds_share_a_component_with_their_children() {
        let info = LayoutInfo::build(&nested(), &CoseOptions::default());
        assert_eq!(info.component_count, 1);

        let g = Graph {
            nodes: vec![Node::new("a", 1.0, 1.0), Node::new("b", 1.0, 1.0)],
            edges: Vec::new(),
        };
        let info = LayoutInfo::build(&g, &CoseOptions::default());
        assert_eq!(info.component_count, 2);
        assert_ne!(info.nodes[0].component_id, info.nodes[1].component_id);
    }

    #[test]
    fn unknown_parents_and_cycles_end_up_at_root_level() {
        let g = Graph {
            nodes: vec![
                Node::new("a", 1.0, 1.0).with_parent("missing"),
                Node::new("b", 1.0, 1.0).with_parent("c"),
                Node::new("c", 1.0, 1.0).with_parent("b"),
                Node::new("d", 1.0, 1.0).with_parent("d"),
            ],
            edges: Vec::new(),
        };
        let info = LayoutInfo::build(&g, &CoseOptions::default());
        let total: usize = info.graph_set.iter().map(Vec::len).sum();
        assert_eq!(total, 4);
        assert!(info.nodes[0].parent.is_none());
        assert!(info.nodes[3].parent.is_none());
        // The cycle is broken at its first node; the other one stays nested.
        assert!(info.nodes[1].parent.is_none());
        assert_eq!(info.nodes[2].parent, Some(1));
    }

    #[test]
    fn edges_with_missing_endpoints_are_dropped() {
        let g = Graph {
            nodes: vec![Node::new("a", 1.0, 1.0)],
            edges: vec![Edge::new("e", "a", "ghost")],
        };
        let info = LayoutInfo::build(&g, &CoseOptions::default());
        assert!(info.edges.is_empty());
        assert_eq!(info.dropped_edges, vec!["e".to_string()]);
    }

    #[test]
    fn duplicate_ids_keep_the_first_node() {
        let g = Graph {
            nodes: vec![
                Node::new("a", 10.0, 10.0).at(1.0, 2.0),
                Node::new("a", 50.0, 50.0).at(9.0, 9.0),
            ],
            edges: Vec::new(),
        };
        let info = LayoutInfo::build(&g, &CoseOptions::default());
        assert_eq!(info.nodes.len(), 1);
        assert_eq!(info.nodes[0].position_x, 1.0);
        assert_eq!(info.nodes[0].width, 10.0);
    }
}
