use crate::error::{Error, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Strict check used by callers that want malformed edges to be an error instead of being
    /// dropped silently by [`crate::layout`].
    pub fn validate(&self) -> Result<()> {
        let ids: FxHashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        match self
            .edges
            .iter()
            .find(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
        {
            Some(e) => Err(Error::MissingEndpoint {
                edge_id: e.id.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// Compound parent. Unknown ids are treated as root-level.
    pub parent: Option<String>,
    pub locked: bool,
    pub width: f64,
    pub height: f64,
    /// Current position (center).
    pub x: f64,
    pub y: f64,
    /// Only used when the node is a compound.
    pub padding: Padding,
    /// Overrides `CoseOptions::node_repulsion` for this node.
    pub repulsion: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            ..Default::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Overrides `CoseOptions::ideal_edge_length` (before nesting scaling).
    pub ideal_length: Option<f64>,
    /// Overrides `CoseOptions::edge_elasticity`.
    pub elasticity: Option<f64>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Padding {
    pub fn uniform(p: f64) -> Self {
        Self {
            left: p,
            right: p,
            top: p,
            bottom: p,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Layout area, top-left anchored (Cytoscape `{ x1, y1, w, h }`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn from_viewport(width: f64, height: f64) -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            w: width,
            h: height,
        }
    }

    pub fn x2(&self) -> f64 {
        self.x1 + self.w
    }

    pub fn y2(&self) -> f64 {
        self.y1 + self.h
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x1 + self.w / 2.0,
            y: self.y1 + self.h / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub compound: bool,
    pub locked: bool,
}

impl NodeLayout {
    pub fn min_x(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn min_y(&self) -> f64 {
        self.y - self.height / 2.0
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub nodes: BTreeMap<String, NodeLayout>,
    /// Ids of edges excluded because an endpoint is missing.
    pub dropped_edges: Vec<String>,
    pub iterations: usize,
    /// Viewport fit padding requested from the host (`None` when `fit` is off).
    pub fit: Option<f64>,
    /// Set for `Animate::End`: the host is expected to animate towards these positions.
    pub animate_to_end: bool,
}

impl LayoutResult {
    pub fn position(&self, id: &str) -> Option<Point> {
        self.nodes.get(id).map(|n| Point { x: n.x, y: n.y })
    }

    /// Union of all reported node boxes, top-left anchored.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for n in self.nodes.values() {
            min_x = min_x.min(n.min_x());
            min_y = min_y.min(n.min_y());
            max_x = max_x.max(n.max_x());
            max_y = max_y.max(n.max_y());
        }
        Some(BoundingBox {
            x1: min_x,
            y1: min_y,
            w: max_x - min_x,
            h: max_y - min_y,
        })
    }
}
