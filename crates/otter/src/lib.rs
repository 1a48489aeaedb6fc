#![forbid(unsafe_code)]

//! Headless CoSE (compound spring embedder) graph layout.
//!
//! `otter` positions the nodes of a possibly nested graph with a force-directed simulation and
//! hands the positions back; drawing and viewport fitting are left to the caller.

pub mod algo;
pub mod error;
pub mod graph;

pub use algo::cose::{
    FrameStatus, LayoutEvent, LayoutInfo, LayoutRun, RunState, SimulationState, StopHandle,
    StopReason,
};
pub use algo::{Animate, CoseOptions};
pub use error::{Error, Result};
pub use graph::{BoundingBox, Edge, Graph, LayoutResult, Node, NodeLayout, Padding, Point};

/// Headless layout entry point: runs the simulation to its end and returns the final positions.
pub fn layout(graph: &Graph, opts: &CoseOptions) -> Result<LayoutResult> {
    algo::cose::layout(graph, opts)
}
