//! CoSE (compound spring embedder) layout, after Cytoscape's `cose`.
//!
//! A run builds a [`LayoutInfo`] from the input graph, then repeatedly applies sibling
//! repulsion, edge springs, gravity and parent-to-child force propagation while a global
//! temperature cools down. Compound bounds are rebuilt after every position update, and
//! disconnected components are packed into rows once the loop ends.

mod bounds;
mod components;
mod driver;
mod forces;
mod info;
mod rng;
mod simulation;

pub use driver::{FrameStatus, LayoutEvent, LayoutRun, RunState, StopHandle, StopReason};
pub use info::{Bounds, LayoutEdge, LayoutInfo, LayoutNode};
pub use simulation::SimulationState;

use crate::algo::CoseOptions;
use crate::error::Result;
use crate::graph::{Graph, LayoutResult};

pub fn layout(graph: &Graph, opts: &CoseOptions) -> Result<LayoutResult> {
    let mut run = LayoutRun::new(graph, opts.clone())?;
    run.run_to_end();
    Ok(run.into_result())
}
