//! Drives a layout run either in one go or in per-frame batches, and reports lifecycle events.

use super::info::LayoutInfo;
use super::simulation::SimulationState;
use crate::algo::{Animate, CoseOptions};
use crate::error::Result;
use crate::graph::{Graph, LayoutResult, NodeLayout};
use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    /// Cooled down or ran out of iterations.
    Converged,
    /// Ended early by [`LayoutRun::stop`].
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Converged,
    IterationBudget,
    Requested,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    Start,
    /// Positions were written back (intermediate or final).
    PositionsRefreshed(LayoutResult),
    /// Fires once, right after the first write-back.
    Ready,
    /// Fires once, after the loop has terminated.
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Done,
}

/// Cooperative cancellation flag, checked before every iteration.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
pub struct LayoutRun {
    info: LayoutInfo,
    sim: SimulationState,
    opts: CoseOptions,
    state: RunState,
    stop: StopHandle,
    events: VecDeque<LayoutEvent>,
    ready: bool,
    started_at: Option<Instant>,
    result: LayoutResult,
}

impl LayoutRun {
    pub fn new(graph: &Graph, opts: CoseOptions) -> Result<Self> {
        opts.validate()?;
        let mut info = LayoutInfo::build(graph, &opts);
        let mut sim = SimulationState::new(&opts);
        if opts.randomize {
            info.randomize_positions(sim.rng_mut());
        }
        Ok(Self {
            info,
            sim,
            opts,
            state: RunState::NotStarted,
            stop: StopHandle::default(),
            events: VecDeque::new(),
            ready: false,
            started_at: None,
            result: LayoutResult::default(),
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn info(&self) -> &LayoutInfo {
        &self.info
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.sim
    }

    pub fn options(&self) -> &CoseOptions {
        &self.opts
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests the loop to end at the next iteration boundary.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Starts the run. Synchronous modes finish before returning; `Animate::During` only starts
    /// and expects [`LayoutRun::frame`] calls. Calling it again has no effect.
    pub fn run(&mut self) -> RunState {
        if self.state != RunState::NotStarted {
            return self.state;
        }
        self.state = RunState::Running;
        self.started_at = Some(Instant::now());
        self.events.push_back(LayoutEvent::Start);
        tracing::debug!(
            nodes = self.info.nodes.len(),
            edges = self.info.edges.len(),
            animate = ?self.opts.animate,
            "cose layout started"
        );

        if self.opts.animate != Animate::During {
            let _span = tracing::debug_span!("cose.simulate").entered();
            while self.advance() {}
            self.finish();
        }
        self.state
    }

    /// Runs one batch of `refresh` iterations. Intermediate positions are written back once the
    /// animation threshold has elapsed.
    pub fn frame(&mut self) -> FrameStatus {
        match self.state {
            RunState::NotStarted => {
                if self.run() != RunState::Running {
                    return FrameStatus::Done;
                }
            }
            RunState::Running => {}
            RunState::Converged | RunState::Stopped => return FrameStatus::Done,
        }

        let mut more = true;
        let mut batch = 0;
        while more && batch < self.opts.refresh {
            more = self.advance();
            batch += 1;
        }
        tracing::trace!(
            iteration = self.sim.iteration,
            temperature = self.sim.temperature,
            displacement = self.sim.last_displacement,
            "cose frame"
        );

        if !more {
            self.finish();
            return FrameStatus::Done;
        }
        let elapsed = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        if elapsed >= self.opts.animation_threshold() {
            self.write_back();
        }
        FrameStatus::Continue
    }

    /// Drives the run to its end regardless of the animation mode.
    pub fn run_to_end(&mut self) -> RunState {
        self.run();
        while self.frame() == FrameStatus::Continue {}
        self.state
    }

    pub fn poll_event(&mut self) -> Option<LayoutEvent> {
        self.events.pop_front()
    }

    pub fn drain_events(&mut self) -> Vec<LayoutEvent> {
        self.events.drain(..).collect()
    }

    /// Positions of the latest write-back (empty before the first one).
    pub fn result(&self) -> &LayoutResult {
        &self.result
    }

    pub fn into_result(self) -> LayoutResult {
        self.result
    }

    fn advance(&mut self) -> bool {
        if self.stop.is_stopped() || self.info.nodes.is_empty() {
            return false;
        }
        self.sim.step(&mut self.info, &self.opts)
    }

    fn finish(&mut self) {
        self.info.separate_components(self.opts.component_spacing);
        self.write_back();

        let reason = if self.stop.is_stopped() {
            StopReason::Requested
        } else if self.sim.budget_exhausted(&self.opts) {
            StopReason::IterationBudget
        } else {
            StopReason::Converged
        };
        self.state = match reason {
            StopReason::Requested => RunState::Stopped,
            StopReason::Converged | StopReason::IterationBudget => RunState::Converged,
        };
        tracing::debug!(
            iterations = self.sim.iteration,
            temperature = self.sim.temperature,
            ?reason,
            "cose layout stopped"
        );
        self.events.push_back(LayoutEvent::Stop(reason));
    }

    fn write_back(&mut self) {
        let mut nodes: BTreeMap<String, NodeLayout> = BTreeMap::new();
        for n in &self.info.nodes {
            nodes.insert(
                n.id.clone(),
                NodeLayout {
                    x: n.position_x,
                    y: n.position_y,
                    width: n.width,
                    height: n.height,
                    compound: n.is_compound(),
                    locked: n.is_locked,
                },
            );
        }
        self.result = LayoutResult {
            nodes,
            dropped_edges: self.info.dropped_edges.clone(),
            iterations: self.sim.iteration,
            fit: self.opts.fit.then_some(self.opts.padding),
            animate_to_end: self.opts.animate == Animate::End,
        };
        self.events
            .push_back(LayoutEvent::PositionsRefreshed(self.result.clone()));
        if !self.ready {
            self.ready = true;
            self.events.push_back(LayoutEvent::Ready);
        }
    }
}
