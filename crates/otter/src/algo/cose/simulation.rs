use super::info::LayoutInfo;
use super::rng::XorShift64Star;
use crate::algo::CoseOptions;

/// Mutable scratchpad of one layout run, threaded through every iteration.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub temperature: f64,
    pub iteration: usize,
    /// Sum of node displacements during the last iteration.
    pub last_displacement: f64,
    rng: XorShift64Star,
}

impl SimulationState {
    pub fn new(opts: &CoseOptions) -> Self {
        Self {
            temperature: opts.initial_temp,
            iteration: 0,
            last_displacement: 0.0,
            rng: XorShift64Star::new(opts.random_seed),
        }
    }

    pub(crate) fn rng_mut(&mut self) -> &mut XorShift64Star {
        &mut self.rng
    }

    pub fn is_cold(&self, opts: &CoseOptions) -> bool {
        self.temperature < opts.min_temp
    }

    pub fn budget_exhausted(&self, opts: &CoseOptions) -> bool {
        self.iteration >= opts.num_iter
    }

    pub fn is_finished(&self, opts: &CoseOptions) -> bool {
        self.is_cold(opts) || self.budget_exhausted(opts)
    }

    /// Runs one iteration. Returns whether another one should follow.
    pub fn step(&mut self, info: &mut LayoutInfo, opts: &CoseOptions) -> bool {
        if self.is_finished(opts) {
            return false;
        }

        info.apply_repulsion(opts, &mut self.rng);
        info.apply_edge_forces();
        info.apply_gravity(opts);
        info.propagate_forces();
        self.last_displacement = info.update_positions(self.temperature);

        self.temperature *= opts.cooling_factor;
        self.iteration += 1;
        !self.is_finished(opts)
    }
}
