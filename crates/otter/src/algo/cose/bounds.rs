//! Compound boundary tracking: compound bounds always enclose their descendants plus padding.

use super::info::{Bounds, LayoutInfo};

impl LayoutInfo {
    /// Marks every compound's bounds as unknown ahead of a bottom-up rebuild.
    pub(crate) fn reset_compound_bounds(&mut self) {
        for n in &mut self.nodes {
            if n.is_compound() {
                n.bounds = None;
            }
        }
    }

    /// Grows the ancestors of `idx` so they contain its bounds. Stops at the first ancestor that
    /// already did.
    pub(crate) fn update_ancestry_boundaries(&mut self, idx: usize) {
        let mut child = idx;
        while let Some(p) = self.nodes[child].parent {
            let cb = self.nodes[child].rect();
            let pad = self.nodes[p].padding;
            let wanted = Bounds {
                min_x: cb.min_x - pad.left,
                max_x: cb.max_x + pad.right,
                min_y: cb.min_y - pad.top,
                max_y: cb.max_y + pad.bottom,
            };

            let parent = &mut self.nodes[p];
            let changed = match parent.bounds.as_mut() {
                None => {
                    parent.bounds = Some(wanted);
                    true
                }
                Some(b) => {
                    let mut changed = false;
                    if wanted.max_x > b.max_x {
                        b.max_x = wanted.max_x;
                        changed = true;
                    }
                    if wanted.min_x < b.min_x {
                        b.min_x = wanted.min_x;
                        changed = true;
                    }
                    if wanted.max_y > b.max_y {
                        b.max_y = wanted.max_y;
                        changed = true;
                    }
                    if wanted.min_y < b.min_y {
                        b.min_y = wanted.min_y;
                        changed = true;
                    }
                    changed
                }
            };
            if !changed {
                break;
            }
            child = p;
        }
    }

    /// Derives compound geometry from the rebuilt bounds. A compound's position is never an
    /// input, so locked compounds follow their bounds too.
    pub(crate) fn finish_compound_geometry(&mut self) {
        for n in &mut self.nodes {
            if !n.is_compound() {
                continue;
            }
            let Some(b) = n.bounds else {
                continue;
            };
            n.position_x = (b.min_x + b.max_x) / 2.0;
            n.position_y = (b.min_y + b.max_y) / 2.0;
            n.width = b.width();
            n.height = b.height();
        }
    }

    /// Rebuilds every compound's bounds from the current leaf positions without moving leaves.
    pub fn refresh_compound_bounds(&mut self) {
        if !self.has_compounds() {
            return;
        }
        self.reset_compound_bounds();
        for idx in 0..self.nodes.len() {
            if self.nodes[idx].is_compound() {
                continue;
            }
            self.nodes[idx].refresh_bounds_from_position();
            self.update_ancestry_boundaries(idx);
        }
        self.finish_compound_geometry();
    }

    /// True when every compound contains each child's bounds plus its own padding.
    pub fn compounds_contain_children(&self, eps: f64) -> bool {
        self.nodes.iter().all(|n| {
            let Some(p) = n.parent else {
                return true;
            };
            let parent = &self.nodes[p];
            let cb = n.rect();
            let padded = Bounds {
                min_x: cb.min_x - parent.padding.left,
                max_x: cb.max_x + parent.padding.right,
                min_y: cb.min_y - parent.padding.top,
                max_y: cb.max_y + parent.padding.bottom,
            };
            parent.rect().contains(&padded, eps)
        })
    }
}
