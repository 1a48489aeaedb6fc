pub mod cose;

use crate::error::{Error, Result};
use crate::graph::BoundingBox;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the driver reports positions back to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AnimateRepr", into = "AnimateRepr")]
pub enum Animate {
    /// Run every iteration in one go and report once.
    #[default]
    Off,
    /// Run in batches of `refresh` iterations, reporting between batches.
    During,
    /// Run synchronously; the host animates from the old positions to the final ones.
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AnimateRepr {
    Flag(bool),
    Mode(String),
}

impl TryFrom<AnimateRepr> for Animate {
    type Error = String;

    fn try_from(value: AnimateRepr) -> std::result::Result<Self, Self::Error> {
        match value {
            AnimateRepr::Flag(false) => Ok(Self::Off),
            AnimateRepr::Flag(true) => Ok(Self::During),
            AnimateRepr::Mode(m) if m == "end" => Ok(Self::End),
            AnimateRepr::Mode(m) => Err(format!("unknown animate mode `{m}`")),
        }
    }
}

impl From<Animate> for AnimateRepr {
    fn from(value: Animate) -> Self {
        match value {
            Animate::Off => Self::Flag(false),
            Animate::During => Self::Flag(true),
            Animate::End => Self::Mode("end".to_string()),
        }
    }
}

/// Options of the CoSE layout. Names and defaults follow Cytoscape's `cose` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoseOptions {
    pub node_repulsion: f64,
    pub node_overlap: f64,
    pub ideal_edge_length: f64,
    pub edge_elasticity: f64,
    /// Multiplier applied to the ideal length of edges crossing compound boundaries.
    pub nesting_factor: f64,
    pub gravity: f64,
    pub num_iter: usize,
    pub initial_temp: f64,
    pub cooling_factor: f64,
    pub min_temp: f64,
    pub component_spacing: f64,
    pub randomize: bool,
    pub animate: Animate,
    /// Iterations per animation frame.
    pub refresh: usize,
    #[serde(rename = "animationThreshold")]
    pub animation_threshold_ms: u64,
    pub fit: bool,
    pub padding: f64,
    pub bounding_box: Option<BoundingBox>,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Seed for deterministic randomness (Cytoscape relies on `Math.random`).
    pub random_seed: u64,
    /// Use the transposed root gravity center `(h / 2, w / 2)` of the Cytoscape implementation
    /// instead of the bounding-box center.
    pub legacy_root_gravity_center: bool,
}

impl Default for CoseOptions {
    fn default() -> Self {
        Self {
            node_repulsion: 2048.0,
            node_overlap: 4.0,
            ideal_edge_length: 32.0,
            edge_elasticity: 32.0,
            nesting_factor: 1.2,
            gravity: 1.0,
            num_iter: 1000,
            initial_temp: 1000.0,
            cooling_factor: 0.99,
            min_temp: 1.0,
            component_spacing: 40.0,
            randomize: false,
            animate: Animate::Off,
            refresh: 20,
            animation_threshold_ms: 250,
            fit: true,
            padding: 30.0,
            bounding_box: None,
            viewport_width: 800.0,
            viewport_height: 600.0,
            random_seed: 0,
            legacy_root_gravity_center: false,
        }
    }
}

impl CoseOptions {
    pub fn animation_threshold(&self) -> Duration {
        Duration::from_millis(self.animation_threshold_ms)
    }

    /// The explicit bounding box, or one derived from the viewport size.
    pub fn effective_bounding_box(&self) -> BoundingBox {
        self.bounding_box
            .unwrap_or_else(|| BoundingBox::from_viewport(self.viewport_width, self.viewport_height))
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("nodeRepulsion", self.node_repulsion)?;
        non_negative("nodeOverlap", self.node_overlap)?;
        non_negative("idealEdgeLength", self.ideal_edge_length)?;
        positive("edgeElasticity", self.edge_elasticity)?;
        non_negative("nestingFactor", self.nesting_factor)?;
        non_negative("gravity", self.gravity)?;
        non_negative("initialTemp", self.initial_temp)?;
        non_negative("minTemp", self.min_temp)?;
        non_negative("componentSpacing", self.component_spacing)?;
        non_negative("padding", self.padding)?;
        if !(self.cooling_factor.is_finite() && self.cooling_factor > 0.0 && self.cooling_factor <= 1.0)
        {
            return Err(Error::InvalidOption {
                name: "coolingFactor",
                reason: format!("expected a value in (0, 1], got {}", self.cooling_factor),
            });
        }
        if self.refresh == 0 {
            return Err(Error::InvalidOption {
                name: "refresh",
                reason: "must be at least 1".to_string(),
            });
        }
        let bb = self.effective_bounding_box();
        for (name, v) in [("boundingBox.x1", bb.x1), ("boundingBox.y1", bb.y1)] {
            if !v.is_finite() {
                return Err(Error::InvalidOption {
                    name,
                    reason: format!("expected a finite value, got {v}"),
                });
            }
        }
        positive("boundingBox.w", bb.w)?;
        positive("boundingBox.h", bb.h)?;
        Ok(())
    }
}

fn non_negative(name: &'static str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        return Ok(());
    }
    Err(Error::InvalidOption {
        name,
        reason: format!("expected a finite, non-negative value, got {v}"),
    })
}

fn positive(name: &'static str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        return Ok(());
    }
    Err(Error::InvalidOption {
        name,
        reason: format!("expected a finite, positive value, got {v}"),
    })
}
