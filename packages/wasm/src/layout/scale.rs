//! Linear scale factors mapping layout coordinates into a bounded render volume.
//!
//! The scene builder draws each node as a line along the genome (length)
//! axis at `(x, height)`. `RenderScale` squeezes the layout into roughly a
//! `global_scale`-sized cube, stretching the length axis so long spans stay
//! readable. The `+ 1` in every denominator keeps trivial graphs (a single
//! node, zero heights) finite.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{NodeRecord, RenderModel};

/// Configuration for render scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScaleConfig {
    /// Target size of the rendered volume along x and height.
    pub global_scale: f64,
    /// Extra multiplier for the length (genome) axis.
    pub length_stretch: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            global_scale: 10.0,
            length_stretch: 3.0,
        }
    }
}

/// Scale factors derived from a laid-out model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderScale {
    pub max_height: f64,
    pub max_length: f64,
    pub max_width: f64,
    pub x_scale: f64,
    pub height_scale: f64,
    pub length_scale: f64,
}

impl RenderScale {
    /// Derive scale factors from a rebuilt model.
    ///
    /// Fails with `StaleLayout` if the model was mutated since its last
    /// rebuild, since leaf positions would be out of date.
    pub fn new(model: &RenderModel, config: &ScaleConfig) -> Result<Self> {
        let max_width = model
            .leaf_nodes()?
            .filter_map(|node| node.x_pos)
            .fold(0.0, f64::max);

        let (max_height, max_length) = model
            .nodes()
            .iter()
            .fold((0.0, 0.0), |(h, l): (f64, f64), node| {
                (h.max(node.height), l.max(node.span_end))
            });

        Ok(Self::from_extents(max_width, max_height, max_length, config))
    }

    /// Build from raw extents.
    pub fn from_extents(
        max_width: f64,
        max_height: f64,
        max_length: f64,
        config: &ScaleConfig,
    ) -> Self {
        Self {
            max_height,
            max_length,
            max_width,
            x_scale: config.global_scale / (max_width + 1.0),
            height_scale: config.global_scale / (max_height + 1.0),
            length_scale: config.global_scale * config.length_stretch / (max_length + 1.0),
        }
    }

    /// Horizontal position, centred on zero.
    #[inline]
    pub fn scale_x(&self, x: f64) -> f64 {
        (x - self.max_width / 2.0) * self.x_scale
    }

    #[inline]
    pub fn scale_height(&self, height: f64) -> f64 {
        height * self.height_scale
    }

    #[inline]
    pub fn scale_length(&self, length: f64) -> f64 {
        length * self.length_scale
    }

    pub fn scale_xh(&self, x: f64, height: f64) -> (f64, f64) {
        (self.scale_x(x), self.scale_height(height))
    }

    pub fn scale_xhl(&self, x: f64, height: f64, length: f64) -> (f64, f64, f64) {
        (self.scale_x(x), self.scale_height(height), self.scale_length(length))
    }

    /// Render-space `(x, height)` for a node, or `None` if it has no position.
    pub fn node_position(&self, node: &NodeRecord) -> Option<(f64, f64)> {
        node.x_pos.map(|x| self.scale_xh(x, node.height))
    }
}
