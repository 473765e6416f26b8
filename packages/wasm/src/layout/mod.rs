//! Layout algorithms for ARG rendering.
//!
//! This module computes where each node sits before the scene builder turns
//! it into geometry: a layered leaves-up placement giving every node a depth
//! and a horizontal position, and the scale factors that fit those positions
//! into the render volume.

pub mod layered;
pub mod scale;

#[cfg(test)]
mod proptests;

pub use layered::{Layering, LayoutConfig, QuantizeMode};
pub use scale::{RenderScale, ScaleConfig};
