//! Graph data structures and operations.
//!
//! This module holds the render model for an ARG: node and edge memo records
//! keyed by explicit identity types, and the model that owns them together
//! with their lazily rebuilt lookup maps, classification, and layout.

mod edge;
mod model;
mod node;

pub use edge::{EdgeKey, EdgeRecord};
pub use model::{LayoutSnapshot, NodeRole, RenderModel};
pub use node::{NodeId, NodeRecord};
