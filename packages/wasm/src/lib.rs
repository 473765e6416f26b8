//! ARG Render - WASM Module
//!
//! This module provides the layout engine for rendering Ancestral
//! Recombination Graphs as 3D scenes. It is compiled to WebAssembly and
//! exposes a JavaScript-friendly API via wasm-bindgen; the scene builder on
//! the JS side turns the resulting positions into geometry.
//!
//! # Architecture
//!
//! - `graph`: Node/edge records and the render model with its lazy rebuild
//! - `layout`: Layered leaves-up placement and render scaling
//! - `import`: Construction of a model from an external ARG
//! - `error`: Error type shared by all of the above

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod import;
pub mod layout;

use graph::{NodeId, RenderModel};
use import::{ArgDocument, import_arg};
use layout::{LayoutConfig, RenderScale, ScaleConfig};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Deserialize an optional JS config object, falling back to defaults.
fn config_from_js<T: serde::de::DeserializeOwned + Default>(value: JsValue) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_wasm_bindgen::from_value(value)?)
}

/// Main entry point for the layout engine.
///
/// This struct wraps the internal RenderModel and provides the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct ArgRenderWasm {
    model: RenderModel,
}

#[wasm_bindgen]
impl ArgRenderWasm {
    /// Create a new empty model with default layout settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            model: RenderModel::new(),
        }
    }

    /// Create an empty model from a layout config object such as
    /// `{ quantize: "all" }`.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<ArgRenderWasm, JsError> {
        Ok(Self {
            model: RenderModel::with_config(config_from_js::<LayoutConfig>(config)?),
        })
    }

    /// Import a whole ARG document and lay it out with validation.
    ///
    /// # Arguments
    ///
    /// * `document` - `{ nodes: [{ id, height, start, end, parents: [{ parent, start, end }] }] }`
    /// * `config` - Optional layout config object
    #[wasm_bindgen(js_name = fromArg)]
    pub fn from_arg(document: JsValue, config: JsValue) -> Result<ArgRenderWasm, JsError> {
        let document: ArgDocument = serde_wasm_bindgen::from_value(document)?;
        let model = import_arg(&document, config_from_js(config)?)?;
        Ok(Self { model })
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Add a node with no position hint.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, id: u32, height: f64, start: f64, end: f64) -> Result<(), JsError> {
        self.model.add_node(NodeId(id), height, start, end)?;
        Ok(())
    }

    /// Add a node with an initial x position (sample order).
    #[wasm_bindgen(js_name = addPositionedNode)]
    pub fn add_positioned_node(
        &mut self,
        id: u32,
        height: f64,
        start: f64,
        end: f64,
        x_pos: f64,
    ) -> Result<(), JsError> {
        self.model.add_positioned_node(NodeId(id), height, start, end, x_pos)?;
        Ok(())
    }

    /// Add a parent→child edge over `[start, end)`.
    ///
    /// Either endpoint may be added later.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(
        &mut self,
        parent: u32,
        child: u32,
        start: f64,
        end: f64,
    ) -> Result<(), JsError> {
        self.model.add_edge(NodeId(parent), NodeId(child), start, end)?;
        Ok(())
    }

    /// Remove all nodes and edges.
    pub fn clear(&mut self) {
        self.model.clear();
    }

    /// Recompute classification and layout.
    ///
    /// Pass `validate = false` while the graph is still being threaded.
    pub fn rebuild(&mut self, validate: bool) -> Result<(), JsError> {
        self.model.rebuild(validate)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = isDirty)]
    pub fn is_dirty(&self) -> bool {
        self.model.is_dirty()
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.model.node_count()
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> usize {
        self.model.edge_count()
    }

    // =========================================================================
    // Classification Queries
    // =========================================================================

    #[wasm_bindgen(js_name = isLeaf)]
    pub fn is_leaf(&self, id: u32) -> Result<bool, JsError> {
        Ok(self.model.node_is_leaf(NodeId(id))?)
    }

    #[wasm_bindgen(js_name = isRoot)]
    pub fn is_root(&self, id: u32) -> Result<bool, JsError> {
        Ok(self.model.node_is_root(NodeId(id))?)
    }

    #[wasm_bindgen(js_name = isInterior)]
    pub fn is_interior(&self, id: u32) -> Result<bool, JsError> {
        Ok(self.model.node_is_interior(NodeId(id))?)
    }

    /// Leaf ids in insertion order.
    #[wasm_bindgen(js_name = leafIds)]
    pub fn leaf_ids(&self) -> Result<Vec<u32>, JsError> {
        Ok(self.model.leaf_nodes()?.map(|n| n.id.0).collect())
    }

    /// Root ids in insertion order.
    #[wasm_bindgen(js_name = rootIds)]
    pub fn root_ids(&self) -> Result<Vec<u32>, JsError> {
        Ok(self.model.root_nodes()?.map(|n| n.id.0).collect())
    }

    /// Interior ids in insertion order.
    #[wasm_bindgen(js_name = interiorIds)]
    pub fn interior_ids(&self) -> Result<Vec<u32>, JsError> {
        Ok(self.model.interior_nodes()?.map(|n| n.id.0).collect())
    }

    /// Ids whose positions were averaged into `parent`'s.
    #[wasm_bindgen(js_name = layoutChildren)]
    pub fn layout_children(&self, parent: u32) -> Result<Vec<u32>, JsError> {
        Ok(self
            .model
            .layout_children(NodeId(parent))?
            .iter()
            .map(|id| id.0)
            .collect())
    }

    /// Sorted distinct edge start/end positions.
    pub fn breakpoints(&self) -> Result<Vec<f64>, JsError> {
        Ok(self.model.breakpoint_positions()?.collect())
    }

    #[wasm_bindgen(js_name = maxDepth)]
    pub fn max_depth(&self) -> Result<u32, JsError> {
        Ok(self.model.max_depth()?)
    }

    // =========================================================================
    // Layout Export
    // =========================================================================

    /// Raw layout as [x0, depth0, x1, depth1, ...] in node insertion order.
    ///
    /// Unplaced values are NaN.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Float64Array {
        let mut positions = Vec::with_capacity(self.model.node_count() * 2);
        for node in self.model.nodes() {
            positions.push(node.x_pos.unwrap_or(f64::NAN));
            positions.push(node.depth.map_or(f64::NAN, f64::from));
        }
        Float64Array::from(&positions[..])
    }

    /// Full snapshot: nodes, edges, classification, breakpoints.
    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.model.snapshot()?)?)
    }

    /// Scale factors for the current layout, rebuilding first if needed.
    ///
    /// # Arguments
    ///
    /// * `config` - Optional `{ globalScale, lengthStretch }` object
    #[wasm_bindgen(js_name = renderScale)]
    pub fn render_scale(&mut self, config: JsValue) -> Result<JsValue, JsError> {
        let scale = self.model.render_scale(&config_from_js::<ScaleConfig>(config)?)?;
        Ok(serde_wasm_bindgen::to_value(&scale)?)
    }

    /// Render-space node lines as [x0, h0, start0, end0, x1, ...] in node
    /// insertion order, rebuilding first if needed.
    #[wasm_bindgen(js_name = getScaledNodes)]
    pub fn get_scaled_nodes(&mut self, global_scale: f64) -> Result<Float64Array, JsError> {
        let config = ScaleConfig {
            global_scale,
            ..Default::default()
        };
        let scale = self.model.render_scale(&config)?;
        Ok(Float64Array::from(&scaled_node_lines(&self.model, &scale)[..]))
    }
}

impl Default for ArgRenderWasm {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten every node into its scaled `(x, height, start, end)` line.
fn scaled_node_lines(model: &RenderModel, scale: &RenderScale) -> Vec<f64> {
    let mut lines = Vec::with_capacity(model.node_count() * 4);
    for node in model.nodes() {
        let (x, h) = scale.node_position(node).unwrap_or((f64::NAN, f64::NAN));
        lines.push(x);
        lines.push(h);
        lines.push(scale.scale_length(node.span_start));
        lines.push(scale.scale_length(node.span_end));
    }
    lines
}
