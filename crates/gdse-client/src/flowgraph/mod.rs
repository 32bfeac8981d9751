//! Sankey input built from flat node/flow/stock records.

use crate::record::RecordId;
use serde::Serialize;

pub mod cache;
pub mod composition;
mod de;
pub mod transform;

pub use cache::FlowGraphCache;
pub use composition::{describe, Composition, Fraction, MaterialLookup};
pub use transform::{
    transform, FlowGraphInput, FlowRecord, NodeRecord, StockRecord, TransformOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowGraphNode {
    pub id: RecordId,
    pub name: String,
    /// Set on synthetic stock nodes so the renderer places them next to their origin.
    #[serde(rename = "alignToSource", skip_serializing_if = "Option::is_none")]
    pub align_to_source: Option<Offset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowGraphLink {
    pub value: f64,
    /// Index into [`FlowGraph::nodes`].
    pub source: usize,
    pub target: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Renderer-ready graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowGraphNode>,
    pub links: Vec<FlowGraphLink>,
}
