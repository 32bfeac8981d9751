use super::transform::{transform, FlowGraphInput, TransformOptions};
use super::FlowGraph;

/// Last rendered graph, reused when only the viewport changes.
#[derive(Debug, Default)]
pub struct FlowGraphCache {
    graph: Option<FlowGraph>,
}

impl FlowGraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from scratch and remember the result.
    pub fn render(&mut self, input: &FlowGraphInput, options: &TransformOptions) -> &FlowGraph {
        self.graph.insert(transform(input, options))
    }

    /// The graph of the last `render`, without recomputation.
    pub fn resize(&self) -> Option<&FlowGraph> {
        self.graph.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.graph = None;
    }
}
