use super::composition::{describe, Composition, MaterialLookup};
use super::{FlowGraph, FlowGraphLink, FlowGraphNode, Offset};
use crate::collection::Collection;
use crate::record::RecordId;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::trace;

pub const STOCK_NODE_NAME: &str = "Stock";
pub const STOCK_OFFSET: Offset = Offset { x: 80, y: 0 };

/// An activity, actor or group taking part in the flows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeRecord {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlowRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub origin: Option<RecordId>,
    #[serde(default)]
    pub destination: Option<RecordId>,
    #[serde(default, deserialize_with = "super::de::amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "super::de::flag")]
    pub waste: bool,
    #[serde(default)]
    pub composition: Option<Composition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockRecord {
    pub id: RecordId,
    #[serde(default)]
    pub origin: Option<RecordId>,
    #[serde(default, deserialize_with = "super::de::amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "super::de::flag")]
    pub waste: bool,
    #[serde(default)]
    pub composition: Option<Composition>,
}

/// The three relational record sets plus the material names used in link texts.
#[derive(Debug, Clone, Default)]
pub struct FlowGraphInput {
    pub nodes: Vec<NodeRecord>,
    pub flows: Vec<FlowRecord>,
    pub stocks: Vec<StockRecord>,
    pub materials: MaterialLookup,
}

impl FlowGraphInput {
    /// Decode typed records out of fetched collections.
    ///
    /// Records that do not decode are left out, like links whose endpoints
    /// do not resolve.
    pub fn from_collections(
        nodes: &Collection,
        flows: &Collection,
        stocks: &Collection,
        materials: Option<&Collection>,
    ) -> Self {
        Self {
            nodes: decode_all(nodes),
            flows: decode_all(flows),
            stocks: decode_all(stocks),
            materials: materials
                .map(MaterialLookup::from_collection)
                .unwrap_or_default(),
        }
    }
}

fn decode_all<T: DeserializeOwned>(collection: &Collection) -> Vec<T> {
    collection
        .iter()
        .filter_map(|record| match serde_json::from_value(record.clone().into_value()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                trace!(
                    api_tag = %collection.descriptor().api_tag,
                    id = ?record.id(),
                    error = %e,
                    "dropping malformed record"
                );
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Skip nodes without any flow or stock.
    pub hide_unconnected: bool,
    /// Only flows and stocks containing this material take part.
    pub material_filter: Option<RecordId>,
    /// Copied into every link.
    pub units: Option<String>,
}

impl TransformOptions {
    fn admits(&self, composition: Option<&Composition>) -> bool {
        match &self.material_filter {
            None => true,
            Some(material) => composition.is_some_and(|c| c.contains(material)),
        }
    }
}

/// Build the Sankey graph from flat node, flow and stock records.
///
/// Node indices are assigned in first-seen order. Flows and stocks whose
/// endpoints do not resolve to a kept node are dropped without error.
pub fn transform(input: &FlowGraphInput, options: &TransformOptions) -> FlowGraph {
    let flows: Vec<&FlowRecord> = input
        .flows
        .iter()
        .filter(|f| options.admits(f.composition.as_ref()))
        .collect();
    let stocks: Vec<&StockRecord> = input
        .stocks
        .iter()
        .filter(|s| options.admits(s.composition.as_ref()))
        .collect();

    let degree = if options.hide_unconnected {
        Some(connection_counts(&flows, &stocks))
    } else {
        None
    };

    let mut graph = FlowGraph::default();
    let mut indices: HashMap<String, usize> = HashMap::new();

    for node in &input.nodes {
        let key = node.id.key();
        if indices.contains_key(&key) {
            continue;
        }
        if let Some(degree) = &degree {
            if degree.get(&key).copied().unwrap_or(0) == 0 {
                continue;
            }
        }
        indices.insert(key, graph.nodes.len());
        graph.nodes.push(FlowGraphNode {
            id: node.id.clone(),
            name: node.name.clone().unwrap_or_default(),
            align_to_source: None,
        });
    }

    let index_of = |id: &Option<RecordId>| id.as_ref().and_then(|id| indices.get(&id.key()).copied());

    for flow in flows {
        let (Some(source), Some(target)) = (index_of(&flow.origin), index_of(&flow.destination))
        else {
            trace!(flow = ?flow.id, "dropping flow with unresolved endpoint");
            continue;
        };
        graph.links.push(FlowGraphLink {
            value: flow.amount.unwrap_or(0.0),
            source,
            target,
            text: describe(flow.waste, flow.composition.as_ref(), &input.materials),
            units: options.units.clone(),
        });
    }

    let mut seen_stocks = HashSet::new();
    for stock in stocks {
        let Some(source) = index_of(&stock.origin) else {
            trace!(stock = %stock.id, "dropping stock with unresolved origin");
            continue;
        };
        if !seen_stocks.insert(stock.id.key()) {
            trace!(stock = %stock.id, "dropping repeated stock");
            continue;
        }
        let target = graph.nodes.len();
        graph.nodes.push(FlowGraphNode {
            id: RecordId::Str(format!("stock-{}", stock.id)),
            name: STOCK_NODE_NAME.to_string(),
            align_to_source: Some(STOCK_OFFSET),
        });
        graph.links.push(FlowGraphLink {
            value: stock.amount.unwrap_or(0.0),
            source,
            target,
            text: describe(stock.waste, stock.composition.as_ref(), &input.materials),
            units: options.units.clone(),
        });
    }

    graph
}

// Flows touching a node (either end) plus stocks leaving it.
fn connection_counts(flows: &[&FlowRecord], stocks: &[&StockRecord]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let endpoints = flows
        .iter()
        .flat_map(|f| [f.origin.as_ref(), f.destination.as_ref()])
        .chain(stocks.iter().map(|s| s.origin.as_ref()))
        .flatten();
    for id in endpoints {
        *counts.entry(id.key()).or_default() += 1;
    }
    counts
}
