//! Client side of the GDSE REST API: resource binding (tag + path ids -> URL,
//! list fetching, filtering, saving) and the flow-graph transform feeding the
//! Sankey diagrams.

pub mod client;
pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod fanout;
pub mod flowgraph;
pub mod model;
pub mod record;
pub mod resource;
pub mod transport;
pub mod tree;

pub use client::ApiClient;
pub use collection::{fetch_list, filter_by, Collection, FilterOperator};
pub use context::{AppContext, Session};
pub use error::ApiError;
pub use record::{Record, RecordId};
pub use resource::{resolve_url, ResourceDescriptor, UrlTable};
