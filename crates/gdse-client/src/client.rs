use crate::error::Result;
use crate::resource::{resolve_url, ResourceDescriptor, UrlTable};
use crate::transport::{ApiRequest, Transport};
use serde_json::Value;
use std::sync::Arc;

/// Shared handle to the backend: the injected endpoint table plus a transport.
///
/// Cheap to clone; every collection and model operation borrows one.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    urls: Arc<UrlTable>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, urls: UrlTable) -> Self {
        Self {
            transport,
            urls: Arc::new(urls),
        }
    }

    pub fn urls(&self) -> &UrlTable {
        &self.urls
    }

    pub fn resolve(&self, descriptor: &ResourceDescriptor) -> Result<String> {
        resolve_url(descriptor, &self.urls)
    }

    pub async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        self.transport.send(request).await
    }
}
