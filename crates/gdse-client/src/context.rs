use crate::client::ApiClient;
use crate::collection::Collection;
use crate::config::AppConfig;
use crate::error::Result;
use crate::fanout::{fetch_all, FanoutPolicy, FanoutReport};
use crate::resource::ResourceDescriptor;
use crate::transport::{HttpTransport, Transport};
use std::sync::Arc;

/// The case study and keyflow the user is working in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub casestudy: Option<String>,
    pub keyflow: Option<String>,
}

impl Session {
    pub fn new(casestudy: &str, keyflow: &str) -> Self {
        Self {
            casestudy: Some(casestudy.to_string()),
            keyflow: Some(keyflow.to_string()),
        }
    }

    /// Path ids for keyflow-scoped resources, `[casestudy, keyflow]`.
    pub fn keyflow_ids(&self) -> Vec<String> {
        self.casestudy
            .iter()
            .chain(self.keyflow.iter())
            .cloned()
            .collect()
    }
}

/// Everything a view needs, created once at bootstrap and passed down explicitly.
#[derive(Clone)]
pub struct AppContext {
    pub client: ApiClient,
    pub session: Session,
    pub policy: FanoutPolicy,
}

impl AppContext {
    /// Build the HTTP transport from `config`.
    pub fn init(config: AppConfig, session: Session) -> Result<Self> {
        let transport =
            HttpTransport::new(config.request_timeout)?.with_csrf_token(config.csrf_token.clone());
        Ok(Self::with_transport(config, session, Arc::new(transport)))
    }

    pub fn with_transport(
        config: AppConfig,
        session: Session,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            client: ApiClient::new(transport, config.url_table),
            session,
            policy: config.fanout_policy,
        }
    }

    pub fn collection<I, S>(&self, api_tag: &str, api_ids: I) -> Collection
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Collection::new(ResourceDescriptor::new(api_tag, api_ids))
    }

    /// Collection scoped to the session's case study and keyflow.
    pub fn keyflow_collection(&self, api_tag: &str) -> Collection {
        self.collection(api_tag, self.session.keyflow_ids())
    }

    /// Concurrent fetch under the configured fan-out policy.
    pub async fn fetch_all(&self, collections: &mut [&mut Collection]) -> Result<FanoutReport> {
        fetch_all(&self.client, collections, self.policy).await
    }
}
