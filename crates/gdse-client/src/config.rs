use crate::error::{ApiError, Result};
use crate::fanout::FanoutPolicy;
use crate::resource::UrlTable;
use std::path::Path;
use std::time::Duration;

const DEFAULT_API_HOST: &str = "http://localhost:8000";

pub const ENV_API_HOST: &str = "GDSE_API_HOST";
pub const ENV_URL_TABLE: &str = "GDSE_URL_TABLE";
pub const ENV_CSRF_TOKEN: &str = "GDSE_CSRF_TOKEN";
pub const ENV_FANOUT_POLICY: &str = "GDSE_FANOUT_POLICY";
pub const ENV_REQUEST_TIMEOUT: &str = "GDSE_REQUEST_TIMEOUT_SECS";

/// Bootstrap configuration, read once and handed to [`crate::context::AppContext::init`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_host: String,
    /// Already carries `api_host` for relative templates.
    pub url_table: UrlTable,
    pub csrf_token: Option<String>,
    pub fanout_policy: FanoutPolicy,
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn new(api_host: &str, url_table: UrlTable) -> Self {
        Self {
            api_host: api_host.to_string(),
            url_table: url_table.with_host(api_host),
            csrf_token: None,
            fanout_policy: FanoutPolicy::default(),
            request_timeout: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = lookup(ENV_API_HOST).unwrap_or_else(|| DEFAULT_API_HOST.to_string());

        let table_source = lookup(ENV_URL_TABLE).ok_or_else(|| {
            ApiError::Configuration(format!("{} is not set", ENV_URL_TABLE))
        })?;
        // Inline JSON or a path to a JSON file
        let url_table = if table_source.trim_start().starts_with('{') {
            UrlTable::from_json(&table_source)?
        } else {
            UrlTable::load_file(Path::new(&table_source))?
        };

        let fanout_policy = match lookup(ENV_FANOUT_POLICY) {
            Some(value) => value.parse()?,
            None => FanoutPolicy::default(),
        };

        let request_timeout = match lookup(ENV_REQUEST_TIMEOUT) {
            Some(value) => Some(Duration::from_secs(value.trim().parse().map_err(|_| {
                ApiError::Configuration(format!("{} must be whole seconds", ENV_REQUEST_TIMEOUT))
            })?)),
            None => None,
        };

        let mut config = Self::new(&api_host, url_table);
        config.csrf_token = lookup(ENV_CSRF_TOKEN).filter(|t| !t.is_empty());
        config.fanout_policy = fanout_policy;
        config.request_timeout = request_timeout;
        Ok(config)
    }
}
