use crate::error::{ApiError, Result};
use crate::record::RecordId;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Logical address of a REST collection or single-record endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub api_tag: String,
    #[serde(default)]
    pub api_ids: Vec<String>,
    /// Overrides tag/ids resolution entirely.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ResourceDescriptor {
    pub fn new<I, S>(api_tag: &str, api_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            api_tag: api_tag.to_string(),
            api_ids: api_ids.into_iter().map(|id| id.to_string()).collect(),
            base_url: None,
        }
    }

    pub fn with_base_url(url: &str) -> Self {
        Self {
            base_url: Some(url.to_string()),
            ..Self::default()
        }
    }
}

/// Endpoint table: api tag -> URL template with positional `{0}`, `{1}` ... placeholders.
///
/// Owned by the surrounding application and injected; never global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlTable {
    templates: HashMap<String, String>,
    /// Prefixed onto templates that start with `/`.
    host: Option<String>,
}

impl UrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.trim_end_matches('/').to_string());
        self
    }

    pub fn insert(&mut self, api_tag: &str, template: &str) {
        self.templates
            .insert(api_tag.to_string(), template.to_string());
    }

    pub fn with(mut self, api_tag: &str, template: &str) -> Self {
        self.insert(api_tag, template);
        self
    }

    pub fn template(&self, api_tag: &str) -> Option<&str> {
        self.templates.get(api_tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parse a flat JSON object `{ "<tag>": "<template>", ... }`.
    pub fn from_json(json: &str) -> Result<Self> {
        let templates: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| ApiError::Configuration(format!("invalid url table: {}", e)))?;
        Ok(Self {
            templates,
            host: None,
        })
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Configuration(format!("cannot read url table {:?}: {}", path, e))
        })?;
        Self::from_json(&content)
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("static placeholder pattern"))
}

/// Resolve a descriptor to a concrete URL.
///
/// `base_url` is returned verbatim. Otherwise the tag's template gets its
/// placeholders replaced by `api_ids` in order; a placeholder without a
/// matching id stays literal. The path of the result ends in exactly one `/`.
pub fn resolve_url(descriptor: &ResourceDescriptor, urls: &UrlTable) -> Result<String> {
    if let Some(base_url) = &descriptor.base_url {
        return Ok(base_url.clone());
    }

    let template = urls.template(&descriptor.api_tag).ok_or_else(|| {
        ApiError::Configuration(format!("unknown api tag '{}'", descriptor.api_tag))
    })?;

    let substituted = if descriptor.api_ids.is_empty() {
        template.to_string()
    } else {
        placeholder()
            .replace_all(template, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| descriptor.api_ids.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    };

    let url = match &urls.host {
        Some(host) if substituted.starts_with('/') => format!("{}{}", host, substituted),
        _ => substituted,
    };

    Ok(ensure_trailing_slash(&url))
}

/// Collapse any trailing slashes of the path part into exactly one, keeping `?query` intact.
pub fn ensure_trailing_slash(url: &str) -> String {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };

    let mut out = path.trim_end_matches('/').to_string();
    out.push('/');
    if let Some(query) = query {
        out.push('?');
        out.push_str(query);
    }
    out
}

/// `<collection url>/<id>/`, inserted before any query string.
pub fn record_url(collection_url: &str, id: &RecordId) -> String {
    let (path, query) = match collection_url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (collection_url, None),
    };
    let joined = format!("{}/{}", path.trim_end_matches('/'), id);
    match query {
        Some(query) => ensure_trailing_slash(&format!("{}?{}", joined, query)),
        None => ensure_trailing_slash(&joined),
    }
}
