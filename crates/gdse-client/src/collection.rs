use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::record::{coerce_to_string, Record, RecordId};
use crate::resource::ResourceDescriptor;
use crate::transport::ApiRequest;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::debug;

/// Page size requested on every list fetch; large enough that pages are never truncated.
pub const DEFAULT_PAGE_SIZE: usize = 1_000_000;
pub const DEFAULT_COMPARATOR: &str = "id";

/// Either a bare array or Django REST framework's pagination envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<Record>),
    Page { results: Vec<Record> },
}

impl ListResponse {
    fn into_records(self) -> Vec<Record> {
        match self {
            ListResponse::Bare(records) => records,
            ListResponse::Page { results } => results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterOperator {
    #[default]
    And,
    Or,
}

/// GET the list endpoint of `descriptor` and unwrap the records.
///
/// Page metadata (`count`, `next`, `previous`) is dropped.
pub async fn fetch_list(
    client: &ApiClient,
    descriptor: &ResourceDescriptor,
    query: &[(String, String)],
    page_size: usize,
) -> Result<Vec<Record>> {
    let url = client.resolve(descriptor)?;

    let mut params = query.to_vec();
    if !params.iter().any(|(key, _)| key == "page_size") && !url_has_param(&url, "page_size") {
        params.push(("page_size".to_string(), page_size.to_string()));
    }

    let body = client
        .send(ApiRequest::get(url.clone()).with_query(params))
        .await?;

    let records = match body {
        Some(value) => serde_json::from_value::<ListResponse>(value)
            .map_err(|e| ApiError::Decode(format!("{}: {}", url, e)))?
            .into_records(),
        None => Vec::new(),
    };
    debug!(api_tag = %descriptor.api_tag, count = records.len(), "fetched list");
    Ok(records)
}

fn url_has_param(url: &str, name: &str) -> bool {
    url.split_once('?').is_some_and(|(_, query)| {
        query
            .split('&')
            .any(|pair| pair.split('=').next() == Some(name))
    })
}

/// Records whose string-coerced attributes equal the string-coerced filter values.
///
/// `true` matches `"true"` and `1` matches `"1"`. `And` over an empty map
/// keeps everything, `Or` over an empty map keeps nothing.
pub fn filter_by<'a>(
    records: &'a [Record],
    attrs: &Map<String, Value>,
    operator: FilterOperator,
) -> Vec<&'a Record> {
    let expected: Vec<(&str, String)> = attrs
        .iter()
        .map(|(key, value)| (key.as_str(), coerce_to_string(Some(value))))
        .collect();

    records
        .iter()
        .filter(|record| {
            let mut matches = expected
                .iter()
                .map(|(key, value)| coerce_to_string(record.get(key)) == *value);
            match operator {
                FilterOperator::And => matches.all(|m| m),
                FilterOperator::Or => matches.any(|m| m),
            }
        })
        .collect()
}

/// Ordered set of records bound to one resource.
#[derive(Debug, Clone)]
pub struct Collection {
    descriptor: ResourceDescriptor,
    records: Vec<Record>,
    pub page_size: usize,
    pub comparator: String,
}

impl Collection {
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            records: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            comparator: DEFAULT_COMPARATOR.to_string(),
        }
    }

    pub fn with_records(descriptor: ResourceDescriptor, records: Vec<Record>) -> Self {
        let mut collection = Self::new(descriptor);
        collection.records = records;
        collection
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the contents with the server's list.
    pub async fn fetch(&mut self, client: &ApiClient, query: &[(String, String)]) -> Result<()> {
        self.records = fetch_list(client, &self.descriptor, query, self.page_size).await?;
        Ok(())
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        let key = id.key();
        self.records
            .iter()
            .find(|record| record.id().is_some_and(|rid| rid.key() == key))
    }

    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut Record> {
        let key = id.key();
        self.records
            .iter_mut()
            .find(|record| record.id().is_some_and(|rid| rid.key() == key))
    }

    pub fn add(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        let key = id.key();
        let position = self
            .records
            .iter()
            .position(|record| record.id().is_some_and(|rid| rid.key() == key))?;
        Some(self.records.remove(position))
    }

    /// New collection (same resource) holding the matching records.
    pub fn filter_by(&self, attrs: &Map<String, Value>, operator: FilterOperator) -> Collection {
        let records = filter_by(&self.records, attrs, operator)
            .into_iter()
            .cloned()
            .collect();
        let mut filtered = Collection::with_records(self.descriptor.clone(), records);
        filtered.page_size = self.page_size;
        filtered.comparator = self.comparator.clone();
        filtered
    }

    pub fn find_where(&self, attrs: &Map<String, Value>) -> Option<&Record> {
        filter_by(&self.records, attrs, FilterOperator::And)
            .into_iter()
            .next()
    }

    /// Stable sort by the comparator attribute. Numbers compare numerically,
    /// everything else by its string form; records lacking the attribute go last.
    pub fn sort(&mut self) {
        let attr = self.comparator.clone();
        self.records
            .sort_by(|a, b| compare_attr(a.get(&attr), b.get(&attr)));
    }
}

fn compare_attr(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => coerce_to_string(Some(x)).cmp(&coerce_to_string(Some(y))),
    }
}
