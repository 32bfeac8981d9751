use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::record::{coerce_to_string, Record, RecordId};
use crate::resource::{record_url, ResourceDescriptor};
use crate::transport::{ApiRequest, FileUpload, FormPart, FormValue, Method, RequestBody};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Fixed client-side timeout for multipart uploads.
pub const FORM_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum SaveValue {
    Json(Value),
    File(FileUpload),
}

/// Ordered key/value payload of a save. Order is kept for multipart bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveData {
    entries: Vec<(String, SaveValue)>,
}

impl SaveData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, key: &str, value: Value) -> Self {
        self.entries.push((key.to_string(), SaveValue::Json(value)));
        self
    }

    pub fn file(mut self, key: &str, file: FileUpload) -> Self {
        self.entries.push((key.to_string(), SaveValue::File(file)));
        self
    }

    pub fn has_files(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, value)| matches!(value, SaveValue::File(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn json_fields(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(key, value)| match value {
                SaveValue::Json(v) => Some((key.clone(), v.clone())),
                SaveValue::File(_) => None,
            })
            .collect()
    }

    /// One part per key; arrays contribute one part per element under the same name.
    pub fn to_form_parts(&self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        for (key, value) in &self.entries {
            match value {
                SaveValue::File(file) => parts.push(FormPart {
                    name: key.clone(),
                    value: FormValue::File(file.clone()),
                }),
                SaveValue::Json(Value::Array(items)) => {
                    for item in items {
                        parts.push(FormPart {
                            name: key.clone(),
                            value: FormValue::Text(form_text(item)),
                        });
                    }
                }
                SaveValue::Json(other) => parts.push(FormPart {
                    name: key.clone(),
                    value: FormValue::Text(form_text(other)),
                }),
            }
        }
        parts
    }
}

// Objects are sent as JSON text instead of "[object Object]".
fn form_text(value: &Value) -> String {
    match value {
        Value::Object(_) => value.to_string(),
        other => coerce_to_string(Some(other)),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Force a multipart body even without file values.
    pub upload_as_form: bool,
    /// Send only `data` as PATCH (persisted records only).
    pub patch: bool,
}

/// Create or update `record` on the resource described by `descriptor`.
///
/// Persisted records (with an id) go to `<url>/<id>/` as PUT, new ones are
/// POSTed to the collection URL. A file value or `upload_as_form` switches the
/// body to multipart. On success the response fields are merged into `record`.
pub async fn save(
    client: &ApiClient,
    descriptor: &ResourceDescriptor,
    record: &mut Record,
    data: SaveData,
    options: SaveOptions,
) -> Result<()> {
    let url = client.resolve(descriptor)?;
    let id = record.id();

    let (method, target) = match &id {
        Some(id) if options.patch => (Method::Patch, record_url(&url, id)),
        Some(id) => (Method::Put, record_url(&url, id)),
        None => (Method::Post, url),
    };

    let request = if options.upload_as_form || data.has_files() {
        ApiRequest::new(method, target)
            .with_body(RequestBody::Multipart(data.to_form_parts()))
            .with_timeout(FORM_UPLOAD_TIMEOUT)
    } else if method == Method::Patch {
        ApiRequest::new(method, target).with_body(RequestBody::Json(Value::Object(data.json_fields())))
    } else {
        let mut body = record.clone();
        body.merge(data.json_fields());
        ApiRequest::new(method, target).with_body(RequestBody::Json(body.into_value()))
    };

    debug!(api_tag = %descriptor.api_tag, method = ?method, "saving record");
    let response = client.send(request).await?;

    record.merge(data.json_fields());
    if let Some(Value::Object(fields)) = response {
        record.merge(fields);
    }
    Ok(())
}

/// DELETE `<url>/<id>/`. Unsaved records are never sent; returns whether a request was made.
pub async fn destroy(
    client: &ApiClient,
    descriptor: &ResourceDescriptor,
    record: &Record,
) -> Result<bool> {
    let Some(id) = record.id() else {
        return Ok(false);
    };
    let url = record_url(&client.resolve(descriptor)?, &id);
    client.send(ApiRequest::new(Method::Delete, url)).await?;
    Ok(true)
}

/// GET a single record.
pub async fn fetch_record(
    client: &ApiClient,
    descriptor: &ResourceDescriptor,
    id: &RecordId,
) -> Result<Record> {
    let url = record_url(&client.resolve(descriptor)?, id);
    match client.send(ApiRequest::get(url.clone())).await? {
        Some(value) => Record::try_from(value),
        None => Err(ApiError::Decode(format!("empty response from {}", url))),
    }
}
