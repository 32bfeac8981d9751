use crate::error::{ApiError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn is_safe(self) -> bool {
        matches!(self, Method::Get)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Binary payload of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(FileUpload),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Per-request override of the transport timeout.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The one seam between the binding layer and the network.
///
/// Returns the decoded JSON body, or `None` when the server answered with an
/// empty body. Non-success statuses must come back as [`ApiError::Http`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>>;
}

/// `reqwest`-backed transport talking to the Django REST API.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
    csrf_token: Option<String>,
}

impl HttpTransport {
    /// Without a timeout, requests wait as long as the server takes.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Configuration(format!("cannot build http client: {}", e)))?;
        Ok(Self {
            client,
            timeout,
            csrf_token: None,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Token sent with every non-GET request, as Django's CSRF middleware expects.
    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }

    fn build_form(parts: Vec<FormPart>) -> Result<Form> {
        let mut form = Form::new();
        for part in parts {
            form = match part.value {
                FormValue::Text(text) => form.text(part.name, text),
                FormValue::File(file) => {
                    let mut file_part = Part::bytes(file.bytes).file_name(file.file_name);
                    if let Some(content_type) = &file.content_type {
                        file_part = file_part.mime_str(content_type).map_err(|e| {
                            ApiError::Configuration(format!("invalid content type: {}", e))
                        })?;
                    }
                    form.part(part.name, file_part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        debug!(method = ?request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(request.method.into(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if !request.method.is_safe() {
            if let Some(token) = &self.csrf_token {
                builder = builder.header(CSRF_HEADER, token);
            }
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), url = %request.url, "request failed");
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}
