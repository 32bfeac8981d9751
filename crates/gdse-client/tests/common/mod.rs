//! In-memory transport and fixtures shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use gdse_core::error::{ApiError, Result};
use gdse_core::transport::{ApiRequest, Method, Transport};
use gdse_core::UrlTable;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers from a fixed route table and records every request it sees.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), Result<Option<Value>>>>,
    pub requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, method: Method, url: &str, body: Value) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, url.to_string()), Ok(Some(body)));
        self
    }

    pub fn respond_empty(self, method: Method, url: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, url.to_string()), Ok(None));
        self
    }

    pub fn fail(self, method: Method, url: &str, error: ApiError) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, url.to_string()), Err(error));
        self
    }

    pub fn recorded(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        let key = (request.method, request.url.clone());
        self.requests.lock().unwrap().push(request);
        match self.routes.lock().unwrap().get(&key) {
            Some(answer) => answer.clone(),
            None => Err(ApiError::Http {
                status: 404,
                body: format!("no route for {:?} {}", key.0, key.1),
            }),
        }
    }
}

pub fn url_table() -> UrlTable {
    UrlTable::new()
        .with("casestudies", "/api/casestudies/")
        .with("activities", "/api/casestudies/{0}/keyflows/{1}/activities/")
        .with("activityToActivity", "/api/casestudies/{0}/keyflows/{1}/activity2activity/")
        .with("activityStock", "/api/casestudies/{0}/keyflows/{1}/activitystock/")
        .with("actors", "/api/casestudies/{0}/keyflows/{1}/actors/")
        .with("materials", "/api/casestudies/{0}/keyflows/{1}/materials/")
}
