//! Collection fetching, saving and fan-out against an in-memory transport.
mod common;

use common::{url_table, FakeTransport};
use gdse_core::config::AppConfig;
use gdse_core::context::{AppContext, Session};
use gdse_core::error::ApiError;
use gdse_core::fanout::FanoutPolicy;
use gdse_core::model::{destroy, fetch_record, save, SaveData, SaveOptions, FORM_UPLOAD_TIMEOUT};
use gdse_core::transport::{FileUpload, FormValue, Method, RequestBody};
use gdse_core::{ApiClient, Collection, Record, RecordId, ResourceDescriptor};
use serde_json::json;
use std::sync::Arc;

const ACTIVITIES: &str = "/api/casestudies/1/keyflows/2/activities/";
const FLOWS: &str = "/api/casestudies/1/keyflows/2/activity2activity/";
const ACTORS: &str = "/api/casestudies/1/keyflows/2/actors/";

fn client(transport: Arc<FakeTransport>) -> ApiClient {
    ApiClient::new(transport, url_table())
}

fn activities() -> Collection {
    Collection::new(ResourceDescriptor::new("activities", ["1", "2"]))
}

#[tokio::test]
async fn fetch_accepts_bare_arrays() {
    let transport = Arc::new(FakeTransport::new().respond(
        Method::Get,
        ACTIVITIES,
        json!([{"id": 1, "name": "Collection"}, {"id": 2, "name": "Treatment"}]),
    ));
    let mut collection = activities();

    collection.fetch(&client(transport.clone()), &[]).await.unwrap();

    assert_eq!(collection.len(), 2);
    let requests = transport.recorded();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].query,
        vec![("page_size".to_string(), "1000000".to_string())]
    );
    assert_eq!(requests[0].timeout, None);
}

#[tokio::test]
async fn page_size_already_in_base_url_is_not_repeated() {
    let url = "/api/custom/?page_size=50";
    let transport = Arc::new(FakeTransport::new().respond(Method::Get, url, json!([{"id": 1}])));
    let mut collection = Collection::new(ResourceDescriptor::with_base_url(url));

    collection.fetch(&client(transport.clone()), &[]).await.unwrap();

    assert_eq!(collection.len(), 1);
    assert!(transport.recorded()[0].query.is_empty());
}

#[tokio::test]
async fn fetch_unwraps_pagination_envelope() {
    let transport = Arc::new(FakeTransport::new().respond(
        Method::Get,
        ACTIVITIES,
        json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [{"id": 1}, {"id": 2}]
        }),
    ));
    let mut collection = activities();

    collection
        .fetch(&client(transport.clone()), &[("nace".to_string(), "E-38".to_string())])
        .await
        .unwrap();

    assert_eq!(collection.len(), 2);
    assert!(collection.get(&RecordId::Int(2)).is_some());
    let requests = transport.recorded();
    let query = &requests[0].query;
    assert_eq!(query[0], ("nace".to_string(), "E-38".to_string()));
    assert_eq!(query.len(), 2);
}

#[tokio::test]
async fn unknown_tag_fails_before_any_request() {
    let transport = Arc::new(FakeTransport::new());
    let mut collection = Collection::new(ResourceDescriptor::new("strategies", ["1"]));

    let err = collection.fetch(&client(transport.clone()), &[]).await.unwrap_err();

    assert!(matches!(err, ApiError::Configuration(_)));
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn http_errors_reach_the_caller_unchanged() {
    let transport = Arc::new(FakeTransport::new().fail(
        Method::Get,
        ACTIVITIES,
        ApiError::Http {
            status: 403,
            body: r#"{"detail": "permission denied"}"#.into(),
        },
    ));
    let mut collection = activities();

    let err = collection.fetch(&client(transport.clone()), &[]).await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(transport.recorded().len(), 1);
}

#[tokio::test]
async fn save_posts_new_records_and_merges_response() {
    let transport = Arc::new(FakeTransport::new().respond(
        Method::Post,
        ACTORS,
        json!({"id": 17, "name": "Recycler", "created": "2026-01-01"}),
    ));
    let descriptor = ResourceDescriptor::new("actors", ["1", "2"]);
    let mut record = Record::new().with("name", json!("Recycler"));

    save(
        &client(transport.clone()),
        &descriptor,
        &mut record,
        SaveData::new().json("employees", json!(12)),
        SaveOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(record.id(), Some(RecordId::Int(17)));
    assert_eq!(record.get("employees"), Some(&json!(12)));
    assert_eq!(record.get("created"), Some(&json!("2026-01-01")));

    let requests = transport.recorded();
    let request = &requests[0];
    assert_eq!(request.method, Method::Post);
    assert_eq!(
        request.body,
        RequestBody::Json(json!({"name": "Recycler", "employees": 12}))
    );
}

#[tokio::test]
async fn save_puts_existing_records_to_their_own_url() {
    let url = format!("{}17/", ACTORS);
    let transport = Arc::new(FakeTransport::new().respond_empty(Method::Put, &url));
    let descriptor = ResourceDescriptor::new("actors", ["1", "2"]);
    let mut record = Record::new().with("id", json!(17)).with("name", json!("Old"));

    save(
        &client(transport.clone()),
        &descriptor,
        &mut record,
        SaveData::new().json("name", json!("New")),
        SaveOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(record.get("name"), Some(&json!("New")));
    let requests = transport.recorded();
    let request = &requests[0];
    assert_eq!((request.method, request.url.as_str()), (Method::Put, url.as_str()));
}

#[tokio::test]
async fn patch_sends_only_changed_fields() {
    let url = format!("{}17/", ACTORS);
    let transport = Arc::new(FakeTransport::new().respond(Method::Patch, &url, json!({"id": 17})));
    let descriptor = ResourceDescriptor::new("actors", ["1", "2"]);
    let mut record = Record::new().with("id", json!(17)).with("name", json!("Old"));

    save(
        &client(transport.clone()),
        &descriptor,
        &mut record,
        SaveData::new().json("included", json!(false)),
        SaveOptions { patch: true, ..Default::default() },
    )
    .await
    .unwrap();

    assert_eq!(
        transport.recorded()[0].body,
        RequestBody::Json(json!({"included": false}))
    );
}

#[tokio::test]
async fn files_switch_to_multipart_with_upload_timeout() {
    let transport = Arc::new(FakeTransport::new().respond(Method::Post, ACTORS, json!({"id": 3})));
    let descriptor = ResourceDescriptor::new("actors", ["1", "2"]);
    let mut record = Record::new();
    let file = FileUpload {
        file_name: "actors.xlsx".into(),
        content_type: None,
        bytes: vec![1, 2, 3],
    };

    save(
        &client(transport.clone()),
        &descriptor,
        &mut record,
        SaveData::new()
            .json("tags", json!(["a", "b"]))
            .file("bulk_upload", file.clone()),
        SaveOptions::default(),
    )
    .await
    .unwrap();

    let requests = transport.recorded();
    let request = &requests[0];
    assert_eq!(request.timeout, Some(FORM_UPLOAD_TIMEOUT));
    let RequestBody::Multipart(parts) = &request.body else {
        panic!("expected multipart body, got {:?}", request.body);
    };
    let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["tags", "tags", "bulk_upload"]);
    assert_eq!(parts[2].value, FormValue::File(file));
    assert_eq!(record.id(), Some(RecordId::Int(3)));
}

#[tokio::test]
async fn forced_form_upload_without_files() {
    let url = format!("{}4/", ACTORS);
    let transport = Arc::new(FakeTransport::new().respond_empty(Method::Put, &url));
    let descriptor = ResourceDescriptor::new("actors", ["1", "2"]);
    let mut record = Record::new().with("id", json!(4));

    save(
        &client(transport.clone()),
        &descriptor,
        &mut record,
        SaveData::new().json("name", json!("x")),
        SaveOptions { upload_as_form: true, ..Default::default() },
    )
    .await
    .unwrap();

    assert!(matches!(transport.recorded()[0].body, RequestBody::Multipart(_)));
}

#[tokio::test]
async fn destroy_and_fetch_single_record() {
    let url = format!("{}9/", ACTORS);
    let transport = Arc::new(
        FakeTransport::new()
            .respond_empty(Method::Delete, &url)
            .respond(Method::Get, &url, json!({"id": 9, "name": "Shredder"})),
    );
    let client = client(transport.clone());
    let descriptor = ResourceDescriptor::new("actors", ["1", "2"]);

    let record = fetch_record(&client, &descriptor, &RecordId::Int(9)).await.unwrap();
    assert_eq!(record.get("name"), Some(&json!("Shredder")));

    assert!(destroy(&client, &descriptor, &record).await.unwrap());
    assert!(!destroy(&client, &descriptor, &Record::new()).await.unwrap());
    assert_eq!(transport.recorded().len(), 2);
}

fn context(transport: Arc<FakeTransport>, policy: FanoutPolicy) -> AppContext {
    let mut config = AppConfig::new("", url_table());
    config.fanout_policy = policy;
    AppContext::with_transport(config, Session::new("1", "2"), transport)
}

fn failing_flows() -> Arc<FakeTransport> {
    Arc::new(
        FakeTransport::new()
            .respond(Method::Get, ACTIVITIES, json!([{"id": 1}]))
            .fail(
                Method::Get,
                FLOWS,
                ApiError::Http { status: 500, body: "boom".into() },
            ),
    )
}

#[tokio::test]
async fn abort_policy_surfaces_first_failure_after_all_settle() {
    let transport = failing_flows();
    let ctx = context(transport.clone(), FanoutPolicy::Abort);
    let mut nodes = ctx.keyflow_collection("activities");
    let mut flows = ctx.keyflow_collection("activityToActivity");

    let err = ctx.fetch_all(&mut [&mut nodes, &mut flows]).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(transport.recorded().len(), 2);
}

#[tokio::test]
async fn best_effort_policy_reports_failures() {
    let transport = failing_flows();
    let ctx = context(transport, FanoutPolicy::BestEffort);
    let mut nodes = ctx.keyflow_collection("activities");
    let mut flows = ctx.keyflow_collection("activityToActivity");

    let report = ctx.fetch_all(&mut [&mut nodes, &mut flows]).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.failures[0].0, "activityToActivity");
    assert_eq!(nodes.len(), 1);
    assert!(flows.is_empty());
}
