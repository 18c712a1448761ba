//! End-to-end tests against the live mock backend.
//!
//! # Design
//! Starts the mock server on a random port, then drives `ApiClient` over real
//! HTTP through `UreqTransport`. Covers every wire shape the client has to
//! classify: wrapped and bare JSON, plain text, backend-declared failures,
//! HTTP errors, timeouts and connection failures.

use std::time::Duration;

use api_client::{ApiClient, ApiClientConfig, ApiResponse, CancellationToken, RequestConfig, UreqTransport};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u64,
    name: String,
    level: u32,
}

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> ApiClient<UreqTransport> {
    ApiClient::new(
        UreqTransport::new(),
        ApiClientConfig::default().base_url(base_url).timeout_ms(5000),
    )
}

fn none() -> RequestConfig {
    RequestConfig::default()
}

#[tokio::test]
async fn crud_lifecycle() {
    let client = client(&start_server());

    // Step 1: list: should be empty.
    let items: ApiResponse<Vec<Item>> = client.get("/items", &none()).await;
    assert!(items.into_required_data().unwrap().is_empty(), "expected empty list");

    // Step 2: create.
    let created: ApiResponse<Item> = client
        .post("/items", Some(&json!({ "name": "Integration test" })), &none())
        .await;
    let created = created.into_required_data().unwrap();
    assert_eq!(created.name, "Integration test");
    assert_eq!(created.level, 1);
    let id = created.id;

    // Step 3: get the created item.
    let fetched: ApiResponse<Item> = client.get(&format!("/items/{id}"), &none()).await;
    assert_eq!(fetched.into_required_data().unwrap(), created);

    // Step 4: patch level only.
    let patched: ApiResponse<Item> = client
        .patch(&format!("items/{id}"), Some(&json!({ "level": 5 })), &none())
        .await;
    let patched = patched.into_required_data().unwrap();
    assert_eq!(patched.name, "Integration test");
    assert_eq!(patched.level, 5);

    // Step 5: put replaces the whole item.
    let replaced: ApiResponse<Item> = client
        .put(&format!("/items/{id}"), Some(&json!({ "name": "Replaced" })), &none())
        .await;
    let replaced = replaced.into_required_data().unwrap();
    assert_eq!(replaced.name, "Replaced");
    assert_eq!(replaced.level, 1);

    // Step 6: delete. The backend answers `{success:true}` with no data.
    let deleted: ApiResponse<Option<Item>> = client.delete(&format!("/items/{id}"), &none()).await;
    assert!(deleted.is_success());
    assert_eq!(deleted.into_required_data().unwrap(), None);

    // Step 7: get after delete: backend message surfaces.
    let missing: ApiResponse<Item> = client.get(&format!("/items/{id}"), &none()).await;
    assert!(missing.is_error());
    assert_eq!(missing.error_message(), Some("Item not found"));
    assert!(missing.require_data().is_err());
}

#[tokio::test]
async fn wire_shapes_are_classified() {
    let client = client(&start_server());

    let raw: ApiResponse<Value> = client.get("/raw", &none()).await;
    assert_eq!(raw.into_required_data().unwrap(), json!({ "id": 1 }));

    let text: ApiResponse<String> = client.get("/text", &none()).await;
    assert_eq!(text.into_required_data().unwrap(), "hello");

    let logical: ApiResponse<Value> = client.get("/logical-error", &none()).await;
    assert!(logical.is_error());
    assert_eq!(logical.message(), Some("Quota exceeded"));

    let unavailable: ApiResponse<Value> = client.get("/status/503", &none()).await;
    assert_eq!(unavailable.message(), Some("HTTP 503: Service Unavailable"));
}

#[tokio::test]
async fn rejected_body_surfaces_raw_text() {
    let client = client(&start_server());

    let result: ApiResponse<Value> = client
        .post("/items", Some(&json!({ "not_name": 1 })), &none())
        .await;
    assert!(result.is_error());
    let message = result.message().unwrap();
    assert!(message.contains("missing field `name`"), "{message}");
}

#[tokio::test]
async fn headers_token_and_body_reach_the_server() {
    let mut client = client(&start_server());
    client.set_token("secret");

    let config = RequestConfig::new()
        .header("X-Trace", "t-42")
        .header("Authorization", "Bearer forged");
    let echoed: ApiResponse<Value> = client
        .put("/echo", Some(&json!({ "a": 1 })), &config)
        .await;
    let echoed = echoed.into_required_data().unwrap();
    assert_eq!(echoed["method"], "PUT");
    assert_eq!(echoed["headers"]["authorization"], "Bearer secret");
    assert_eq!(echoed["headers"]["x-trace"], "t-42");
    assert_eq!(echoed["headers"]["accept"], "application/json");
    assert_eq!(echoed["body"], r#"{"a":1}"#);

    client.set_token("");
    let echoed: ApiResponse<Value> = client
        .request(api_client::HttpMethod::Get, "/echo", Some(&json!({ "ignored": true })), &none())
        .await;
    let echoed = echoed.into_required_data().unwrap();
    assert_eq!(echoed["method"], "GET");
    assert!(echoed["headers"].get("authorization").is_none());
    assert!(echoed["body"].is_null());

    let echoed: ApiResponse<Value> = client
        .request(api_client::HttpMethod::Delete, "/echo", Some(&json!({ "ids": [1] })), &none())
        .await;
    let echoed = echoed.into_required_data().unwrap();
    assert_eq!(echoed["method"], "DELETE");
    assert_eq!(echoed["body"], r#"{"ids":[1]}"#);
}

#[tokio::test]
async fn absolute_url_and_base_override() {
    let base = start_server();
    let client = client("http://127.0.0.1:1");

    let absolute: ApiResponse<Value> = client.get(&format!("{base}/raw"), &none()).await;
    assert!(absolute.is_success());

    let overridden: ApiResponse<String> = client
        .get("text", &RequestConfig::new().base_url(base.as_str()))
        .await;
    assert_eq!(overridden.into_required_data().unwrap(), "hello");
}

#[tokio::test]
async fn slow_response_times_out() {
    let client = client(&start_server());

    let result: ApiResponse<Value> = client
        .get("/slow/2000", &RequestConfig::new().timeout_ms(100))
        .await;
    assert!(result.is_error());
    assert_eq!(result.message(), Some("Request timeout"));

    let result: ApiResponse<Value> = client
        .get("/slow/10", &RequestConfig::new().timeout_ms(2000))
        .await;
    assert_eq!(result.into_required_data().unwrap(), json!({ "waited": 10 }));
}

#[tokio::test]
async fn caller_cancellation_aborts() {
    let client = client(&start_server());
    let token = CancellationToken::new();
    let config = RequestConfig::new().signal(token.clone());

    let canceller = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    };
    let (result, ()) = tokio::join!(client.get::<Value>("/slow/2000", &config), canceller);

    assert!(result.is_error());
    assert_eq!(result.message(), Some("Request aborted"));
}

#[tokio::test]
async fn connection_failure_is_an_error_envelope() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = client(&format!("http://{addr}"));

    let result: ApiResponse<Value> = client.get("/anything", &none()).await;
    assert!(result.is_error());
    assert!(!result.message().unwrap().is_empty());
    assert!(result.data().is_none());
}

#[tokio::test]
async fn caller_supplied_agent_keeps_statuses_as_data() {
    let base = start_server();
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let client = ApiClient::new(
        UreqTransport::with_agent(agent),
        ApiClientConfig::default().base_url(base.as_str()),
    );
    assert!(format!("{client:?}").contains(&base));

    let raw: ApiResponse<Value> = client.get("/raw", &none()).await;
    assert_eq!(raw.into_required_data().unwrap(), json!({ "id": 1 }));

    let missing: ApiResponse<Value> = client.get("/items/999", &none()).await;
    assert_eq!(missing.message(), Some("Item not found"));

    let teapot: ApiResponse<Value> = client.get("/status/418", &none()).await;
    assert_eq!(teapot.message(), Some("HTTP 418: I'm a teapot"));
}
