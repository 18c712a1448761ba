use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub level: u32,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub level: Option<u32>,
}

fn default_level() -> u32 {
    1
}

/// The backend's response convention: `{ success, data?, error?, message? }`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: None,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: None,
            message: Some(message.to_string()),
        }
    }
}

#[derive(Clone, Default)]
pub struct Db {
    items: Arc<RwLock<HashMap<u64, Item>>>,
    next_id: Arc<AtomicU64>,
}

type Reply<T> = Result<Json<Envelope<T>>, (StatusCode, Json<Envelope<T>>)>;

pub fn app() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item)
                .put(replace_item)
                .patch(update_item)
                .delete(delete_item),
        )
        .route("/raw", get(raw))
        .route("/text", get(text))
        .route("/logical-error", get(logical_error))
        .route("/status/{code}", get(status))
        .route("/slow/{ms}", get(slow))
        .route("/echo", any(echo))
        .with_state(Db::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found<T>() -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::NOT_FOUND, Json(Envelope::failed("Item not found")))
}

async fn list_items(State(db): State<Db>) -> Json<Envelope<Vec<Item>>> {
    let items = db.items.read().await;
    let mut items: Vec<Item> = items.values().cloned().collect();
    items.sort_by_key(|item| item.id);
    Json(Envelope::ok(items))
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> (StatusCode, Json<Envelope<Item>>) {
    let item = Item {
        id: db.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        name: input.name,
        level: input.level,
    };
    tracing::debug!(id = item.id, "item created");
    db.items.write().await.insert(item.id, item.clone());
    (StatusCode::CREATED, Json(Envelope::ok(item)))
}

async fn get_item(State(db): State<Db>, Path(id): Path<u64>) -> Reply<Item> {
    let items = db.items.read().await;
    items
        .get(&id)
        .cloned()
        .map(|item| Json(Envelope::ok(item)))
        .ok_or_else(not_found::<Item>)
}

async fn replace_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<CreateItem>,
) -> Reply<Item> {
    let mut items = db.items.write().await;
    let item = items.get_mut(&id).ok_or_else(not_found::<Item>)?;
    item.name = input.name;
    item.level = input.level;
    Ok(Json(Envelope::ok(item.clone())))
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateItem>,
) -> Reply<Item> {
    let mut items = db.items.write().await;
    let item = items.get_mut(&id).ok_or_else(not_found::<Item>)?;
    if let Some(name) = input.name {
        item.name = name;
    }
    if let Some(level) = input.level {
        item.level = level;
    }
    Ok(Json(Envelope::ok(item.clone())))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<u64>) -> Reply<()> {
    let mut items = db.items.write().await;
    items
        .remove(&id)
        .map(|_| Json(Envelope::empty()))
        .ok_or_else(not_found::<()>)
}

async fn raw() -> Json<Value> {
    Json(json!({ "id": 1 }))
}

async fn text() -> &'static str {
    "hello"
}

async fn logical_error() -> Json<Value> {
    Json(json!({ "success": false, "error": { "message": "Quota exceeded" } }))
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn slow(Path(ms): Path<u64>) -> Json<Envelope<Value>> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(Envelope::ok(json!({ "waited": ms })))
}

/// Reflect the request back so clients can assert on what they sent.
async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Value> {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(json!({
        "method": method.as_str(),
        "headers": headers,
        "body": if body.is_empty() { Value::Null } else { Value::String(body) },
    }))
}
