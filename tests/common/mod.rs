//! Shared fixtures: a stub upstream API and a server context pointing at it.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use rmcp::model::JsonObject;
use serde_json::{Value, json};
use tokio::sync::Notify;

use api_gateway_mcp::core::{BaseUrls, Config, ServerContext};
use api_gateway_mcp::domains::tools::{
    FnToolHandler, ToolCall, ToolDescriptor, ToolRegistry, definitions,
};

pub const API_KEY: &str = "test-key";

/// Stub upstream state.
#[derive(Clone, Default)]
pub struct Upstream {
    hits: Arc<AtomicUsize>,
    pub slow_started: Arc<Notify>,
}

impl Upstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

async fn get_user(
    State(upstream): State<Upstream>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    upstream.hit();
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {API_KEY}"));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }
    match user_id.as_str() {
        "42" => Json(json!({"name": "Ada"})).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "no such user"}))).into_response(),
    }
}

async fn search(State(upstream): State<Upstream>) -> impl IntoResponse {
    upstream.hit();
    StatusCode::SERVICE_UNAVAILABLE
}

async fn slow(State(upstream): State<Upstream>) -> impl IntoResponse {
    upstream.hit();
    upstream.slow_started.notify_one();
    tokio::time::sleep(Duration::from_secs(30)).await;
    Json(json!({}))
}

/// Serve the stub on an ephemeral port and return its base URL.
pub async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/users/{user_id}", get(get_user))
        .route("/search", get(search))
        .route("/slow", get(slow))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (format!("http://{addr}"), upstream)
}

/// Context acquired the way the binary does it.
pub fn context(base_url: &str, timeout_secs: u64) -> Arc<ServerContext> {
    let mut config = Config::default();
    config.api.credential = Some(API_KEY.to_string());
    config.api.base_urls = BaseUrls::new().with(BaseUrls::DEFAULT_KEY, base_url);
    config.api.timeout_secs = timeout_secs;
    Arc::new(ServerContext::acquire(&config).unwrap())
}

/// Built-in tools plus `slow`, which waits on the stub's `/slow` endpoint.
pub fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    definitions::register_builtin(&mut registry).unwrap();

    let schema = object(json!({"type": "object", "properties": {}}));
    registry
        .register(
            ToolDescriptor::new("slow", "Waits on a slow endpoint", Arc::new(schema)),
            FnToolHandler::new(|call: ToolCall, _args| async move {
                let url = call.url(&["slow"])?;
                let no_query: [(&str, &str); 0] = [];
                call.context.client().get_json(url, &no_query).await
            }),
        )
        .unwrap();

    registry
}

pub fn object(value: Value) -> JsonObject {
    value.as_object().cloned().unwrap()
}
