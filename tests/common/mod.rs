//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use retoots::{AppState, config};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

/// Call counters of the mock Mastodon server
#[derive(Default)]
pub struct UpstreamCalls {
    pub status: AtomicUsize,
    pub context: AtomicUsize,
    pub favourited_by: AtomicUsize,
    pub reblogged_by: AtomicUsize,
}

impl UpstreamCalls {
    pub fn status(&self) -> usize {
        self.status.load(Ordering::SeqCst)
    }

    pub fn context(&self) -> usize {
        self.context.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct UpstreamState {
    base_url: String,
    calls: Arc<UpstreamCalls>,
    fail_boosts: bool,
}

/// Mock Mastodon server
///
/// Knows status 123 by `username123` and status 234 by `username234`.
/// Status 123 has two replies, three favourites over two pages and one boost.
pub struct MockUpstream {
    pub base_url: String,
    pub calls: Arc<UpstreamCalls>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    /// Start a server whose `reblogged_by` endpoint always fails
    pub async fn start_with_failing_boosts() -> Self {
        Self::start_with(true).await
    }

    async fn start_with(fail_boosts: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let calls = Arc::new(UpstreamCalls::default());

        let state = UpstreamState {
            base_url: base_url.clone(),
            calls: calls.clone(),
            fail_boosts,
        };
        let app = Router::new()
            .route("/api/v1/statuses/:id", get(upstream_status))
            .route("/api/v1/statuses/:id/context", get(upstream_context))
            .route(
                "/api/v1/statuses/:id/favourited_by",
                get(upstream_favourited_by),
            )
            .route(
                "/api/v1/statuses/:id/reblogged_by",
                get(upstream_reblogged_by),
            )
            .with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, calls }
    }

    /// Status URL as a user would paste it
    pub fn status_url(&self, author: &str, id: &str) -> String {
        format!("{}/@{}/{}", self.base_url, author, id)
    }

    /// Fully-qualified handle of a local account on this server
    pub fn handle(&self, username: &str) -> String {
        retoots::mastodon::normalize_acct(&self.base_url, username).unwrap()
    }
}

fn account_json(id: &str, username: &str) -> serde_json::Value {
    json!({
        "id": id,
        "username": username,
        "acct": username,
        "avatar": format!("https://files.example/{username}.png"),
        "avatar_static": format!("https://files.example/{username}-static.png"),
        "url": format!("https://example/@{username}"),
    })
}

fn status_json(id: &str, author_id: &str, author: &str) -> serde_json::Value {
    json!({
        "id": id,
        "content": format!("<p>content{id}</p>"),
        "created_at": "2021-01-02T10:00:00.000Z",
        "url": format!("https://example/@{author}/{id}"),
        "account": account_json(author_id, author),
    })
}

async fn upstream_status(
    State(state): State<UpstreamState>,
    Path(id): Path<String>,
) -> Response {
    state.calls.status.fetch_add(1, Ordering::SeqCst);
    match id.as_str() {
        "123" => Json(status_json("123", "123", "username123")).into_response(),
        "234" => Json(status_json("234", "234", "username234")).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "Record not found"}))).into_response(),
    }
}

async fn upstream_context(
    State(state): State<UpstreamState>,
    Path(id): Path<String>,
) -> Response {
    state.calls.context.fetch_add(1, Ordering::SeqCst);
    match id.as_str() {
        "123" => Json(json!({
            "ancestors": [],
            "descendants": [
                status_json("125", "7", "replier"),
                status_json("124", "8", "other"),
            ],
        }))
        .into_response(),
        "234" => Json(json!({})).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Deserialize)]
struct PageQuery {
    max_id: Option<String>,
}

async fn upstream_favourited_by(
    State(state): State<UpstreamState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    state.calls.favourited_by.fetch_add(1, Ordering::SeqCst);
    if id != "123" {
        return Json(json!([])).into_response();
    }

    match query.max_id.as_deref() {
        None => {
            let next = format!(
                "<{}/api/v1/statuses/123/favourited_by?max_id=50>; rel=\"next\", <{}/api/v1/statuses/123/favourited_by?min_id=60>; rel=\"prev\"",
                state.base_url, state.base_url
            );
            (
                [(header::LINK, next)],
                Json(json!([
                    account_json("1", "fan1"),
                    account_json("2", "fan2@elsewhere.social"),
                ])),
            )
                .into_response()
        }
        Some("50") => Json(json!([account_json("3", "fan3")])).into_response(),
        Some(_) => Json(json!([])).into_response(),
    }
}

async fn upstream_reblogged_by(
    State(state): State<UpstreamState>,
    Path(id): Path<String>,
) -> Response {
    state.calls.reblogged_by.fetch_add(1, Ordering::SeqCst);
    if state.fail_boosts {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if id != "123" {
        return Json(json!([])).into_response();
    }
    Json(json!([account_json("4", "booster")])).into_response()
}

/// Gateway instance under test
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start a gateway with the given allow-list
    pub async fn new(allowed_root_accounts: Vec<String>) -> Self {
        let config = test_config(allowed_root_accounts);
        let state = AppState::new(config).unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let app = retoots::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// GET an endpoint with the `status` query parameter
    pub async fn get_for_status(&self, path: &str, status: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .query(&[("status", status)])
            .send()
            .await
            .unwrap()
    }
}

pub fn test_config(allowed_root_accounts: Vec<String>) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: vec!["https://blog.example.com".to_string()],
        },
        authorization: config::AuthorizationConfig {
            allowed_root_accounts,
            cache_capacity: 1024,
        },
        upstream: config::UpstreamConfig {
            timeout_seconds: 5,
            max_pages: 10,
            user_agent: "retoots-test".to_string(),
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}
