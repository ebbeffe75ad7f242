//! Status interaction endpoints
//!
//! Every endpoint takes the status URL in the `status` query parameter,
//! authorizes its root author and then asks the remote server.

use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::mastodon::{Account, Status, StatusReference};
use crate::service::Interactions;

/// Create status router
///
/// Routes:
/// - GET /v1/descendants
/// - GET /v1/favourited_by (alias /v1/favorited_by)
/// - GET /v1/boosted_by
/// - GET /v1/interactions
pub fn statuses_router() -> Router<AppState> {
    Router::new()
        .route("/v1/descendants", get(get_descendants))
        .route("/v1/favourited_by", get(get_favourited_by))
        .route("/v1/favorited_by", get(get_favourited_by))
        .route("/v1/boosted_by", get(get_boosted_by))
        .route("/v1/interactions", get(get_interactions))
}

/// Query parameters shared by all endpoints
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Raw status URL, e.g. `https://chaos.social/@zerok/105475673515689340`
    pub status: Option<String>,
}

/// Normalize the `status` parameter and check its root author
async fn authorized_reference(
    state: &AppState,
    query: StatusQuery,
) -> Result<StatusReference, AppError> {
    let raw = query
        .status
        .filter(|status| !status.trim().is_empty())
        .ok_or(AppError::MissingParameter("status"))?;
    let reference = StatusReference::parse(&raw)?;

    state.authorization.authorize(&reference).await?;
    Ok(reference)
}

fn record<T>(endpoint: &str, result: &Result<T, AppError>) {
    use crate::metrics::HTTP_REQUESTS_TOTAL;

    let outcome = match result {
        Ok(_) => "ok",
        Err(error) => error.kind(),
    };
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[endpoint, outcome])
        .inc();
}

/// GET /api/v1/descendants
pub async fn get_descendants(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Status>>, AppError> {
    let result = async {
        let reference = authorized_reference(&state, query).await?;
        state.interactions.descendants(&reference).await
    }
    .await;

    record("descendants", &result);
    result.map(Json)
}

/// GET /api/v1/favourited_by
pub async fn get_favourited_by(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Account>>, AppError> {
    let result = async {
        let reference = authorized_reference(&state, query).await?;
        state.interactions.favourited_by(&reference).await
    }
    .await;

    record("favourited_by", &result);
    result.map(Json)
}

/// GET /api/v1/boosted_by
pub async fn get_boosted_by(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Account>>, AppError> {
    let result = async {
        let reference = authorized_reference(&state, query).await?;
        state.interactions.boosted_by(&reference).await
    }
    .await;

    record("boosted_by", &result);
    result.map(Json)
}

/// GET /api/v1/interactions
pub async fn get_interactions(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Interactions>, AppError> {
    let result = async {
        let reference = authorized_reference(&state, query).await?;
        state.interactions.interactions(&reference).await
    }
    .await;

    record("interactions", &result);
    result.map(Json)
}
