//! HTTP API over the snapshot.
//!
//! ## Endpoints
//!
//! - `GET /get_all_results`                 - first `head_limit` records
//! - `GET /search_user_result?user_id=<id>` - every record for one user
//!
//! Handlers only read the shared snapshot, so requests run fully in
//! parallel without locking.

use crate::{
    error::ServiceResult,
    query::{Lookup, QueryService},
    snapshot::Snapshot,
    types::USER_ID_COLUMN,
};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};

pub const MISSING_USER_ID_MESSAGE: &str =
    "Error: No user_id field provided. Please specify an user id.";
pub const USER_NOT_FOUND_MESSAGE: &str = "userId is not found";

// ── Shared state ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub query:      QueryService,
    pub head_limit: usize,
}

impl AppState {
    pub fn new(snapshot: Arc<Snapshot>, head_limit: usize) -> Self {
        Self {
            query: QueryService::new(snapshot),
            head_limit,
        }
    }
}

// ── Request / Response types ────────────────────────────────────────────

/// Body of a 500 response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ── Router creation ─────────────────────────────────────────────────────

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/get_all_results", get(get_all_results))
        .route("/search_user_result", get(search_user_result))
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> ServiceResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("api: listening on http://{addr}");
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn get_all_results(State(state): State<AppState>) -> Result<Response, ApiError> {
    log::info!("GET request received at /get_all_results");
    let head = state.query.list_head(state.head_limit);
    let response = json_response(&head)?;
    log::info!("/get_all_results: returned {} records", head.len());
    Ok(response)
}

async fn search_user_result(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    log::info!("GET request received at /search_user_result");
    // A repeated parameter resolves to its first occurrence.
    let user_id = params
        .into_iter()
        .find_map(|(key, value)| (key == USER_ID_COLUMN).then_some(value))
        .ok_or(ApiError::MissingUserId)?;
    log::info!("User ID: {user_id} requested.");

    match state.query.find_by_user_id(&user_id) {
        Lookup::Found(records) => {
            let response = json_response(&records)?;
            log::info!("user_id {user_id} found ({} records).", records.len());
            Ok(response)
        }
        Lookup::NotFound => Err(ApiError::NotFound(user_id)),
    }
}

fn json_response<T: Serialize + ?Sized>(body: &T) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

// ── Error type ──────────────────────────────────────────────────────────

/// Per-request failures. None of them take the server down.
#[derive(Debug)]
pub enum ApiError {
    /// The required `user_id` query parameter was absent.
    MissingUserId,
    /// The lookup ran and matched nothing.
    NotFound(String),
    /// Anything unexpected while answering from the snapshot.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingUserId => {
                log::warn!("No user_id provided in request.");
                (StatusCode::BAD_REQUEST, MISSING_USER_ID_MESSAGE).into_response()
            }
            ApiError::NotFound(user_id) => {
                log::info!("user_id {user_id} not found.");
                (StatusCode::NOT_FOUND, USER_NOT_FOUND_MESSAGE).into_response()
            }
            ApiError::Internal(message) => {
                log::error!("internal error while serving request: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody { error: message }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema::FieldValue, snapshot::Record};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(ids: &[&str]) -> Router {
        let records: Vec<Record> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                [
                    ("user_id".to_string(), FieldValue::Text(id.to_string())),
                    ("seq".to_string(), FieldValue::Integer(i as i64)),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        create_router(AppState::new(Arc::new(Snapshot::from_records(records)), 2))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_get_all_results_respects_head_limit() {
        let (status, body) = get(test_app(&["a", "b", "c"]), "/get_all_results").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["user_id"], "a");
    }

    #[tokio::test]
    async fn test_search_without_user_id_is_bad_request() {
        let (status, body) = get(test_app(&["a"]), "/search_user_result").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, MISSING_USER_ID_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_search_unknown_user_is_not_found() {
        let (status, body) =
            get(test_app(&["a"]), "/search_user_result?user_id=doesnotexist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, USER_NOT_FOUND_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_search_returns_every_match() {
        let (status, body) =
            get(test_app(&["a", "b", "a"]), "/search_user_result?user_id=a").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let seqs: Vec<i64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_repeated_user_id_uses_first_value() {
        let app = test_app(&["a", "b", "a"]);
        let (status, body) =
            get(app.clone(), "/search_user_result?user_id=a&user_id=b").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["user_id"], "a");

        let (status, _) = get(app, "/search_user_result?user_id=zz&user_id=a").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_params_do_not_count_as_user_id() {
        let (status, body) = get(test_app(&["a"]), "/search_user_result?uid=a").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, MISSING_USER_ID_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_internal_error_is_json_500() {
        let resp = ApiError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "boom");
    }
}
