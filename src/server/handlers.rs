//! HTTP API handlers
//!
//! Every load or parse failure is reported to the client as a structured
//! error body; none of them takes the server down.

use super::AppState;
use crate::analysis::build_dashboard;
use crate::models::ReviewDashboard;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

pub const NO_FOLDER_MESSAGE: &str =
    "No review folder specified. Provide ?dir=/path/to/xml-folder or set --data-dir.";

/// Query string for `GET /api/reviews`
#[derive(Debug, Default)]
pub struct ReviewsQuery {
    pub dir: Option<String>,
}

impl ReviewsQuery {
    /// Build from decoded query pairs; a repeated `dir` keeps its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let dir = pairs
            .into_iter()
            .find(|(key, _)| key == "dir")
            .map(|(_, value)| value);
        Self { dir }
    }
}

#[derive(Debug, Serialize)]
struct ApiSuccess<T> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiError {
    ok: bool,
    error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn no_store(status: StatusCode, body: impl IntoResponse) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], body).into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    no_store(
        status,
        Json(ApiError {
            ok: false,
            error: message.into(),
        }),
    )
}

/// Make a requested folder absolute against the working directory.
///
/// Canonicalizes when the folder exists; otherwise the joined path is kept
/// so the not-found error names what the client asked for.
fn resolve_folder(folder: &Path) -> PathBuf {
    let absolute = if folder.is_absolute() {
        folder.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(folder))
            .unwrap_or_else(|_| folder.to_path_buf())
    };

    std::fs::canonicalize(&absolute).unwrap_or(absolute)
}

/// Pick the folder for a request: the trimmed `dir` parameter, or the default.
fn requested_folder(query: &ReviewsQuery, default: Option<&Path>) -> Option<PathBuf> {
    let requested = query.dir.as_deref().map(str::trim).unwrap_or("");
    if requested.is_empty() {
        default.map(Path::to_path_buf)
    } else {
        Some(PathBuf::from(requested))
    }
}

/// GET /api/reviews?dir=<folder>
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = ReviewsQuery::from_pairs(pairs);
    let Some(folder) = requested_folder(&query, state.default_data_dir.as_deref()) else {
        return error_response(StatusCode::BAD_REQUEST, NO_FOLDER_MESSAGE);
    };
    let folder = resolve_folder(&folder);

    let result = tokio::task::spawn_blocking(move || build_dashboard(&folder)).await;

    match result {
        Ok(Ok(mut dashboard)) => {
            if state.redact_confidential {
                dashboard.redact_confidential();
            }
            no_store(
                StatusCode::OK,
                Json(ApiSuccess::<ReviewDashboard> {
                    ok: true,
                    data: dashboard,
                }),
            )
        }
        Ok(Err(e)) => {
            warn!("Review request failed: {}", e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            error!(?e, "review aggregation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
