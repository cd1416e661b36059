use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use sqlx::PgPool;
use tracing::warn;

use crate::config;
use crate::services::admin_service;

pub async fn dashboard_stats_handler(State(pool): State<PgPool>) -> impl IntoResponse {
    let max_concurrent = config::max_concurrent_enrollments();
    match admin_service::dashboard_stats(&pool, max_concurrent).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            warn!("error getting admin dashboard stats: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "error getting statistics" })),
            )
                .into_response()
        }
    }
}
