use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::warn;

use crate::services::activity_service;

#[derive(Debug, Deserialize, Default)]
pub struct ListActivitiesQuery {
    pub limit: Option<i64>,
    pub all: Option<String>,
    /// Window in minutes; defaults to the last 24 hours.
    pub since: Option<i32>,
}

pub async fn list_activities_handler(
    Query(query): Query<ListActivitiesQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let all = matches!(query.all.as_deref(), Some("true") | Some("1"));

    match activity_service::list_recent(&pool, all, query.since, limit).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => {
            warn!("error listing activities: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "error listing activities" })),
            )
                .into_response()
        }
    }
}
