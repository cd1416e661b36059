use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::warn;

use crate::services::workshop_service::{self, WorkshopError, WorkshopPayload};
use crate::web::middleware::auth::require_admin_identity;

fn error_response(context: &str, err: WorkshopError) -> (StatusCode, Json<Value>) {
    match err {
        WorkshopError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "workshop not found" })),
        ),
        WorkshopError::Validation(message) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "message": message })))
        }
        WorkshopError::Db(e) => {
            warn!("{}: {}", context, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "internal error" })),
            )
        }
    }
}

pub async fn list_workshops_handler(State(pool): State<PgPool>) -> impl IntoResponse {
    match workshop_service::list(&pool).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => {
            warn!("error listing workshops: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "error listing workshops" })),
            )
                .into_response()
        }
    }
}

pub async fn get_workshop_handler(
    Path(id): Path<String>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    match workshop_service::get(&pool, &id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response("error getting workshop", e).into_response(),
    }
}

// Create, update and delete are admin-only. They share their paths
// with the public list/get methods, so the role check runs here
// instead of in a router layer.
pub async fn create_workshop_handler(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Json(body): Json<WorkshopPayload>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin_identity(&headers) {
        return denied;
    }
    match workshop_service::create(&pool, body).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => error_response("error creating workshop", e).into_response(),
    }
}

pub async fn update_workshop_handler(
    Path(id): Path<String>,
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Json(body): Json<WorkshopPayload>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin_identity(&headers) {
        return denied;
    }
    match workshop_service::update(&pool, &id, body).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response("error updating workshop", e).into_response(),
    }
}

pub async fn delete_workshop_handler(
    Path(id): Path<String>,
    State(pool): State<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(denied) = require_admin_identity(&headers) {
        return denied;
    }
    match workshop_service::delete(&pool, &id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("error deleting workshop", e).into_response(),
    }
}
