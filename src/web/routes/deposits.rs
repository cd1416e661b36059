use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::warn;

use crate::services::deposit_service::{
    self, DepositCaller, DepositError, DepositSubmission, DepositView,
};
use crate::web::middleware::auth::{identity_from_headers, AuthenticatedUser};

fn error_response(context: &str, err: DepositError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        DepositError::NotFound => StatusCode::NOT_FOUND,
        DepositError::Forbidden => StatusCode::FORBIDDEN,
        DepositError::InvalidAction
        | DepositError::CannotDeleteApproved
        | DepositError::Validation(_) => StatusCode::BAD_REQUEST,
        DepositError::Db(e) => {
            warn!("{}: {}", context, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "internal error" })),
            );
        }
    };
    (status, Json(json!({ "message": err.to_string() })))
}

/// Submission works with or without a session: an authenticated caller
/// gets missing fields filled from their profile, an anonymous one must
/// send them.
pub async fn create_deposit_handler(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Json(body): Json<DepositSubmission>,
) -> impl IntoResponse {
    let identity = identity_from_headers(&headers);
    let caller = identity.as_ref().map(|u| DepositCaller {
        id: Some(u.id.as_str()),
        email: u.email.as_deref(),
    });

    match deposit_service::submit(&pool, caller, body).await {
        Ok(row) => (StatusCode::CREATED, Json(DepositView::from_row(row))).into_response(),
        Err(e) => error_response("error creating deposit", e).into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct StatusQuery {
    pub email: Option<String>,
}

pub async fn deposit_status_handler(
    Query(query): Query<StatusQuery>,
    State(pool): State<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // This path shares its route with the public submission endpoint,
    // so authentication is checked here rather than by the router
    // layer.
    let Some(auth_user) = identity_from_headers(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "not authenticated" })),
        )
            .into_response();
    };
    let Some(email) = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "email is required as a query param" })),
        )
            .into_response();
    };

    match deposit_service::current_status(
        &pool,
        auth_user.email.as_deref(),
        auth_user.is_admin(),
        email,
    )
    .await
    {
        Ok(row) => Json(row.map(DepositView::from_row)).into_response(),
        Err(e) => error_response("error querying deposits", e).into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListDepositsQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_deposits_handler(
    Query(query): Query<ListDepositsQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    match deposit_service::list_admin(
        &pool,
        query.status.as_deref(),
        query.q.as_deref(),
        limit,
        offset,
    )
    .await
    {
        Ok(rows) => Json(
            rows.into_iter()
                .map(DepositView::from_row)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => {
            warn!("error listing deposits: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "error listing deposits" })),
            )
                .into_response()
        }
    }
}

pub async fn get_deposit_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    match deposit_service::get_by_id(&pool, auth_user.email.as_deref(), auth_user.is_admin(), id)
        .await
    {
        Ok(row) => Json(DepositView::from_row(row)).into_response(),
        Err(e) => error_response("error getting deposit", e).into_response(),
    }
}

pub async fn update_deposit_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    State(pool): State<PgPool>,
    Json(body): Json<DepositSubmission>,
) -> impl IntoResponse {
    let caller = DepositCaller {
        id: Some(auth_user.id.as_str()),
        email: auth_user.email.as_deref(),
    };
    match deposit_service::update(&pool, caller, auth_user.is_admin(), id, body).await {
        Ok(row) => Json(DepositView::from_row(row)).into_response(),
        Err(e) => error_response("error updating deposit", e).into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub action: Option<String>,
    #[serde(alias = "reviewed_by")]
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
    pub reason: Option<String>,
}

pub async fn review_deposit_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    State(pool): State<PgPool>,
    Json(body): Json<ReviewBody>,
) -> impl IntoResponse {
    match deposit_service::review(
        &pool,
        Some(auth_user.id.as_str()),
        auth_user.email.as_deref(),
        id,
        body.action.as_deref().unwrap_or_default(),
        body.notes.as_deref(),
        body.reason.as_deref(),
        body.reviewed_by.as_deref(),
    )
    .await
    {
        Ok(row) => Json(DepositView::from_row(row)).into_response(),
        Err(e) => error_response("error reviewing deposit", e).into_response(),
    }
}

pub async fn delete_deposit_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    match deposit_service::delete(&pool, auth_user.email.as_deref(), auth_user.is_admin(), id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("error deleting deposit", e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses_follow_the_taxonomy() {
        let cases = [
            (DepositError::NotFound, StatusCode::NOT_FOUND),
            (DepositError::Forbidden, StatusCode::FORBIDDEN),
            (DepositError::InvalidAction, StatusCode::BAD_REQUEST),
            (DepositError::CannotDeleteApproved, StatusCode::BAD_REQUEST),
            (
                DepositError::Validation("missing".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            let (status, _) = error_response("test", err);
            assert_eq!(status, expected);
        }
    }
}
