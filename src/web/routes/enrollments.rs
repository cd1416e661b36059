use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::config;
use crate::services::enrollment_service::{self, EnrollmentError, EnrollmentView};
use crate::web::middleware::auth::AuthenticatedUser;

fn error_response(context: &str, err: EnrollmentError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        EnrollmentError::WorkshopNotFound
        | EnrollmentError::UserNotFound
        | EnrollmentError::EnrollmentNotFound => StatusCode::NOT_FOUND,
        EnrollmentError::AlreadyEnrolled => StatusCode::CONFLICT,
        EnrollmentError::NotEnrollable
        | EnrollmentError::ConcurrencyLimit { .. }
        | EnrollmentError::CapacityExhausted => StatusCode::BAD_REQUEST,
        EnrollmentError::UnenrollmentConsumed => StatusCode::FORBIDDEN,
        EnrollmentError::Db(e) => {
            warn!("{}: {}", context, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "internal error" })),
            );
        }
    };
    (status, Json(json!({ "message": err.to_string() })))
}

fn unauthenticated() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "not authenticated" })),
    )
}

pub async fn enroll_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(workshop_id): Path<String>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    let Some(user_id) = auth_user.user_id() else {
        return unauthenticated().into_response();
    };
    let limit = config::max_concurrent_enrollments();
    let email = auth_user.email.as_deref().unwrap_or_default();

    match enrollment_service::enroll(&pool, user_id, email, &workshop_id, limit).await {
        Ok(row) => (
            StatusCode::CREATED,
            Json(json!({ "enrollment": EnrollmentView::from_row(row) })),
        )
            .into_response(),
        Err(e) => error_response("error enrolling in workshop", e).into_response(),
    }
}

pub async fn my_enrollment_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(workshop_id): Path<String>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    let Some(user_id) = auth_user.user_id() else {
        return unauthenticated().into_response();
    };
    match enrollment_service::my_enrollment(&pool, &workshop_id, user_id).await {
        Ok(Some(row)) => Json(json!({
            "enrolled": true,
            "enrollment": EnrollmentView::from_row(row),
        }))
        .into_response(),
        Ok(None) => Json(json!({ "enrolled": false })).into_response(),
        Err(e) => {
            warn!("error getting enrollment: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "internal error" })),
            )
                .into_response()
        }
    }
}

pub async fn self_unenroll_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(workshop_id): Path<String>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    let Some(user_id) = auth_user.user_id() else {
        return unauthenticated().into_response();
    };
    let email = auth_user.email.as_deref().unwrap_or_default();

    match enrollment_service::self_unenroll(&pool, user_id, email, &workshop_id).await {
        Ok(()) => Json(json!({
            "message": "unenrollment completed; this action can only be done once"
        }))
        .into_response(),
        Err(e) => error_response("error unenrolling from workshop", e).into_response(),
    }
}

pub async fn admin_unenroll_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path((workshop_id, user_id)): Path<(String, Uuid)>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    match enrollment_service::admin_unenroll(
        &pool,
        auth_user.email.as_deref(),
        &workshop_id,
        user_id,
    )
    .await
    {
        Ok(()) => Json(json!({ "message": "enrollment removed" })).into_response(),
        Err(e) => error_response("error removing enrollment", e).into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListEnrollmentsQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

pub async fn list_enrollments_handler(
    Path(workshop_id): Path<String>,
    Query(query): Query<ListEnrollmentsQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    match enrollment_service::list_for_workshop(
        &pool,
        &workshop_id,
        query.status.as_deref(),
        query.search.as_deref(),
    )
    .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            warn!("error listing enrollments: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "error listing enrollments" })),
            )
                .into_response()
        }
    }
}

pub async fn my_summary_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    let Some(user_id) = auth_user.user_id() else {
        return unauthenticated().into_response();
    };
    let limit = config::max_concurrent_enrollments();
    match enrollment_service::my_summary(&pool, user_id, limit).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            warn!("error getting enrollments summary: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "error getting enrollments" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses_follow_the_taxonomy() {
        let cases = [
            (EnrollmentError::WorkshopNotFound, StatusCode::NOT_FOUND),
            (EnrollmentError::EnrollmentNotFound, StatusCode::NOT_FOUND),
            (EnrollmentError::AlreadyEnrolled, StatusCode::CONFLICT),
            (EnrollmentError::NotEnrollable, StatusCode::BAD_REQUEST),
            (
                EnrollmentError::ConcurrencyLimit { limit: 1 },
                StatusCode::BAD_REQUEST,
            ),
            (EnrollmentError::CapacityExhausted, StatusCode::BAD_REQUEST),
            (EnrollmentError::UnenrollmentConsumed, StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            let (status, _) = error_response("test", err);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn database_errors_surface_as_server_errors() {
        let (status, _) = error_response("test", EnrollmentError::Db(sqlx::Error::PoolClosed));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
