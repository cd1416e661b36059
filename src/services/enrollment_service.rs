use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::enrollment_repo::{self, NewEnrollment};
use crate::database::{user_repo, workshop_repo};
use crate::models::{status_admits_enrollment, EnrollmentRow};
use crate::services::activity_service::{self, ActivityEvent};

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("workshop not found")]
    WorkshopNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("enrollment not found")]
    EnrollmentNotFound,
    #[error("this workshop is not accepting enrollments")]
    NotEnrollable,
    #[error("already enrolled in this workshop")]
    AlreadyEnrolled,
    #[error("concurrent enrollment limit of {limit} reached")]
    ConcurrencyLimit { limit: i64 },
    #[error("workshop is at full capacity")]
    CapacityExhausted,
    #[error("the one-time unenrollment has already been used")]
    UnenrollmentConsumed,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    pub id: Uuid,
    pub workshop_id: String,
    pub user_id: Uuid,
    pub email: String,
    pub student_name: Option<String>,
    pub carnet_number: Option<String>,
    pub payment_status: String,
    pub attended: bool,
    pub enrolled_at: DateTime<Utc>,
}

impl EnrollmentView {
    pub fn from_row(row: EnrollmentRow) -> EnrollmentView {
        EnrollmentView {
            id: row.id,
            workshop_id: row.workshop_id,
            user_id: row.user_id,
            email: row.user_email,
            student_name: row.student_full_name,
            carnet_number: row.carnet_number,
            payment_status: row.payment_status,
            attended: row.attended,
            enrolled_at: row.enrolled_at,
        }
    }
}

/// Enroll a student into a workshop.
///
/// Every check runs inside one transaction holding the workshop row
/// lock, so two concurrent attempts on the same workshop serialize and
/// the capacity test never acts on a stale counter.
pub async fn enroll(
    pool: &PgPool,
    user_id: Uuid,
    user_email: &str,
    workshop_id: &str,
    max_concurrent: i64,
) -> Result<EnrollmentRow, EnrollmentError> {
    let mut tx = pool.begin().await?;

    let Some(ws) = workshop_repo::lock_counters(&mut tx, workshop_id).await? else {
        return Err(EnrollmentError::WorkshopNotFound);
    };
    if !status_admits_enrollment(ws.status.as_deref()) {
        return Err(EnrollmentError::NotEnrollable);
    }
    if enrollment_repo::pair_exists(&mut tx, workshop_id, user_id).await? {
        return Err(EnrollmentError::AlreadyEnrolled);
    }
    let current = enrollment_repo::count_approved_for_user(&mut tx, user_id).await?;
    if current >= max_concurrent {
        return Err(EnrollmentError::ConcurrencyLimit {
            limit: max_concurrent,
        });
    }
    if let Some(capacity) = ws.capacity {
        if ws.enrolled >= capacity {
            return Err(EnrollmentError::CapacityExhausted);
        }
    }

    // Snapshot the student's profile onto the enrollment row. A missing
    // profile row falls back to the identity from the token.
    let snapshot = user_repo::load_snapshot_tx(&mut tx, user_id).await?;
    let email = snapshot
        .as_ref()
        .map(|s| s.email.as_str())
        .unwrap_or(user_email);
    let enrollment = enrollment_repo::insert_enrollment(
        &mut tx,
        NewEnrollment {
            workshop_id,
            user_id,
            user_email: email,
            student_full_name: snapshot.as_ref().and_then(|s| s.full_name.as_deref()),
            carnet_number: snapshot.as_ref().and_then(|s| s.carnet_number.as_deref()),
            payment_status: "approved",
        },
    )
    .await?;
    workshop_repo::increment_enrolled(&mut tx, workshop_id).await?;

    tx.commit().await?;

    activity_service::record(
        pool,
        ActivityEvent {
            actor_email: Some(enrollment.user_email.clone()),
            actor_id: Some(user_id.to_string()),
            event_type: activity_service::EVENT_WORKSHOP_ENROLL,
            payload: json!({
                "workshopId": workshop_id,
                "studentName": trimmed(enrollment.student_full_name.as_deref()),
            }),
        },
    );

    Ok(enrollment)
}

/// Self-service withdrawal, allowed exactly once per user across all
/// workshops.
///
/// Lock order is user, then workshop, then enrollment. Enroll takes the
/// workshop lock first but never touches the user row, so the two
/// transitions cannot deadlock.
pub async fn self_unenroll(
    pool: &PgPool,
    user_id: Uuid,
    user_email: &str,
    workshop_id: &str,
) -> Result<(), EnrollmentError> {
    let mut tx = pool.begin().await?;

    let Some(used) = user_repo::lock_unenrollment_flag(&mut tx, user_id).await? else {
        return Err(EnrollmentError::UserNotFound);
    };
    if used {
        return Err(EnrollmentError::UnenrollmentConsumed);
    }
    if workshop_repo::lock_counters(&mut tx, workshop_id).await?.is_none() {
        return Err(EnrollmentError::WorkshopNotFound);
    }
    let Some(enrollment_id) = enrollment_repo::lock_pair(&mut tx, workshop_id, user_id).await?
    else {
        return Err(EnrollmentError::EnrollmentNotFound);
    };

    enrollment_repo::delete_by_id(&mut tx, enrollment_id).await?;
    workshop_repo::decrement_enrolled(&mut tx, workshop_id).await?;
    user_repo::set_unenrollment_flag(&mut tx, user_id, true).await?;

    tx.commit().await?;

    let student_name = user_repo::full_name_by_id(pool, user_id)
        .await
        .ok()
        .flatten();
    activity_service::record(
        pool,
        ActivityEvent {
            actor_email: Some(user_email.to_string()),
            actor_id: Some(user_id.to_string()),
            event_type: activity_service::EVENT_WORKSHOP_UNENROLL,
            payload: json!({
                "workshopId": workshop_id,
                "studentName": trimmed(student_name.as_deref()),
            }),
        },
    );

    Ok(())
}

/// Admin-initiated removal. Same mechanics as [`self_unenroll`] but the
/// one-time policy is neither checked nor consumed, so correcting a
/// mistake does not cost the student their own withdrawal.
pub async fn admin_unenroll(
    pool: &PgPool,
    admin_email: Option<&str>,
    workshop_id: &str,
    user_id: Uuid,
) -> Result<(), EnrollmentError> {
    let mut tx = pool.begin().await?;

    if workshop_repo::lock_counters(&mut tx, workshop_id).await?.is_none() {
        return Err(EnrollmentError::WorkshopNotFound);
    }
    let Some(enrollment_id) = enrollment_repo::lock_pair(&mut tx, workshop_id, user_id).await?
    else {
        return Err(EnrollmentError::EnrollmentNotFound);
    };

    enrollment_repo::delete_by_id(&mut tx, enrollment_id).await?;
    workshop_repo::decrement_enrolled(&mut tx, workshop_id).await?;

    tx.commit().await?;

    activity_service::record(
        pool,
        ActivityEvent {
            actor_email: admin_email.map(|e| e.to_string()),
            actor_id: None,
            event_type: activity_service::EVENT_WORKSHOP_ADMIN_UNENROLL,
            payload: json!({
                "workshopId": workshop_id,
                "userId": user_id.to_string(),
            }),
        },
    );

    Ok(())
}

pub enum ForceUnenrollTarget<'a> {
    UserId(Uuid),
    Email(&'a str),
}

/// Maintenance variant of [`admin_unenroll`]: resolves the user by
/// email when needed and can reset the one-time unenrollment flag —
/// the only path that ever un-sets it.
pub async fn force_unenroll(
    pool: &PgPool,
    target: ForceUnenrollTarget<'_>,
    workshop_id: &str,
    reset_unenrollment_flag: bool,
) -> Result<Uuid, EnrollmentError> {
    let mut tx = pool.begin().await?;

    let user_id = match target {
        ForceUnenrollTarget::UserId(id) => id,
        ForceUnenrollTarget::Email(email) => user_repo::find_id_by_email(&mut tx, email)
            .await?
            .ok_or(EnrollmentError::UserNotFound)?,
    };

    if workshop_repo::lock_counters(&mut tx, workshop_id).await?.is_none() {
        return Err(EnrollmentError::WorkshopNotFound);
    }
    let Some(enrollment_id) = enrollment_repo::lock_pair(&mut tx, workshop_id, user_id).await?
    else {
        return Err(EnrollmentError::EnrollmentNotFound);
    };

    enrollment_repo::delete_by_id(&mut tx, enrollment_id).await?;
    workshop_repo::decrement_enrolled(&mut tx, workshop_id).await?;
    if reset_unenrollment_flag {
        user_repo::set_unenrollment_flag(&mut tx, user_id, false).await?;
    }

    tx.commit().await?;
    Ok(user_id)
}

pub async fn my_enrollment(
    pool: &PgPool,
    workshop_id: &str,
    user_id: Uuid,
) -> sqlx::Result<Option<EnrollmentRow>> {
    enrollment_repo::find_for_pair(pool, workshop_id, user_id).await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSummaryView {
    pub count: usize,
    pub workshop_ids: Vec<String>,
    pub max_concurrent_enrollments: i64,
}

/// Approved workshop ids for the current user plus the configured
/// limit, so the frontend can show remaining slots.
pub async fn my_summary(
    pool: &PgPool,
    user_id: Uuid,
    max_concurrent: i64,
) -> sqlx::Result<EnrollmentSummaryView> {
    let workshop_ids = enrollment_repo::approved_workshop_ids_for_user(pool, user_id).await?;
    Ok(EnrollmentSummaryView {
        count: workshop_ids.len(),
        workshop_ids,
        max_concurrent_enrollments: max_concurrent,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentListView {
    pub workshop_id: String,
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub data: Vec<EnrollmentView>,
}

pub async fn list_for_workshop(
    pool: &PgPool,
    workshop_id: &str,
    status: Option<&str>,
    search: Option<&str>,
) -> sqlx::Result<EnrollmentListView> {
    let search_like = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));
    let rows =
        enrollment_repo::list_for_workshop(pool, workshop_id, status, search_like.as_deref())
            .await?;
    let stats = enrollment_repo::stats_for_workshop(pool, workshop_id).await?;
    Ok(EnrollmentListView {
        workshop_id: workshop_id.to_string(),
        total: stats.total,
        approved: stats.approved,
        pending: stats.pending,
        data: rows.into_iter().map(EnrollmentView::from_row).collect(),
    })
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::trimmed;

    #[test]
    fn trimmed_drops_blank_names() {
        assert_eq!(trimmed(None), None);
        assert_eq!(trimmed(Some("")), None);
        assert_eq!(trimmed(Some("   ")), None);
        assert_eq!(trimmed(Some(" Ana María ")), Some("Ana María".to_string()));
    }
}
