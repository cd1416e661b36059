use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::deposit_repo::{self, DepositResubmit, NewDepositRecord};
use crate::database::user_repo;
use crate::models::{DepositRow, DepositStatus, ReviewAction};
use crate::services::activity_service::{self, ActivityEvent};

#[derive(Debug, Error)]
pub enum DepositError {
    #[error("deposit not found")]
    NotFound,
    #[error("not authorized for this deposit")]
    Forbidden,
    #[error("action must be approve or reject")]
    InvalidAction,
    #[error("an approved deposit cannot be deleted")]
    CannotDeleteApproved,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Caller identity as the routes see it; submission is allowed without
/// one when the body carries the identifying fields itself.
#[derive(Debug, Clone, Copy)]
pub struct DepositCaller<'a> {
    pub id: Option<&'a str>,
    pub email: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositSubmission {
    #[serde(alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(alias = "bank_id")]
    pub bank_id: Option<String>,
    #[serde(alias = "bank_name")]
    pub bank_name: Option<String>,
    #[serde(alias = "bank_account_number")]
    pub bank_account_number: Option<String>,
    #[serde(alias = "bank_account_holder")]
    pub bank_account_holder: Option<String>,
    #[serde(alias = "bank_color")]
    pub bank_color: Option<String>,
    #[serde(alias = "document_number")]
    pub document_number: Option<String>,
    #[serde(alias = "full_name")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "carnet_number")]
    pub carnet_number: Option<String>,
    #[serde(alias = "file_name")]
    pub file_name: Option<String>,
    #[serde(alias = "file_size")]
    pub file_size: Option<i64>,
    #[serde(alias = "file_mime")]
    pub file_mime: Option<String>,
    #[serde(alias = "file_path")]
    pub file_path: Option<String>,
    pub amount: Option<f64>,
    #[serde(alias = "reference_number")]
    pub reference_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositView {
    pub id: i64,
    pub user_id: Option<String>,
    pub bank_id: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_holder: Option<String>,
    pub bank_color: Option<String>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_mime: Option<String>,
    pub file_path: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub amount: Option<f64>,
    pub reference_number: Option<String>,
    pub carnet_number: Option<String>,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub review_date: Option<DateTime<Utc>>,
    // Older frontend builds read the rejection reason under this name.
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl DepositView {
    pub fn from_row(row: DepositRow) -> DepositView {
        let file_url = row.file_name.as_deref().map(|f| format!("/uploads/{f}"));
        DepositView {
            id: row.id,
            user_id: row.user_id,
            bank_id: row.bank_id,
            bank_name: row.bank_name,
            bank_account_number: row.bank_account_number,
            bank_account_holder: row.bank_account_holder,
            bank_color: row.bank_color,
            document_number: row.document_number,
            full_name: row.full_name,
            email: row.email,
            file_name: row.file_name,
            file_size: row.file_size,
            file_mime: row.file_mime,
            file_path: row.file_path,
            status: row.status,
            created_at: row.created_at,
            amount: row.amount,
            reference_number: row.reference_number,
            carnet_number: row.carnet_number,
            reviewed_by: row.reviewed_by,
            rejection_reason: row.review_notes.clone(),
            review_notes: row.review_notes,
            review_date: row.review_date,
            file_url,
        }
    }
}

/// Create a deposit in review state. Identifying fields missing from
/// the body are filled from the caller's profile when authenticated.
pub async fn submit(
    pool: &PgPool,
    caller: Option<DepositCaller<'_>>,
    mut body: DepositSubmission,
) -> Result<DepositRow, DepositError> {
    if let Some(c) = caller {
        enrich_from_profile(pool, c, &mut body).await;
    }

    let user_id = caller
        .and_then(|c| c.id.map(str::to_string).or(c.email.map(str::to_string)))
        .or_else(|| body.user_id.clone())
        .or_else(|| body.email.clone());

    if missing_required_fields(&body) {
        let message = if caller.is_none() {
            "authentication required or incomplete data: log in so your profile can be used, or include fullName, email and documentNumber"
        } else {
            "bankId, documentNumber, fullName and email are required"
        };
        return Err(DepositError::Validation(message.to_string()));
    }

    let row = deposit_repo::insert_deposit(
        pool,
        NewDepositRecord {
            user_id: user_id.as_deref(),
            bank_id: body.bank_id.as_deref(),
            bank_name: body.bank_name.as_deref(),
            bank_account_number: body.bank_account_number.as_deref(),
            bank_account_holder: body.bank_account_holder.as_deref(),
            bank_color: body.bank_color.as_deref(),
            document_number: body.document_number.as_deref(),
            full_name: body.full_name.as_deref(),
            email: body.email.as_deref(),
            file_name: body.file_name.as_deref(),
            file_size: body.file_size,
            file_mime: body.file_mime.as_deref(),
            file_path: body.file_path.as_deref(),
            amount: body.amount,
            reference_number: body.reference_number.as_deref(),
            carnet_number: body.carnet_number.as_deref(),
            status: DepositStatus::Review.as_str(),
        },
    )
    .await?;

    activity_service::record(
        pool,
        ActivityEvent {
            actor_email: caller
                .and_then(|c| c.email.map(str::to_string))
                .or_else(|| row.email.clone()),
            actor_id: caller.and_then(|c| c.id.map(str::to_string)),
            event_type: activity_service::EVENT_DEPOSIT_CREATED,
            payload: json!({
                "depositId": row.id,
                "fullName": row.full_name,
                "email": row.email,
            }),
        },
    );

    Ok(row)
}

/// Latest deposit standing for a student, by email.
///
/// Prefers the most recent non-deleted row. Without one, falls back to
/// the most recent reviewed decision — unless the owner deleted it,
/// in which case non-admin callers see nothing while admins still get
/// the historical record.
pub async fn current_status(
    pool: &PgPool,
    caller_email: Option<&str>,
    is_admin: bool,
    email: &str,
) -> Result<Option<DepositRow>, DepositError> {
    if !is_admin {
        match caller_email {
            Some(ce) if ce.eq_ignore_ascii_case(email) => {}
            _ => return Err(DepositError::Forbidden),
        }
    }

    if let Some(row) = deposit_repo::latest_non_deleted_by_email(pool, email).await? {
        return Ok(Some(row));
    }

    let reviewed = deposit_repo::latest_reviewed_by_email(pool, email).await?;
    match reviewed {
        Some(row) if row.owner_deleted && !is_admin => Ok(None),
        other => Ok(other),
    }
}

pub async fn get_by_id(
    pool: &PgPool,
    caller_email: Option<&str>,
    is_admin: bool,
    id: i64,
) -> Result<DepositRow, DepositError> {
    let Some(mut row) = deposit_repo::find_by_id(pool, id).await? else {
        return Err(DepositError::NotFound);
    };
    if !is_admin && !owns(caller_email, row.email.as_deref()) {
        return Err(DepositError::Forbidden);
    }

    // Enrich the carnet from the profile when the deposit was created
    // without one. Non-fatal.
    if row.carnet_number.as_deref().map_or(true, |c| c.trim().is_empty()) {
        if let Some(email) = row.email.clone() {
            match user_repo::carnet_by_email(pool, &email).await {
                Ok(Some(carnet)) => row.carnet_number = Some(carnet),
                Ok(None) => {}
                Err(e) => tracing::warn!("could not enrich deposit {} with carnet: {}", id, e),
            }
        }
    }

    Ok(row)
}

pub async fn list_admin(
    pool: &PgPool,
    status: Option<&str>,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<DepositRow>> {
    let search_like = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));
    deposit_repo::list_admin(pool, status, search_like.as_deref(), limit, offset).await
}

/// Owner or admin resubmission. Always resets the status to review:
/// new evidence requires a fresh decision, whatever the prior state.
pub async fn update(
    pool: &PgPool,
    caller: DepositCaller<'_>,
    is_admin: bool,
    id: i64,
    mut body: DepositSubmission,
) -> Result<DepositRow, DepositError> {
    let Some(existing) = deposit_repo::find_by_id(pool, id).await? else {
        return Err(DepositError::NotFound);
    };
    if !is_admin && !owns(caller.email, existing.email.as_deref()) {
        return Err(DepositError::Forbidden);
    }

    enrich_from_profile(pool, caller, &mut body).await;

    let updated = deposit_repo::update_resubmit(
        pool,
        id,
        DepositResubmit {
            bank_id: body.bank_id.as_deref(),
            bank_name: body.bank_name.as_deref(),
            bank_account_number: body.bank_account_number.as_deref(),
            bank_account_holder: body.bank_account_holder.as_deref(),
            bank_color: body.bank_color.as_deref(),
            document_number: body.document_number.as_deref(),
            full_name: body.full_name.as_deref(),
            file_name: body.file_name.as_deref(),
            file_size: body.file_size,
            file_mime: body.file_mime.as_deref(),
            file_path: body.file_path.as_deref(),
            carnet_number: body.carnet_number.as_deref(),
        },
    )
    .await?;

    updated.ok_or(DepositError::NotFound)
}

/// Admin decision. Re-reviewing an already-decided deposit overwrites
/// the previous reviewer, notes and date.
pub async fn review(
    pool: &PgPool,
    admin_id: Option<&str>,
    admin_email: Option<&str>,
    id: i64,
    action: &str,
    notes: Option<&str>,
    reason: Option<&str>,
    reviewed_by: Option<&str>,
) -> Result<DepositRow, DepositError> {
    let Some(action) = ReviewAction::parse(action) else {
        return Err(DepositError::InvalidAction);
    };
    let status = action.resulting_status();
    let review_notes = resolve_review_notes(notes, reason);
    let reviewer = reviewed_by.or(admin_email);

    let Some(row) =
        deposit_repo::set_review(pool, id, status.as_str(), reviewer, review_notes).await?
    else {
        return Err(DepositError::NotFound);
    };

    let event_type = match action {
        ReviewAction::Approve => activity_service::EVENT_DEPOSIT_APPROVED,
        ReviewAction::Reject => activity_service::EVENT_DEPOSIT_REJECTED,
    };
    activity_service::record(
        pool,
        ActivityEvent {
            actor_email: admin_email.map(str::to_string),
            actor_id: admin_id.map(str::to_string),
            event_type,
            payload: json!({
                "depositId": row.id,
                "fullName": row.full_name,
                "email": row.email,
                "notes": review_notes,
            }),
        },
    );

    Ok(row)
}

/// Deletion rules:
/// - owner, approved deposit: refused — approved evidence stays in the
///   audit trail;
/// - owner, anything else: soft delete with `owner_deleted`, so the
///   student's status view resets while admins keep the record;
/// - admin, reviewed deposit: soft delete (`owner_deleted` stays false,
///   the decision remains visible to the student);
/// - admin, still in review: hard delete.
///
/// Stored evidence files are removed best-effort whenever the owner
/// resets or the row is physically deleted.
pub async fn delete(
    pool: &PgPool,
    caller_email: Option<&str>,
    is_admin: bool,
    id: i64,
) -> Result<(), DepositError> {
    let Some(row) = deposit_repo::find_by_id(pool, id).await? else {
        return Err(DepositError::NotFound);
    };

    if !is_admin {
        if !owns(caller_email, row.email.as_deref()) {
            return Err(DepositError::Forbidden);
        }
        if row.parsed_status() == Some(DepositStatus::Approved) {
            return Err(DepositError::CannotDeleteApproved);
        }
        remove_evidence_file(row.file_path.as_deref()).await;
        deposit_repo::soft_delete_by_owner(pool, id).await?;
        return Ok(());
    }

    if row.parsed_status().map_or(false, DepositStatus::is_reviewed) {
        deposit_repo::soft_delete_by_admin(pool, id).await?;
    } else {
        remove_evidence_file(row.file_path.as_deref()).await;
        deposit_repo::hard_delete(pool, id).await?;
    }
    Ok(())
}

fn owns(caller_email: Option<&str>, row_email: Option<&str>) -> bool {
    match (caller_email, row_email) {
        (Some(caller), Some(owner)) => caller.eq_ignore_ascii_case(owner),
        _ => false,
    }
}

/// Explicit notes win over the quick-template reason.
fn resolve_review_notes<'a>(notes: Option<&'a str>, reason: Option<&'a str>) -> Option<&'a str> {
    notes
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| reason.map(str::trim).filter(|s| !s.is_empty()))
}

fn missing_required_fields(body: &DepositSubmission) -> bool {
    fn blank(v: &Option<String>) -> bool {
        v.as_deref().map_or(true, |s| s.trim().is_empty())
    }
    blank(&body.bank_id)
        || blank(&body.document_number)
        || blank(&body.full_name)
        || blank(&body.email)
}

async fn enrich_from_profile(pool: &PgPool, caller: DepositCaller<'_>, body: &mut DepositSubmission) {
    let snapshot = if let Some(user_id) = caller.id.and_then(|id| Uuid::parse_str(id).ok()) {
        user_repo::load_snapshot(pool, user_id).await
    } else if let Some(email) = caller.email {
        user_repo::load_snapshot_by_email(pool, email).await
    } else {
        return;
    };

    match snapshot {
        Ok(Some(profile)) => {
            if body.full_name.is_none() {
                body.full_name = profile.full_name;
            }
            if body.email.is_none() {
                body.email = Some(profile.email);
            }
            if body.carnet_number.is_none() {
                body.carnet_number = profile.carnet_number;
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("could not enrich deposit from user profile: {}", e),
    }
}

async fn remove_evidence_file(path: Option<&str>) {
    let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("could not remove uploaded file {}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_notes_take_precedence_over_reason() {
        assert_eq!(
            resolve_review_notes(Some("illegible receipt"), Some("template")),
            Some("illegible receipt")
        );
        assert_eq!(resolve_review_notes(None, Some("template")), Some("template"));
        assert_eq!(resolve_review_notes(Some("  "), Some("template")), Some("template"));
        assert_eq!(resolve_review_notes(None, None), None);
    }

    #[test]
    fn submission_requires_identifying_fields() {
        let mut body = DepositSubmission {
            bank_id: Some("b1".into()),
            document_number: Some("123".into()),
            full_name: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            ..Default::default()
        };
        assert!(!missing_required_fields(&body));

        body.document_number = Some("  ".into());
        assert!(missing_required_fields(&body));

        body.document_number = None;
        assert!(missing_required_fields(&body));
    }

    #[test]
    fn ownership_is_case_insensitive() {
        assert!(owns(Some("Ana@Example.com"), Some("ana@example.com")));
        assert!(!owns(Some("ana@example.com"), Some("other@example.com")));
        assert!(!owns(None, Some("ana@example.com")));
        assert!(!owns(Some("ana@example.com"), None));
    }
}
