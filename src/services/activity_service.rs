use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::database::activity_log_repo::{self, NewActivityLog};
use crate::models::ActivityLogRow;

pub const EVENT_WORKSHOP_ENROLL: &str = "workshop.enroll";
pub const EVENT_WORKSHOP_UNENROLL: &str = "workshop.unenroll";
pub const EVENT_WORKSHOP_ADMIN_UNENROLL: &str = "workshop.admin_unenroll";
pub const EVENT_DEPOSIT_CREATED: &str = "deposit_created";
pub const EVENT_DEPOSIT_APPROVED: &str = "deposit_approved";
pub const EVENT_DEPOSIT_REJECTED: &str = "deposit_rejected";

pub struct ActivityEvent {
    pub actor_email: Option<String>,
    pub actor_id: Option<String>,
    pub event_type: &'static str,
    pub payload: serde_json::Value,
}

/// Fire-and-forget sink for the state machines. Must only be called
/// after the primary transaction has committed; the write runs on its
/// own task and a failure is logged, never surfaced to the caller.
pub fn record(pool: &PgPool, event: ActivityEvent) {
    let pool = pool.clone();
    tokio::spawn(async move {
        let res = activity_log_repo::insert_activity(
            &pool,
            NewActivityLog {
                actor_email: event.actor_email.as_deref(),
                actor_id: event.actor_id.as_deref(),
                event_type: event.event_type,
                payload: Some(&event.payload),
            },
        )
        .await;
        if let Err(e) = res {
            tracing::warn!("activity log write failed for {}: {}", event.event_type, e);
        }
    });
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: i64,
    pub actor_email: Option<String>,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ActivityView {
    fn from_row(row: ActivityLogRow) -> ActivityView {
        ActivityView {
            id: row.id,
            actor_email: row.actor_email,
            actor_id: row.actor_id,
            actor_name: row.actor_name,
            event_type: row.event_type,
            payload: row.payload,
            created_at: row.created_at,
        }
    }
}

/// Recent activity feed. `all` drops the time filter; otherwise the
/// window defaults to the last 24 hours.
pub async fn list_recent(
    pool: &PgPool,
    all: bool,
    since_minutes: Option<i32>,
    limit: i64,
) -> sqlx::Result<Vec<ActivityView>> {
    let window = if all {
        None
    } else {
        Some(since_minutes.unwrap_or(24 * 60))
    };
    let rows = activity_log_repo::list_recent(pool, window, limit).await?;
    Ok(rows.into_iter().map(ActivityView::from_row).collect())
}
