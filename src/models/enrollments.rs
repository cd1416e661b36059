use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrollmentRow {
    pub id: Uuid,
    pub workshop_id: String,
    pub user_id: Uuid,
    pub user_email: String,
    pub student_full_name: Option<String>,
    pub carnet_number: Option<String>,
    pub payment_status: String,
    pub attended: bool,
    pub enrolled_at: DateTime<Utc>,
}

/// Per-workshop counters shown next to the admin enrollment listing.
#[derive(Debug, sqlx::FromRow)]
pub struct EnrollmentStatsRow {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
}
