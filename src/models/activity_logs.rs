use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityLogRow {
    pub id: i64,
    pub actor_email: Option<String>,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
