use sqlx::PgPool;

use crate::models::ActivityLogRow;

const SQL_INSERT_ACTIVITY: &str = r#"
INSERT INTO activity_logs (actor_email, actor_id, type, payload, created_at)
VALUES ($1, $2, $3, $4, NOW())
"#;

// Window is optional: NULL means no time filter (the `all` listing).
const SQL_LIST_RECENT: &str = r#"
SELECT
  al.id, al.actor_email, al.actor_id, u.full_name AS actor_name,
  al.type, al.payload, al.created_at
FROM activity_logs al
LEFT JOIN users u ON u.id::text = al.actor_id
WHERE ($1::int IS NULL OR al.created_at >= NOW() - make_interval(mins => $1))
ORDER BY al.created_at DESC
LIMIT $2
"#;

pub struct NewActivityLog<'a> {
    pub actor_email: Option<&'a str>,
    pub actor_id: Option<&'a str>,
    pub event_type: &'a str,
    pub payload: Option<&'a serde_json::Value>,
}

pub async fn insert_activity(pool: &PgPool, new: NewActivityLog<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_ACTIVITY)
        .bind(new.actor_email)
        .bind(new.actor_id)
        .bind(new.event_type)
        .bind(new.payload)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_recent(
    pool: &PgPool,
    since_minutes: Option<i32>,
    limit: i64,
) -> sqlx::Result<Vec<ActivityLogRow>> {
    sqlx::query_as::<_, ActivityLogRow>(SQL_LIST_RECENT)
        .bind(since_minutes)
        .bind(limit)
        .fetch_all(pool)
        .await
}
