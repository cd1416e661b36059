use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::UserSnapshotRow;

const SQL_LOAD_SNAPSHOT: &str = r#"
SELECT email, full_name, carnet_number FROM users WHERE id = $1
"#;

const SQL_LOAD_SNAPSHOT_BY_EMAIL: &str = r#"
SELECT email, full_name, carnet_number FROM users WHERE lower(email) = lower($1) LIMIT 1
"#;

const SQL_FIND_ID_BY_EMAIL: &str = r#"
SELECT id FROM users WHERE lower(email) = lower($1) LIMIT 1
"#;

// Serializes concurrent attempts to consume the one-time unenrollment
// policy: the flag is read under lock and flipped in the same
// transaction.
const SQL_LOCK_UNENROLLMENT_FLAG: &str = r#"
SELECT has_used_unenrollment FROM users WHERE id = $1 FOR UPDATE
"#;

const SQL_SET_UNENROLLMENT_FLAG: &str = r#"
UPDATE users SET has_used_unenrollment = $2 WHERE id = $1
"#;

const SQL_CARNET_BY_EMAIL: &str = r#"
SELECT carnet_number FROM users WHERE lower(email) = lower($1) LIMIT 1
"#;

const SQL_FULL_NAME_BY_ID: &str = r#"
SELECT full_name FROM users WHERE id = $1
"#;

const SQL_COUNT_STUDENTS: &str = r#"
SELECT COUNT(*) FROM users WHERE lower(trim(role)) IN ('user', 'student')
"#;

const SQL_COUNT_NEW_STUDENTS_THIS_MONTH: &str = r#"
SELECT COUNT(*) FROM users
WHERE lower(trim(role)) IN ('user', 'student')
  AND date_trunc('month', created_at) = date_trunc('month', NOW())
"#;

pub async fn load_snapshot(
    pool: &PgPool,
    user_id: Uuid,
) -> sqlx::Result<Option<UserSnapshotRow>> {
    sqlx::query_as::<_, UserSnapshotRow>(SQL_LOAD_SNAPSHOT)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn load_snapshot_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> sqlx::Result<Option<UserSnapshotRow>> {
    sqlx::query_as::<_, UserSnapshotRow>(SQL_LOAD_SNAPSHOT)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn load_snapshot_by_email(
    pool: &PgPool,
    email: &str,
) -> sqlx::Result<Option<UserSnapshotRow>> {
    sqlx::query_as::<_, UserSnapshotRow>(SQL_LOAD_SNAPSHOT_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_id_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> sqlx::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as(SQL_FIND_ID_BY_EMAIL)
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn lock_unenrollment_flag(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> sqlx::Result<Option<bool>> {
    let row: Option<(bool,)> = sqlx::query_as(SQL_LOCK_UNENROLLMENT_FLAG)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(used,)| used))
}

pub async fn set_unenrollment_flag(
    conn: &mut PgConnection,
    user_id: Uuid,
    used: bool,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_UNENROLLMENT_FLAG)
        .bind(user_id)
        .bind(used)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn carnet_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<String>> {
    let row: Option<(Option<String>,)> = sqlx::query_as(SQL_CARNET_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|(carnet,)| carnet))
}

pub async fn full_name_by_id(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Option<String>> {
    let row: Option<(Option<String>,)> = sqlx::query_as(SQL_FULL_NAME_BY_ID)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|(name,)| name))
}

pub async fn count_students(pool: &PgPool) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(SQL_COUNT_STUDENTS).fetch_one(pool).await?;
    Ok(count)
}

pub async fn count_new_students_this_month(pool: &PgPool) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(SQL_COUNT_NEW_STUDENTS_THIS_MONTH)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
