use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{EnrollmentRow, EnrollmentStatsRow};

const SQL_INSERT_ENROLLMENT: &str = r#"
INSERT INTO workshop_enrollments (
  workshop_id, user_id, user_email, student_full_name, carnet_number, payment_status
) VALUES ($1, $2, $3, $4, $5, $6)
RETURNING *
"#;

const SQL_PAIR_EXISTS: &str = r#"
SELECT 1 FROM workshop_enrollments WHERE workshop_id = $1 AND user_id = $2
"#;

const SQL_LOCK_PAIR: &str = r#"
SELECT id FROM workshop_enrollments WHERE workshop_id = $1 AND user_id = $2 FOR UPDATE
"#;

const SQL_FIND_FOR_PAIR: &str = r#"
SELECT * FROM workshop_enrollments WHERE workshop_id = $1 AND user_id = $2 LIMIT 1
"#;

const SQL_DELETE_BY_ID: &str = r#"
DELETE FROM workshop_enrollments WHERE id = $1
"#;

const SQL_COUNT_APPROVED_FOR_USER: &str = r#"
SELECT COUNT(*) FROM workshop_enrollments
WHERE user_id = $1 AND payment_status = 'approved'
"#;

const SQL_APPROVED_WORKSHOP_IDS_FOR_USER: &str = r#"
SELECT workshop_id FROM workshop_enrollments
WHERE user_id = $1 AND payment_status = 'approved'
ORDER BY enrolled_at DESC
"#;

const SQL_LIST_FOR_WORKSHOP: &str = r#"
SELECT * FROM workshop_enrollments
WHERE workshop_id = $1
  AND ($2::text IS NULL OR payment_status = $2)
  AND ($3::text IS NULL
       OR lower(student_full_name) LIKE $3
       OR lower(user_email) LIKE $3
       OR carnet_number LIKE $3)
ORDER BY enrolled_at DESC
"#;

const SQL_STATS_FOR_WORKSHOP: &str = r#"
SELECT
  COUNT(*) AS total,
  COUNT(*) FILTER (WHERE payment_status = 'approved') AS approved,
  COUNT(*) FILTER (WHERE payment_status = 'pending') AS pending
FROM workshop_enrollments
WHERE workshop_id = $1
"#;

pub struct NewEnrollment<'a> {
    pub workshop_id: &'a str,
    pub user_id: Uuid,
    pub user_email: &'a str,
    pub student_full_name: Option<&'a str>,
    pub carnet_number: Option<&'a str>,
    pub payment_status: &'a str,
}

pub async fn insert_enrollment(
    conn: &mut PgConnection,
    new: NewEnrollment<'_>,
) -> sqlx::Result<EnrollmentRow> {
    sqlx::query_as::<_, EnrollmentRow>(SQL_INSERT_ENROLLMENT)
        .bind(new.workshop_id)
        .bind(new.user_id)
        .bind(new.user_email)
        .bind(new.student_full_name)
        .bind(new.carnet_number)
        .bind(new.payment_status)
        .fetch_one(conn)
        .await
}

pub async fn pair_exists(
    conn: &mut PgConnection,
    workshop_id: &str,
    user_id: Uuid,
) -> sqlx::Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(SQL_PAIR_EXISTS)
        .bind(workshop_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

pub async fn lock_pair(
    conn: &mut PgConnection,
    workshop_id: &str,
    user_id: Uuid,
) -> sqlx::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as(SQL_LOCK_PAIR)
        .bind(workshop_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn find_for_pair(
    pool: &PgPool,
    workshop_id: &str,
    user_id: Uuid,
) -> sqlx::Result<Option<EnrollmentRow>> {
    sqlx::query_as::<_, EnrollmentRow>(SQL_FIND_FOR_PAIR)
        .bind(workshop_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_by_id(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_BY_ID).bind(id).execute(conn).await?;
    Ok(res.rows_affected())
}

pub async fn count_approved_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(SQL_COUNT_APPROVED_FOR_USER)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn approved_workshop_ids_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(SQL_APPROVED_WORKSHOP_IDS_FOR_USER)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Admin listing. `search` is matched (lowercased, `%`-wrapped by the
/// caller) against name, email and carnet.
pub async fn list_for_workshop(
    pool: &PgPool,
    workshop_id: &str,
    status: Option<&str>,
    search_like: Option<&str>,
) -> sqlx::Result<Vec<EnrollmentRow>> {
    sqlx::query_as::<_, EnrollmentRow>(SQL_LIST_FOR_WORKSHOP)
        .bind(workshop_id)
        .bind(status)
        .bind(search_like)
        .fetch_all(pool)
        .await
}

pub async fn stats_for_workshop(
    pool: &PgPool,
    workshop_id: &str,
) -> sqlx::Result<EnrollmentStatsRow> {
    sqlx::query_as::<_, EnrollmentStatsRow>(SQL_STATS_FOR_WORKSHOP)
        .bind(workshop_id)
        .fetch_one(pool)
        .await
}
