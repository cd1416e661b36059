use sqlx::PgPool;

use crate::models::DepositRow;

const SQL_INSERT_DEPOSIT: &str = r#"
INSERT INTO deposits (
  user_id, bank_id, bank_name, bank_account_number, bank_account_holder, bank_color,
  document_number, full_name, email,
  file_name, file_size, file_mime, file_path,
  amount, reference_number, carnet_number, status, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW())
RETURNING *
"#;

const SQL_FIND_BY_ID: &str = r#"
SELECT * FROM deposits WHERE id = $1
"#;

// Resubmission resets the decision; the fresh row goes back through
// review.
const SQL_UPDATE_RESUBMIT: &str = r#"
UPDATE deposits SET
  bank_id = $1, bank_name = $2, bank_account_number = $3, bank_account_holder = $4, bank_color = $5,
  document_number = $6, full_name = $7,
  file_name = $8, file_size = $9, file_mime = $10, file_path = $11,
  carnet_number = $12, status = 'review'
WHERE id = $13
RETURNING *
"#;

const SQL_SET_REVIEW: &str = r#"
UPDATE deposits SET status = $1, reviewed_by = $2, review_notes = $3, review_date = NOW()
WHERE id = $4
RETURNING *
"#;

const SQL_SOFT_DELETE_BY_OWNER: &str = r#"
UPDATE deposits SET is_deleted = TRUE, owner_deleted = TRUE, deleted_at = NOW() WHERE id = $1
"#;

const SQL_SOFT_DELETE_BY_ADMIN: &str = r#"
UPDATE deposits SET is_deleted = TRUE, deleted_at = NOW() WHERE id = $1
"#;

const SQL_HARD_DELETE: &str = r#"
DELETE FROM deposits WHERE id = $1
"#;

const SQL_LATEST_NON_DELETED_BY_EMAIL: &str = r#"
SELECT * FROM deposits
WHERE lower(email) = lower($1) AND is_deleted = FALSE
ORDER BY created_at DESC
LIMIT 1
"#;

const SQL_LATEST_REVIEWED_BY_EMAIL: &str = r#"
SELECT * FROM deposits
WHERE lower(email) = lower($1) AND lower(status) IN ('approved', 'rejected')
ORDER BY COALESCE(review_date, created_at) DESC
LIMIT 1
"#;

// Carnet coalesced from users so the admin listing shows it even when
// the deposit row was created without one.
const SQL_LIST_ADMIN: &str = r#"
SELECT
  d.id, d.user_id, d.bank_id, d.bank_name, d.bank_account_number, d.bank_account_holder,
  d.bank_color, d.document_number, d.full_name, d.email,
  d.file_name, d.file_size, d.file_mime, d.file_path,
  d.amount, d.reference_number,
  COALESCE(d.carnet_number, u.carnet_number) AS carnet_number,
  d.status, d.reviewed_by, d.review_notes, d.review_date,
  d.is_deleted, d.owner_deleted, d.deleted_at, d.created_at
FROM deposits d
LEFT JOIN users u ON lower(d.email) = lower(u.email)
WHERE d.is_deleted = FALSE
  AND ($1::text IS NULL OR d.status = $1)
  AND ($2::text IS NULL
       OR lower(d.full_name) LIKE $2
       OR lower(d.email) LIKE $2
       OR lower(d.reference_number) LIKE $2
       OR d.carnet_number LIKE $2)
ORDER BY d.created_at DESC
LIMIT $3 OFFSET $4
"#;

const SQL_COUNT_PENDING: &str = r#"
SELECT COUNT(*) FROM deposits
WHERE is_deleted = FALSE
  AND reviewed_by IS NULL AND review_date IS NULL
  AND lower(trim(status)) IN ('review', 'pending')
"#;

pub struct NewDepositRecord<'a> {
    pub user_id: Option<&'a str>,
    pub bank_id: Option<&'a str>,
    pub bank_name: Option<&'a str>,
    pub bank_account_number: Option<&'a str>,
    pub bank_account_holder: Option<&'a str>,
    pub bank_color: Option<&'a str>,
    pub document_number: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub file_name: Option<&'a str>,
    pub file_size: Option<i64>,
    pub file_mime: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub amount: Option<f64>,
    pub reference_number: Option<&'a str>,
    pub carnet_number: Option<&'a str>,
    pub status: &'a str,
}

pub struct DepositResubmit<'a> {
    pub bank_id: Option<&'a str>,
    pub bank_name: Option<&'a str>,
    pub bank_account_number: Option<&'a str>,
    pub bank_account_holder: Option<&'a str>,
    pub bank_color: Option<&'a str>,
    pub document_number: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub file_name: Option<&'a str>,
    pub file_size: Option<i64>,
    pub file_mime: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub carnet_number: Option<&'a str>,
}

pub async fn insert_deposit(
    pool: &PgPool,
    new: NewDepositRecord<'_>,
) -> sqlx::Result<DepositRow> {
    sqlx::query_as::<_, DepositRow>(SQL_INSERT_DEPOSIT)
        .bind(new.user_id)
        .bind(new.bank_id)
        .bind(new.bank_name)
        .bind(new.bank_account_number)
        .bind(new.bank_account_holder)
        .bind(new.bank_color)
        .bind(new.document_number)
        .bind(new.full_name)
        .bind(new.email)
        .bind(new.file_name)
        .bind(new.file_size)
        .bind(new.file_mime)
        .bind(new.file_path)
        .bind(new.amount)
        .bind(new.reference_number)
        .bind(new.carnet_number)
        .bind(new.status)
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> sqlx::Result<Option<DepositRow>> {
    sqlx::query_as::<_, DepositRow>(SQL_FIND_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_resubmit(
    pool: &PgPool,
    id: i64,
    upd: DepositResubmit<'_>,
) -> sqlx::Result<Option<DepositRow>> {
    sqlx::query_as::<_, DepositRow>(SQL_UPDATE_RESUBMIT)
        .bind(upd.bank_id)
        .bind(upd.bank_name)
        .bind(upd.bank_account_number)
        .bind(upd.bank_account_holder)
        .bind(upd.bank_color)
        .bind(upd.document_number)
        .bind(upd.full_name)
        .bind(upd.file_name)
        .bind(upd.file_size)
        .bind(upd.file_mime)
        .bind(upd.file_path)
        .bind(upd.carnet_number)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn set_review(
    pool: &PgPool,
    id: i64,
    status: &str,
    reviewed_by: Option<&str>,
    review_notes: Option<&str>,
) -> sqlx::Result<Option<DepositRow>> {
    sqlx::query_as::<_, DepositRow>(SQL_SET_REVIEW)
        .bind(status)
        .bind(reviewed_by)
        .bind(review_notes)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn soft_delete_by_owner(pool: &PgPool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SOFT_DELETE_BY_OWNER)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn soft_delete_by_admin(pool: &PgPool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SOFT_DELETE_BY_ADMIN)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn hard_delete(pool: &PgPool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_HARD_DELETE).bind(id).execute(pool).await?;
    Ok(res.rows_affected())
}

pub async fn latest_non_deleted_by_email(
    pool: &PgPool,
    email: &str,
) -> sqlx::Result<Option<DepositRow>> {
    sqlx::query_as::<_, DepositRow>(SQL_LATEST_NON_DELETED_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn latest_reviewed_by_email(
    pool: &PgPool,
    email: &str,
) -> sqlx::Result<Option<DepositRow>> {
    sqlx::query_as::<_, DepositRow>(SQL_LATEST_REVIEWED_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn list_admin(
    pool: &PgPool,
    status: Option<&str>,
    search_like: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<DepositRow>> {
    sqlx::query_as::<_, DepositRow>(SQL_LIST_ADMIN)
        .bind(status)
        .bind(search_like)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_pending(pool: &PgPool) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(SQL_COUNT_PENDING).fetch_one(pool).await?;
    Ok(count)
}
