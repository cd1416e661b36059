use sqlx::{PgConnection, PgPool};

use crate::models::{WorkshopCountersRow, WorkshopRow};

const SQL_LIST_WORKSHOPS: &str = r#"
SELECT * FROM workshops ORDER BY created_at DESC
"#;

const SQL_GET_WORKSHOP: &str = r#"
SELECT * FROM workshops WHERE id = $1
"#;

// The enrollment engine reads counters through this lock; capacity is
// only ever checked while the lock is held.
const SQL_LOCK_WORKSHOP_COUNTERS: &str = r#"
SELECT id, capacity, enrolled, status
FROM workshops
WHERE id = $1
FOR UPDATE
"#;

const SQL_INCREMENT_ENROLLED: &str = r#"
UPDATE workshops SET enrolled = enrolled + 1, updated_at = NOW() WHERE id = $1
"#;

const SQL_DECREMENT_ENROLLED: &str = r#"
UPDATE workshops SET enrolled = GREATEST(enrolled - 1, 0), updated_at = NOW() WHERE id = $1
"#;

const SQL_INSERT_WORKSHOP: &str = r#"
INSERT INTO workshops (
  id, title, short_description, description,
  instructor_name, instructor_title, instructor_bio, instructor_image, instructor_rating,
  category, date, time, duration, schedule, location,
  capacity, enrolled, status, image,
  equipment, requirements, agenda, tags, level,
  created_at, updated_at
) VALUES (
  $1, $2, $3, $4,
  $5, $6, $7, $8, $9,
  $10, $11, $12, $13, $14, $15,
  $16, 0, $17, $18,
  $19, $20, $21, $22, $23,
  NOW(), NOW()
)
RETURNING *
"#;

const SQL_UPDATE_WORKSHOP: &str = r#"
UPDATE workshops SET
  title = $1, short_description = $2, description = $3,
  instructor_name = $4, instructor_title = $5, instructor_bio = $6,
  instructor_image = $7, instructor_rating = $8,
  category = $9, date = $10, time = $11, duration = $12, schedule = $13, location = $14,
  capacity = $15, enrolled = $16, status = $17, image = $18,
  equipment = $19, requirements = $20, agenda = $21, tags = $22, level = $23,
  updated_at = NOW()
WHERE id = $24
RETURNING *
"#;

const SQL_DELETE_WORKSHOP: &str = r#"
DELETE FROM workshops WHERE id = $1
"#;

/// Column values for an insert or a full-row update.
pub struct WorkshopWrite {
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub instructor_name: Option<String>,
    pub instructor_title: Option<String>,
    pub instructor_bio: Option<String>,
    pub instructor_image: Option<String>,
    pub instructor_rating: Option<f64>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub status: Option<String>,
    pub image: Option<String>,
    pub equipment: Option<serde_json::Value>,
    pub requirements: Option<serde_json::Value>,
    pub agenda: Option<serde_json::Value>,
    pub tags: Option<serde_json::Value>,
    pub level: Option<String>,
}

pub async fn list_workshops(pool: &PgPool) -> sqlx::Result<Vec<WorkshopRow>> {
    sqlx::query_as::<_, WorkshopRow>(SQL_LIST_WORKSHOPS)
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> sqlx::Result<Option<WorkshopRow>> {
    sqlx::query_as::<_, WorkshopRow>(SQL_GET_WORKSHOP)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn lock_counters(
    conn: &mut PgConnection,
    id: &str,
) -> sqlx::Result<Option<WorkshopCountersRow>> {
    sqlx::query_as::<_, WorkshopCountersRow>(SQL_LOCK_WORKSHOP_COUNTERS)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn increment_enrolled(conn: &mut PgConnection, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INCREMENT_ENROLLED).bind(id).execute(conn).await?;
    Ok(res.rows_affected())
}

/// Decrement clamped at zero to tolerate counter drift in old data.
pub async fn decrement_enrolled(conn: &mut PgConnection, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DECREMENT_ENROLLED).bind(id).execute(conn).await?;
    Ok(res.rows_affected())
}

pub async fn insert_workshop(
    pool: &PgPool,
    id: &str,
    w: &WorkshopWrite,
) -> sqlx::Result<WorkshopRow> {
    sqlx::query_as::<_, WorkshopRow>(SQL_INSERT_WORKSHOP)
        .bind(id)
        .bind(&w.title)
        .bind(&w.short_description)
        .bind(&w.description)
        .bind(&w.instructor_name)
        .bind(&w.instructor_title)
        .bind(&w.instructor_bio)
        .bind(&w.instructor_image)
        .bind(w.instructor_rating)
        .bind(&w.category)
        .bind(&w.date)
        .bind(&w.time)
        .bind(&w.duration)
        .bind(&w.schedule)
        .bind(&w.location)
        .bind(w.capacity)
        .bind(&w.status)
        .bind(&w.image)
        .bind(&w.equipment)
        .bind(&w.requirements)
        .bind(&w.agenda)
        .bind(&w.tags)
        .bind(&w.level)
        .fetch_one(pool)
        .await
}

pub async fn update_workshop(
    pool: &PgPool,
    id: &str,
    enrolled: i32,
    w: &WorkshopWrite,
) -> sqlx::Result<Option<WorkshopRow>> {
    sqlx::query_as::<_, WorkshopRow>(SQL_UPDATE_WORKSHOP)
        .bind(&w.title)
        .bind(&w.short_description)
        .bind(&w.description)
        .bind(&w.instructor_name)
        .bind(&w.instructor_title)
        .bind(&w.instructor_bio)
        .bind(&w.instructor_image)
        .bind(w.instructor_rating)
        .bind(&w.category)
        .bind(&w.date)
        .bind(&w.time)
        .bind(&w.duration)
        .bind(&w.schedule)
        .bind(&w.location)
        .bind(w.capacity)
        .bind(enrolled)
        .bind(&w.status)
        .bind(&w.image)
        .bind(&w.equipment)
        .bind(&w.requirements)
        .bind(&w.agenda)
        .bind(&w.tags)
        .bind(&w.level)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_workshop(pool: &PgPool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_WORKSHOP).bind(id).execute(pool).await?;
    Ok(res.rows_affected())
}

const SQL_COUNT_ACTIVE_WORKSHOPS: &str = r#"
SELECT COUNT(*) FROM workshops WHERE lower(trim(status)) IN ('published', 'active')
"#;

pub async fn count_active(pool: &PgPool) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(SQL_COUNT_ACTIVE_WORKSHOPS)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
