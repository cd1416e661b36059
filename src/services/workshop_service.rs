use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use crate::database::workshop_repo::{self, WorkshopWrite};
use crate::models::WorkshopRow;

#[derive(Debug, Error)]
pub enum WorkshopError {
    #[error("workshop not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorPayload {
    pub name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopPayload {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "short_description")]
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<InstructorPayload>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub enrolled: Option<i32>,
    pub status: Option<String>,
    pub image: Option<String>,
    pub equipment: Option<serde_json::Value>,
    pub requirements: Option<serde_json::Value>,
    pub agenda: Option<serde_json::Value>,
    pub tags: Option<serde_json::Value>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorView {
    pub name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub rating: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopView {
    pub id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub instructor: InstructorView,
    pub category: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub enrolled: i32,
    pub status: Option<String>,
    pub image: Option<String>,
    pub equipment: Option<serde_json::Value>,
    pub requirements: Option<serde_json::Value>,
    pub agenda: Option<serde_json::Value>,
    pub tags: Option<serde_json::Value>,
    pub level: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkshopView {
    pub fn from_row(row: WorkshopRow) -> WorkshopView {
        WorkshopView {
            id: row.id,
            title: row.title,
            short_description: row.short_description,
            description: row.description,
            instructor: InstructorView {
                name: row.instructor_name,
                title: row.instructor_title,
                bio: row.instructor_bio,
                image: row.instructor_image,
                rating: row.instructor_rating.unwrap_or(0.0),
            },
            category: row.category,
            date: row.date,
            time: row.time,
            duration: row.duration,
            schedule: row.schedule,
            location: row.location,
            capacity: row.capacity,
            enrolled: row.enrolled,
            status: row.status,
            image: row.image,
            equipment: row.equipment,
            requirements: row.requirements,
            agenda: row.agenda,
            tags: row.tags,
            level: row.level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn list(pool: &PgPool) -> sqlx::Result<Vec<WorkshopView>> {
    let rows = workshop_repo::list_workshops(pool).await?;
    Ok(rows.into_iter().map(WorkshopView::from_row).collect())
}

pub async fn get(pool: &PgPool, id: &str) -> Result<WorkshopView, WorkshopError> {
    let row = workshop_repo::find_by_id(pool, id)
        .await?
        .ok_or(WorkshopError::NotFound)?;
    Ok(WorkshopView::from_row(row))
}

pub async fn create(pool: &PgPool, body: WorkshopPayload) -> Result<WorkshopView, WorkshopError> {
    let id = body
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WorkshopError::Validation("id and title are required".to_string()))?
        .to_string();
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WorkshopError::Validation("id and title are required".to_string()))?
        .to_string();

    let instructor = body.instructor.unwrap_or_default();
    let write = WorkshopWrite {
        title,
        short_description: body.short_description,
        description: body.description,
        instructor_name: instructor.name,
        instructor_title: instructor.title,
        instructor_bio: instructor.bio,
        instructor_image: instructor.image,
        instructor_rating: instructor.rating,
        category: body.category,
        date: body.date,
        time: body.time,
        duration: body.duration,
        schedule: body.schedule,
        location: body.location,
        capacity: body.capacity,
        status: Some(body.status.unwrap_or_else(|| "draft".to_string())),
        image: body.image,
        equipment: body.equipment,
        requirements: body.requirements,
        agenda: body.agenda,
        tags: body.tags,
        level: body.level,
    };

    let row = workshop_repo::insert_workshop(pool, &id, &write).await?;
    Ok(WorkshopView::from_row(row))
}

/// Field-wise merge over the existing row: absent body fields keep
/// their stored values. `enrolled` is accepted here for admin
/// corrections; normal mutation goes through the enrollment engine.
pub async fn update(
    pool: &PgPool,
    id: &str,
    body: WorkshopPayload,
) -> Result<WorkshopView, WorkshopError> {
    let existing = workshop_repo::find_by_id(pool, id)
        .await?
        .ok_or(WorkshopError::NotFound)?;

    let instructor = body.instructor.unwrap_or_default();
    let write = WorkshopWrite {
        title: body.title.unwrap_or(existing.title),
        short_description: body.short_description.or(existing.short_description),
        description: body.description.or(existing.description),
        instructor_name: instructor.name.or(existing.instructor_name),
        instructor_title: instructor.title.or(existing.instructor_title),
        instructor_bio: instructor.bio.or(existing.instructor_bio),
        instructor_image: instructor.image.or(existing.instructor_image),
        instructor_rating: instructor.rating.or(existing.instructor_rating),
        category: body.category.or(existing.category),
        date: body.date.or(existing.date),
        time: body.time.or(existing.time),
        duration: body.duration.or(existing.duration),
        schedule: body.schedule.or(existing.schedule),
        location: body.location.or(existing.location),
        capacity: body.capacity.or(existing.capacity),
        status: body.status.or(existing.status),
        image: body.image.or(existing.image),
        equipment: body.equipment.or(existing.equipment),
        requirements: body.requirements.or(existing.requirements),
        agenda: body.agenda.or(existing.agenda),
        tags: body.tags.or(existing.tags),
        level: body.level.or(existing.level),
    };
    let enrolled = body.enrolled.unwrap_or(existing.enrolled);

    let updated = workshop_repo::update_workshop(pool, id, enrolled, &write)
        .await?
        .ok_or(WorkshopError::NotFound)?;
    Ok(WorkshopView::from_row(updated))
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<(), WorkshopError> {
    if workshop_repo::find_by_id(pool, id).await?.is_none() {
        return Err(WorkshopError::NotFound);
    }
    workshop_repo::delete_workshop(pool, id).await?;
    Ok(())
}
