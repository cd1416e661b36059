use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkshopRow {
    pub id: String,
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

/// The subset of a workshop read under `FOR UPDATE` by the enrollment
/// transitions. Holding the row lock until commit is what serializes
/// concurrent enroll/unenroll attempts on the same workshop.
#[derive(Debug, sqlx::FromRow)]
pub struct WorkshopCountersRow {
    pub id: String,
    pub capacity: Option<i32>,
    pub enrolled: i32,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkshopStatus {
    Draft,
    Published,
    Active,
    /// Admin-defined statuses pass through untouched; none of them
    /// admit enrollments.
    Other(String),
}

impl WorkshopStatus {
    pub fn parse(raw: &str) -> WorkshopStatus {
        match raw.trim().to_lowercase().as_str() {
            "draft" => WorkshopStatus::Draft,
            "published" => WorkshopStatus::Published,
            "active" => WorkshopStatus::Active,
            _ => WorkshopStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn is_enrollable(&self) -> bool {
        matches!(self, WorkshopStatus::Published | WorkshopStatus::Active)
    }
}

/// A missing status is treated as enrollable; only an explicit
/// non-enrollable status closes a workshop.
pub fn status_admits_enrollment(status: Option<&str>) -> bool {
    match status {
        None => true,
        Some(s) if s.trim().is_empty() => true,
        Some(s) => WorkshopStatus::parse(s).is_enrollable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_and_active_admit_enrollment() {
        assert!(status_admits_enrollment(Some("published")));
        assert!(status_admits_enrollment(Some("Active")));
        assert!(status_admits_enrollment(Some("  ACTIVE ")));
    }

    #[test]
    fn draft_and_custom_statuses_do_not() {
        assert!(!status_admits_enrollment(Some("draft")));
        assert!(!status_admits_enrollment(Some("archived")));
        assert!(!status_admits_enrollment(Some("cancelled")));
    }

    #[test]
    fn missing_status_is_enrollable() {
        assert!(status_admits_enrollment(None));
        assert!(status_admits_enrollment(Some("")));
        assert!(status_admits_enrollment(Some("   ")));
    }

    #[test]
    fn custom_status_preserves_raw_value() {
        match WorkshopStatus::parse(" sold-out ") {
            WorkshopStatus::Other(s) => assert_eq!(s, "sold-out"),
            other => panic!("expected Other, got {other:?}"),
        }
    }
}
