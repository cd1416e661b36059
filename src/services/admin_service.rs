use serde::Serialize;
use sqlx::PgPool;

use crate::database::{deposit_repo, user_repo, workshop_repo};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: i64,
    pub active_workshops: i64,
    pub pending_deposits: i64,
    pub new_students_this_month: i64,
    pub max_concurrent_enrollments: i64,
}

pub async fn dashboard_stats(pool: &PgPool, max_concurrent: i64) -> sqlx::Result<DashboardStats> {
    let (total_students, active_workshops, pending_deposits, new_students_this_month) = tokio::try_join!(
        user_repo::count_students(pool),
        workshop_repo::count_active(pool),
        deposit_repo::count_pending(pool),
        user_repo::count_new_students_this_month(pool),
    )?;

    Ok(DashboardStats {
        total_students,
        active_workshops,
        pending_deposits,
        new_students_this_month,
        max_concurrent_enrollments: max_concurrent,
    })
}
