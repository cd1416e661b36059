/// Profile fields snapshotted onto enrollments and deposits at write
/// time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSnapshotRow {
    pub email: String,
    pub full_name: Option<String>,
    pub carnet_number: Option<String>,
}
