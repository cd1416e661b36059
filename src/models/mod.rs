pub mod activity_logs;
pub mod deposits;
pub mod enrollments;
pub mod users;
pub mod workshops;

pub use activity_logs::ActivityLogRow;
pub use deposits::{DepositRow, DepositStatus, ReviewAction};
pub use enrollments::{EnrollmentRow, EnrollmentStatsRow};
pub use users::UserSnapshotRow;
pub use workshops::{status_admits_enrollment, WorkshopCountersRow, WorkshopRow, WorkshopStatus};
