use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DepositRow {
    pub id: i64,
    pub user_id: Option<String>,
    pub bank_id: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_holder: Option<String>,
    pub bank_color: Option<String>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_mime: Option<String>,
    pub file_path: Option<String>,
    pub amount: Option<f64>,
    pub reference_number: Option<String>,
    pub carnet_number: Option<String>,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub review_date: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub owner_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositStatus {
    Review,
    Approved,
    Rejected,
}

impl DepositStatus {
    pub fn parse(raw: &str) -> Option<DepositStatus> {
        match raw.trim().to_lowercase().as_str() {
            "review" => Some(DepositStatus::Review),
            "approved" => Some(DepositStatus::Approved),
            "rejected" => Some(DepositStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DepositStatus::Review => "review",
            DepositStatus::Approved => "approved",
            DepositStatus::Rejected => "rejected",
        }
    }

    /// A decision has been made; deletions must keep the record around
    /// for the audit trail.
    pub fn is_reviewed(self) -> bool {
        matches!(self, DepositStatus::Approved | DepositStatus::Rejected)
    }
}

impl DepositRow {
    pub fn parsed_status(&self) -> Option<DepositStatus> {
        DepositStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn parse(raw: &str) -> Option<ReviewAction> {
        match raw.trim() {
            "approve" => Some(ReviewAction::Approve),
            "reject" => Some(ReviewAction::Reject),
            _ => None,
        }
    }

    pub fn resulting_status(self) -> DepositStatus {
        match self {
            ReviewAction::Approve => DepositStatus::Approved,
            ReviewAction::Reject => DepositStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in [
            DepositStatus::Review,
            DepositStatus::Approved,
            DepositStatus::Rejected,
        ] {
            assert_eq!(DepositStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(DepositStatus::parse("APPROVED"), Some(DepositStatus::Approved));
        assert_eq!(DepositStatus::parse("pending"), None);
    }

    #[test]
    fn only_reviewed_statuses_count_as_decided() {
        assert!(!DepositStatus::Review.is_reviewed());
        assert!(DepositStatus::Approved.is_reviewed());
        assert!(DepositStatus::Rejected.is_reviewed());
    }

    #[test]
    fn review_action_parses_strictly() {
        assert_eq!(ReviewAction::parse("approve"), Some(ReviewAction::Approve));
        assert_eq!(ReviewAction::parse(" reject "), Some(ReviewAction::Reject));
        assert_eq!(ReviewAction::parse("approved"), None);
        assert_eq!(ReviewAction::parse(""), None);
    }
}
