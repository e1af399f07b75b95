use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Two-step approval state shared by leaves, allowances, LTC claims and
/// travel expenditures.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Parses a stored status column; unknown values are treated as decided.
    pub fn from_column(value: &str) -> Option<Self> {
        value.parse().ok()
    }

    pub fn is_pending(self) -> bool {
        self == ApprovalStatus::Pending
    }
}

/// Returns true when a stored status column is `pending`.
pub fn is_pending(status: &str) -> bool {
    ApprovalStatus::from_column(status).is_some_and(ApprovalStatus::is_pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_detection() {
        assert!(is_pending("pending"));
        assert!(!is_pending("approved"));
        assert!(!is_pending("Pending"));
        assert!(!is_pending(""));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(ApprovalStatus::Rejected.as_ref(), "rejected");
        assert_eq!(
            serde_json::to_string(&ApprovalStatus::Approved).unwrap(),
            "\"approved\""
        );
    }
}
