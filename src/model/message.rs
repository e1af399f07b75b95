use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Message {
    pub id: u64,
    pub sender_id: u64,
    pub recipient_id: u64,
    pub subject: String,
    pub body: String,
    /// Message this one replies to
    #[schema(nullable = true)]
    pub parent_id: Option<u64>,
    pub is_read: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub const TABLE: &'static str = "messages";
    pub const COLUMNS: &'static str =
        "id, sender_id, recipient_id, subject, body, parent_id, is_read, created_at";

    pub fn involves(&self, employee_id: u64) -> bool {
        self.sender_id == employee_id || self.recipient_id == employee_id
    }

    pub fn reply_subject(&self) -> String {
        if self.subject.starts_with("Re: ") {
            self.subject.clone()
        } else {
            format!("Re: {}", self.subject)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(subject: &str) -> Message {
        Message {
            id: 1,
            sender_id: 10,
            recipient_id: 20,
            subject: subject.to_string(),
            body: "hello".to_string(),
            parent_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reply_subject_is_not_stacked() {
        assert_eq!(message("Payslip").reply_subject(), "Re: Payslip");
        assert_eq!(message("Re: Payslip").reply_subject(), "Re: Payslip");
    }

    #[test]
    fn involves_both_parties_only() {
        let msg = message("x");
        assert!(msg.involves(10));
        assert!(msg.involves(20));
        assert!(!msg.involves(30));
    }
}
