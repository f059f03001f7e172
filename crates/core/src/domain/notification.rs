use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::claim::ClaimId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PendingApproval,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_email: String,
    pub claim_id: ClaimId,
    pub claim_number: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn pending_approval(
        recipient_email: impl Into<String>,
        claim_id: ClaimId,
        claim_number: impl Into<String>,
        approver_role: &str,
        message: impl Into<String>,
    ) -> Self {
        let claim_number = claim_number.into();
        Self {
            id: Uuid::new_v4().to_string(),
            recipient_email: recipient_email.into(),
            claim_id,
            title: format!("Claim {claim_number} is awaiting your approval ({approver_role})"),
            claim_number,
            kind: NotificationKind::PendingApproval,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
