use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub String);

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline status of a claim. Statuses are plain strings so that a
/// reconfigured stage table can introduce new ones without a code change.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClaimStatus(pub String);

impl ClaimStatus {
    pub const SUBMITTED: &'static str = "submitted";
    pub const VERIFIED: &'static str = "verified";
    pub const MANAGER_APPROVED: &'static str = "manager_approved";
    pub const ADMIN_APPROVED: &'static str = "admin_approved";
    pub const CRO_APPROVED: &'static str = "cro_approved";
    pub const CFO_APPROVED: &'static str = "cfo_approved";
    pub const PAID: &'static str = "paid";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClaimStatus {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<ClaimStatus> for String {
    fn from(status: ClaimStatus) -> Self {
        status.0
    }
}

impl From<&str> for ClaimStatus {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Normal,
    SalesPromotion,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SalesPromotion => "sales_promotion",
        }
    }
}

impl std::str::FromStr for ClaimType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "sales_promotion" => Ok(Self::SalesPromotion),
            other => Err(format!("unknown claim type `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub claim_number: String,
    pub employee_email: String,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub current_approver_role: Option<String>,
    pub total_amount: Decimal,
    /// Bumped by every routing write; the store compares it before applying a patch.
    pub routing_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    pub fn submitted(
        id: impl Into<String>,
        claim_number: impl Into<String>,
        employee_email: impl Into<String>,
        claim_type: ClaimType,
        total_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ClaimId(id.into()),
            claim_number: claim_number.into(),
            employee_email: employee_email.into(),
            claim_type,
            status: ClaimStatus::new(ClaimStatus::SUBMITTED),
            current_approver_role: None,
            total_amount,
            routing_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: &RoutingPatch) {
        self.status = patch.status.clone();
        if let Some(role) = &patch.current_approver_role {
            self.current_approver_role = Some(role.clone());
        }
        self.routing_version += 1;
        self.updated_at = Utc::now();
    }
}

/// The only fields the workflow is allowed to change on a claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPatch {
    pub status: ClaimStatus,
    pub current_approver_role: Option<String>,
}
