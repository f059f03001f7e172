use serde::{Deserialize, Serialize};

use crate::domain::claim::{ClaimId, ClaimStatus, ClaimType};
use crate::domain::employee::roles;

/// A bulk-imported claim that arrived with an approval decision made outside
/// the portal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAdmission {
    pub claim_id: ClaimId,
    pub admitted_by: String,
    pub admitted_by_role: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastPath {
    pub status: ClaimStatus,
    pub approver_role: String,
    pub rationale: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    AutoApproved {
        #[serde(rename = "claim_status")]
        status: ClaimStatus,
        approver_role: String,
        rationale: String,
    },
    NotEligible { reason: String },
}

/// Where an externally approved claim jumps to, if anywhere.
pub fn fast_path(claim_type: ClaimType, admitted_by_role: &str) -> Option<FastPath> {
    let admitter = admitted_by_role.trim().to_ascii_lowercase();
    match claim_type {
        ClaimType::Normal => Some(FastPath {
            status: ClaimStatus::new(ClaimStatus::CFO_APPROVED),
            approver_role: roles::FINANCE.to_string(),
            rationale: format!(
                "normal claim approved externally and imported by `{admitter}`; \
                 verification through CFO stages auto-approved, awaiting finance"
            ),
        }),
        ClaimType::SalesPromotion if admitter == roles::CRO => Some(FastPath {
            status: ClaimStatus::new(ClaimStatus::CRO_APPROVED),
            approver_role: roles::CFO.to_string(),
            rationale: "sales promotion claim imported by the CRO; \
                        verification through CRO stages auto-approved, awaiting CFO"
                .to_string(),
        }),
        ClaimType::SalesPromotion => None,
    }
}

#[cfg(test)]
mod tests {
    use super::fast_path;
    use crate::domain::claim::ClaimType;

    #[test]
    fn normal_claims_jump_to_finance() {
        let path = fast_path(ClaimType::Normal, "admin_head").expect("eligible");

        assert_eq!(path.status.as_str(), "cfo_approved");
        assert_eq!(path.approver_role, "finance");
        assert!(path.rationale.contains("admin_head"));
    }

    #[test]
    fn sales_promotion_by_cro_jumps_to_cfo() {
        let path = fast_path(ClaimType::SalesPromotion, " CRO ").expect("eligible");

        assert_eq!(path.status.as_str(), "cro_approved");
        assert_eq!(path.approver_role, "cfo");
    }

    #[test]
    fn sales_promotion_by_anyone_else_is_not_eligible() {
        assert!(fast_path(ClaimType::SalesPromotion, "admin_head").is_none());
        assert!(fast_path(ClaimType::SalesPromotion, "finance").is_none());
    }
}
