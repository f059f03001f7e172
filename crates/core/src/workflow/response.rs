use serde::{Deserialize, Serialize};

use crate::errors::RoutingError;
use crate::routing::resolver::Resolution;

/// Transport-neutral result of a routing step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaiting_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_status: Option<String>,
    /// Set when the stage needs a role nobody currently holds.
    #[serde(default)]
    pub unassigned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default)]
    pub retryable: bool,
}

impl From<Resolution> for AdvanceResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            success: true,
            unassigned: resolution.is_unassigned(),
            approver_email: resolution.approver_email,
            approver_role: resolution.approver_role,
            awaiting_status: Some(resolution.awaiting_status.0),
            next_status: Some(resolution.next_status.0),
            ..Self::default()
        }
    }
}

impl From<RoutingError> for AdvanceResponse {
    fn from(error: RoutingError) -> Self {
        Self {
            success: false,
            error_code: Some(error.code().to_string()),
            retryable: error.is_retryable(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

impl From<Result<Resolution, RoutingError>> for AdvanceResponse {
    fn from(result: Result<Resolution, RoutingError>) -> Self {
        match result {
            Ok(resolution) => resolution.into(),
            Err(error) => error.into(),
        }
    }
}
