use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::claim::{Claim, ClaimStatus};
use crate::domain::employee::{roles, Employee};
use crate::errors::RoutingError;
use crate::ports::DirectoryGateway;
use crate::routing::stages::{ResolutionMode, StageDefinition, StageTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TorchBearerExemption,
    NoManagerOnFile,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TorchBearerExemption => "torch_bearer_exemption",
            Self::NoManagerOnFile => "no_manager_on_file",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStage {
    pub status: ClaimStatus,
    pub reason: SkipReason,
}

/// Who has to be found once skip rules have been applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApproverTarget {
    Role { role: String },
    Manager { email: String },
    /// Every remaining stage was skipped; the claim is done.
    Terminal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPlan {
    pub awaiting_status: ClaimStatus,
    pub next_status: ClaimStatus,
    pub target: ApproverTarget,
    pub skipped: Vec<SkippedStage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Status whose stage was resolved, after skips.
    pub awaiting_status: ClaimStatus,
    pub next_status: ClaimStatus,
    pub approver_email: Option<String>,
    /// `None` only when the pipeline completed without another approver.
    pub approver_role: Option<String>,
    pub skipped: Vec<SkippedStage>,
}

impl Resolution {
    pub fn is_completed(&self) -> bool {
        self.approver_role.is_none()
    }

    /// A role holder was required but nobody holds the role.
    pub fn is_unassigned(&self) -> bool {
        self.approver_role.is_some() && self.approver_email.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct StageResolver {
    table: StageTable,
}

impl StageResolver {
    pub fn new(table: StageTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &StageTable {
        &self.table
    }

    /// Walks the stage table from `current_status`, skipping stages the
    /// employee is exempt from, and reports whose approval is needed. An
    /// unknown employee has no manager and no exemption.
    pub fn plan(
        &self,
        employee: Option<&Employee>,
        current_status: &ClaimStatus,
    ) -> Result<ResolutionPlan, RoutingError> {
        let mut stage = self
            .table
            .stage(current_status)
            .ok_or_else(|| RoutingError::InvalidStatus { status: current_status.clone() })?;
        let mut skipped = Vec::new();

        // Each hop moves strictly forward in a validated table, so the walk
        // reaches a resolvable stage or the terminal status within `len` hops.
        for _ in 0..=self.table.len() {
            let Some(reason) = skip_reason(stage, employee) else {
                let target = match &stage.resolution {
                    ResolutionMode::FixedRole(role) => ApproverTarget::Role { role: role.clone() },
                    ResolutionMode::ManagerOfEmployee => ApproverTarget::Manager {
                        email: employee
                            .and_then(Employee::manager)
                            .map(str::to_string)
                            .unwrap_or_default(),
                    },
                };
                return Ok(ResolutionPlan {
                    awaiting_status: stage.status.clone(),
                    next_status: stage.next_status.clone(),
                    target,
                    skipped,
                });
            };

            debug!(
                event_name = "routing.stage_skipped",
                status = %stage.status,
                reason = reason.as_str(),
                "skipping approval stage"
            );
            skipped.push(SkippedStage { status: stage.status.clone(), reason });

            match self.table.stage(&stage.next_status) {
                Some(next) => stage = next,
                None => {
                    return Ok(ResolutionPlan {
                        awaiting_status: stage.next_status.clone(),
                        next_status: stage.next_status.clone(),
                        target: ApproverTarget::Terminal,
                        skipped,
                    });
                }
            }
        }

        Err(RoutingError::InvalidStatus { status: current_status.clone() })
    }

    /// Resolves the approver for `current_status` without persisting anything.
    pub async fn resolve<D>(
        &self,
        directory: &D,
        claim: &Claim,
        employee: Option<&Employee>,
        current_status: &ClaimStatus,
    ) -> Result<Resolution, RoutingError>
    where
        D: DirectoryGateway + ?Sized,
    {
        let plan = self.plan(employee, current_status)?;

        let (approver_email, approver_role) = match plan.target {
            ApproverTarget::Role { role } => {
                let holder = directory.find_by_role(&role).await?;
                (holder.map(|holder| holder.email), Some(role))
            }
            ApproverTarget::Manager { email } => (Some(email), Some(roles::MANAGER.to_string())),
            ApproverTarget::Terminal => (None, None),
        };

        debug!(
            event_name = "routing.resolved",
            claim_id = %claim.id,
            awaiting_status = %plan.awaiting_status,
            next_status = %plan.next_status,
            approver_role = approver_role.as_deref().unwrap_or("none"),
            "approver resolved"
        );

        Ok(Resolution {
            awaiting_status: plan.awaiting_status,
            next_status: plan.next_status,
            approver_email,
            approver_role,
            skipped: plan.skipped,
        })
    }
}

fn skip_reason(stage: &StageDefinition, employee: Option<&Employee>) -> Option<SkipReason> {
    if stage.skip_for_torch_bearer && employee.is_some_and(|employee| employee.torch_bearer) {
        return Some(SkipReason::TorchBearerExemption);
    }

    let has_manager = employee.and_then(Employee::manager).is_some();
    if stage.resolution == ResolutionMode::ManagerOfEmployee && !has_manager {
        return Some(SkipReason::NoManagerOnFile);
    }

    None
}
