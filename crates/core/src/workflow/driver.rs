use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome};
use crate::domain::claim::{Claim, ClaimId, ClaimStatus, RoutingPatch};
use crate::domain::employee::Employee;
use crate::domain::notification::Notification;
use crate::errors::RoutingError;
use crate::ports::{AuditSink, ClaimStore, DirectoryGateway, NotificationEmitter};
use crate::routing::resolver::{Resolution, SkippedStage, StageResolver};
use crate::workflow::bulk::{fast_path, AdmissionOutcome, BulkAdmission};

const CLAIM_STORE: &str = "claim store";
const DIRECTORY: &str = "directory";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Upper bound for every collaborator call made during one routing step.
    pub dependency_timeout: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self { dependency_timeout: Duration::from_secs(5) }
    }
}

/// Whether a step that finds nobody holding the required role still moves the claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UnassignedPolicy {
    LeaveClaim,
    HoldClaim,
}

pub struct ClaimWorkflow<S, D, N, A> {
    store: S,
    directory: D,
    notifier: N,
    audit: A,
    resolver: StageResolver,
    settings: WorkflowSettings,
}

impl<S, D, N, A> ClaimWorkflow<S, D, N, A>
where
    S: ClaimStore,
    D: DirectoryGateway,
    N: NotificationEmitter,
    A: AuditSink,
{
    pub fn new(store: S, directory: D, notifier: N, audit: A, resolver: StageResolver) -> Self {
        Self { store, directory, notifier, audit, resolver, settings: WorkflowSettings::default() }
    }

    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn resolver(&self) -> &StageResolver {
        &self.resolver
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Single entry point of the routing step: resolves and assigns the
    /// approver for `current_status`.
    pub async fn advance(
        &self,
        claim_id: &ClaimId,
        current_status: &ClaimStatus,
    ) -> Result<Resolution, RoutingError> {
        self.resolve_current_approver(claim_id, current_status, &AuditContext::default()).await
    }

    /// Resolves who must act on `current_status` and, when somebody does,
    /// records the claim as awaiting them and notifies them. The claim only
    /// moves past the stage through [`Self::record_approval_and_advance`].
    pub async fn resolve_current_approver(
        &self,
        claim_id: &ClaimId,
        current_status: &ClaimStatus,
        audit: &AuditContext,
    ) -> Result<Resolution, RoutingError> {
        let claim = self.load_claim(claim_id).await?;
        if self.resolver.table().is_terminal(&claim.status) {
            warn!(
                event_name = "routing.claim_closed",
                correlation_id = %audit.correlation_id,
                claim_id = %claim.id,
                requested_status = %current_status,
                stored_status = %claim.status,
                "claim has already left the approval pipeline"
            );
            return Err(RoutingError::InvalidStatus { status: claim.status });
        }
        self.route(&claim, current_status, audit, UnassignedPolicy::LeaveClaim, Vec::new()).await
    }

    /// The approver of `acted_status` has signed off: route the claim to the
    /// stage after it.
    pub async fn record_approval_and_advance(
        &self,
        claim_id: &ClaimId,
        acted_status: &ClaimStatus,
        audit: &AuditContext,
    ) -> Result<Resolution, RoutingError> {
        let stage = self
            .resolver
            .table()
            .stage(acted_status)
            .ok_or_else(|| RoutingError::InvalidStatus { status: acted_status.clone() })?;
        let next_status = stage.next_status.clone();

        let claim = self.load_claim(claim_id).await?;
        if claim.status != *acted_status {
            warn!(
                event_name = "routing.approval_stale",
                correlation_id = %audit.correlation_id,
                claim_id = %claim.id,
                acted_status = %acted_status,
                stored_status = %claim.status,
                "approval recorded against a status the claim has already left"
            );
            return Err(RoutingError::ConcurrentModification { claim_id: claim.id });
        }

        let approved = AuditEvent::new(
            claim.id.clone(),
            audit,
            "routing.stage_approved",
            AuditCategory::Routing,
            AuditOutcome::Success,
        )
        .with_metadata("status", acted_status.as_str());

        if self.resolver.table().is_terminal(&next_status) {
            return self.complete(&claim, &next_status, Vec::new(), vec![approved], audit).await;
        }

        self.route(&claim, &next_status, audit, UnassignedPolicy::HoldClaim, vec![approved]).await
    }

    /// Applies the bulk-import fast path to a claim that still sits at the
    /// start of the pipeline.
    pub async fn admit_bulk(
        &self,
        admission: &BulkAdmission,
        audit: &AuditContext,
    ) -> Result<AdmissionOutcome, RoutingError> {
        let claim = self.load_claim(&admission.claim_id).await?;

        let at_start = self
            .resolver
            .table()
            .stages()
            .first()
            .is_some_and(|stage| stage.status == claim.status);
        if !at_start {
            return Ok(AdmissionOutcome::NotEligible {
                reason: format!("claim is already at status `{}`", claim.status),
            });
        }

        let Some(path) = fast_path(claim.claim_type, &admission.admitted_by_role) else {
            info!(
                event_name = "bulk.not_eligible",
                correlation_id = %audit.correlation_id,
                claim_id = %claim.id,
                claim_type = claim.claim_type.as_str(),
                admitted_by_role = %admission.admitted_by_role,
                "bulk admission left claim on the standard pipeline"
            );
            return Ok(AdmissionOutcome::NotEligible {
                reason: format!(
                    "{} claims admitted by `{}` follow the standard pipeline",
                    claim.claim_type.as_str(),
                    admission.admitted_by_role
                ),
            });
        };

        self.write(
            &claim,
            RoutingPatch {
                status: path.status.clone(),
                current_approver_role: Some(path.approver_role.clone()),
            },
        )
        .await?;

        info!(
            event_name = "bulk.auto_approved",
            correlation_id = %audit.correlation_id,
            claim_id = %claim.id,
            status = %path.status,
            approver_role = %path.approver_role,
            "bulk claim auto-approved"
        );
        self.emit(
            AuditEvent::new(
                claim.id.clone(),
                audit,
                "bulk.auto_approved",
                AuditCategory::BulkAdmission,
                AuditOutcome::Success,
            )
            .with_metadata("claim_number", claim.claim_number.clone())
            .with_metadata("claim_type", claim.claim_type.as_str())
            .with_metadata("admitted_by", admission.admitted_by.clone())
            .with_metadata("admitted_by_role", admission.admitted_by_role.clone())
            .with_metadata("from_status", claim.status.as_str())
            .with_metadata("to_status", path.status.as_str())
            .with_metadata("approver_role", path.approver_role.clone())
            .with_metadata("rationale", path.rationale.clone()),
        )
        .await;

        Ok(AdmissionOutcome::AutoApproved {
            status: path.status,
            approver_role: path.approver_role,
            rationale: path.rationale,
        })
    }

    async fn route(
        &self,
        claim: &Claim,
        status: &ClaimStatus,
        audit: &AuditContext,
        unassigned: UnassignedPolicy,
        mut pending: Vec<AuditEvent>,
    ) -> Result<Resolution, RoutingError> {
        let employee = self.lookup_employee(claim, audit).await;
        let resolution = self
            .bounded(
                DIRECTORY,
                self.resolver.resolve(&self.directory, claim, employee.as_ref(), status),
            )
            .await?;

        // Approval and skip entries only land once the claim write has.
        pending.extend(resolution.skipped.iter().map(|skipped| {
            AuditEvent::new(
                claim.id.clone(),
                audit,
                "routing.stage_skipped",
                AuditCategory::Routing,
                AuditOutcome::Skipped,
            )
            .with_metadata("status", skipped.status.as_str())
            .with_metadata("reason", skipped.reason.as_str())
        }));

        if resolution.is_completed() {
            let terminal = resolution.awaiting_status.clone();
            return self.complete(claim, &terminal, resolution.skipped, pending, audit).await;
        }

        let role = resolution.approver_role.clone().unwrap_or_default();
        let patch = RoutingPatch {
            status: resolution.awaiting_status.clone(),
            current_approver_role: Some(role.clone()),
        };

        let Some(approver_email) = resolution.approver_email.clone() else {
            warn!(
                event_name = "routing.approver_unassigned",
                correlation_id = %audit.correlation_id,
                claim_id = %claim.id,
                claim_number = %claim.claim_number,
                awaiting_status = %resolution.awaiting_status,
                approver_role = %role,
                "no user holds the approver role; claim is held pending assignment"
            );
            if unassigned == UnassignedPolicy::HoldClaim {
                self.write(claim, patch).await?;
                self.emit_all(pending).await;
            }
            self.emit(
                AuditEvent::new(
                    claim.id.clone(),
                    audit,
                    "routing.approver_unassigned",
                    AuditCategory::Routing,
                    AuditOutcome::Held,
                )
                .with_metadata("awaiting_status", resolution.awaiting_status.as_str())
                .with_metadata("approver_role", role),
            )
            .await;
            return Ok(resolution);
        };

        self.write(claim, patch).await?;
        self.emit_all(pending).await;

        info!(
            event_name = "routing.approver_assigned",
            correlation_id = %audit.correlation_id,
            claim_id = %claim.id,
            awaiting_status = %resolution.awaiting_status,
            approver_role = %role,
            "claim assigned to approver"
        );

        let submitter = employee
            .as_ref()
            .map(|employee| employee.display_name.clone())
            .unwrap_or_else(|| claim.employee_email.clone());
        self.send(Notification::pending_approval(
            approver_email.clone(),
            claim.id.clone(),
            claim.claim_number.clone(),
            &role,
            format!(
                "Reimbursement claim {} from {} for {} needs your action as {}.",
                claim.claim_number, submitter, claim.total_amount, role
            ),
        ))
        .await;

        self.emit(
            AuditEvent::new(
                claim.id.clone(),
                audit,
                "routing.approver_assigned",
                AuditCategory::Routing,
                AuditOutcome::Success,
            )
            .with_metadata("awaiting_status", resolution.awaiting_status.as_str())
            .with_metadata("next_status", resolution.next_status.as_str())
            .with_metadata("approver_role", role)
            .with_metadata("approver_email", approver_email),
        )
        .await;

        Ok(resolution)
    }

    async fn complete(
        &self,
        claim: &Claim,
        terminal: &ClaimStatus,
        skipped: Vec<SkippedStage>,
        pending: Vec<AuditEvent>,
        audit: &AuditContext,
    ) -> Result<Resolution, RoutingError> {
        self.write(claim, RoutingPatch { status: terminal.clone(), current_approver_role: None })
            .await?;
        self.emit_all(pending).await;

        info!(
            event_name = "routing.completed",
            correlation_id = %audit.correlation_id,
            claim_id = %claim.id,
            status = %terminal,
            "claim reached the end of the approval pipeline"
        );
        self.emit(
            AuditEvent::new(
                claim.id.clone(),
                audit,
                "routing.completed",
                AuditCategory::Routing,
                AuditOutcome::Success,
            )
            .with_metadata("status", terminal.as_str()),
        )
        .await;

        Ok(Resolution {
            awaiting_status: terminal.clone(),
            next_status: terminal.clone(),
            approver_email: None,
            approver_role: None,
            skipped,
        })
    }

    async fn load_claim(&self, claim_id: &ClaimId) -> Result<Claim, RoutingError> {
        self.bounded(CLAIM_STORE, self.store.find_by_id(claim_id))
            .await?
            .ok_or_else(|| RoutingError::ClaimNotFound { claim_id: claim_id.clone() })
    }

    async fn lookup_employee(&self, claim: &Claim, audit: &AuditContext) -> Option<Employee> {
        let lookup = self.bounded(DIRECTORY, self.directory.find_by_email(&claim.employee_email));
        match lookup.await {
            Ok(Some(employee)) => Some(employee),
            Ok(None) => {
                warn!(
                    event_name = "routing.employee_missing",
                    correlation_id = %audit.correlation_id,
                    claim_id = %claim.id,
                    employee_email = %claim.employee_email,
                    "employee not in directory; routing without manager or exemptions"
                );
                None
            }
            Err(error) => {
                warn!(
                    event_name = "routing.employee_lookup_failed",
                    correlation_id = %audit.correlation_id,
                    claim_id = %claim.id,
                    employee_email = %claim.employee_email,
                    error = %error,
                    "directory lookup failed; routing without manager or exemptions"
                );
                None
            }
        }
    }

    async fn write(&self, claim: &Claim, patch: RoutingPatch) -> Result<Claim, RoutingError> {
        self.bounded(
            CLAIM_STORE,
            self.store.compare_and_set_routing(
                &claim.id,
                &claim.status,
                claim.routing_version,
                patch,
            ),
        )
        .await
    }

    async fn send(&self, notification: Notification) {
        let recipient = notification.recipient_email.clone();
        let claim_id = notification.claim_id.clone();
        if let Err(error) = self.bounded("notification sink", self.notifier.notify(notification)).await
        {
            warn!(
                event_name = "routing.notification_failed",
                claim_id = %claim_id,
                recipient = %recipient,
                error = %error,
                "approver notification could not be delivered"
            );
        }
    }

    async fn emit(&self, event: AuditEvent) {
        let event_type = event.event_type.clone();
        let claim_id = event.claim_id.clone();
        if let Err(error) = self.bounded("audit log", self.audit.emit(event)).await {
            error!(
                event_name = "audit.append_failed",
                claim_id = %claim_id,
                audit_event = %event_type,
                error = %error,
                "audit event was not recorded"
            );
        }
    }

    async fn emit_all(&self, events: Vec<AuditEvent>) {
        for event in events {
            self.emit(event).await;
        }
    }

    async fn bounded<T, E, F>(&self, dependency: &str, future: F) -> Result<T, RoutingError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<RoutingError>,
    {
        match tokio::time::timeout(self.settings.dependency_timeout, future).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(RoutingError::dependency_unavailable(
                dependency,
                format!("timed out after {}ms", self.settings.dependency_timeout.as_millis()),
            )),
        }
    }
}
