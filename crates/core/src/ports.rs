use async_trait::async_trait;

use crate::audit::AuditEvent;
use crate::domain::claim::{Claim, ClaimId, ClaimStatus, RoutingPatch};
use crate::domain::employee::Employee;
use crate::domain::notification::Notification;
use crate::errors::StoreError;

#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn find_by_id(&self, id: &ClaimId) -> Result<Option<Claim>, StoreError>;

    async fn save(&self, claim: Claim) -> Result<(), StoreError>;

    /// Applies `patch` only if the stored claim still has `expected_status` at
    /// `expected_version`, bumping the version. Otherwise returns
    /// [`StoreError::ConcurrentModification`].
    async fn compare_and_set_routing(
        &self,
        id: &ClaimId,
        expected_status: &ClaimStatus,
        expected_version: i64,
        patch: RoutingPatch,
    ) -> Result<Claim, StoreError>;
}

#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError>;

    /// First holder of `role`, ordered by email so repeated lookups agree.
    async fn find_by_role(&self, role: &str) -> Result<Option<Employee>, StoreError>;
}

#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: AuditEvent) -> Result<(), StoreError>;
}
