use std::collections::HashMap;

use tokio::sync::RwLock;

use claimflow_core::domain::claim::{Claim, ClaimId, ClaimStatus, RoutingPatch};
use claimflow_core::domain::employee::Employee;
use claimflow_core::domain::notification::Notification;
use claimflow_core::errors::StoreError;
use claimflow_core::ports::{ClaimStore, DirectoryGateway, NotificationEmitter};

#[derive(Default)]
pub struct InMemoryClaimStore {
    claims: RwLock<HashMap<String, Claim>>,
}

#[async_trait::async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn find_by_id(&self, id: &ClaimId) -> Result<Option<Claim>, StoreError> {
        let claims = self.claims.read().await;
        Ok(claims.get(&id.0).cloned())
    }

    async fn save(&self, claim: Claim) -> Result<(), StoreError> {
        let mut claims = self.claims.write().await;
        claims.insert(claim.id.0.clone(), claim);
        Ok(())
    }

    async fn compare_and_set_routing(
        &self,
        id: &ClaimId,
        expected_status: &ClaimStatus,
        expected_version: i64,
        patch: RoutingPatch,
    ) -> Result<Claim, StoreError> {
        let mut claims = self.claims.write().await;
        let claim = claims.get_mut(&id.0).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if claim.status != *expected_status || claim.routing_version != expected_version {
            return Err(StoreError::ConcurrentModification { claim_id: id.clone() });
        }
        claim.apply(&patch);
        Ok(claim.clone())
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    employees: RwLock<HashMap<String, Employee>>,
}

impl InMemoryDirectory {
    pub async fn upsert(&self, employee: Employee) {
        let mut employees = self.employees.write().await;
        employees.insert(employee.email.to_ascii_lowercase(), employee);
    }
}

#[async_trait::async_trait]
impl DirectoryGateway for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        let employees = self.employees.read().await;
        Ok(employees.get(&email.trim().to_ascii_lowercase()).cloned())
    }

    async fn find_by_role(&self, role: &str) -> Result<Option<Employee>, StoreError> {
        let employees = self.employees.read().await;
        Ok(employees
            .values()
            .filter(|employee| employee.has_role(role))
            .min_by(|left, right| left.email.cmp(&right.email))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationSink {
    sent: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationSink {
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationEmitter for InMemoryNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), StoreError> {
        let mut sent = self.sent.write().await;
        sent.push(notification);
        Ok(())
    }
}
