use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use claimflow_core::domain::claim::{Claim, ClaimId, ClaimStatus, ClaimType, RoutingPatch};
use claimflow_core::errors::StoreError;
use claimflow_core::ports::ClaimStore;

use super::{decode, parse_timestamp, RepositoryError};
use crate::DbPool;

const CLAIM_COLUMNS: &str = "id, claim_number, employee_email, claim_type, status,
                             current_approver_role, total_amount, routing_version,
                             created_at, updated_at";

pub struct SqlClaimStore {
    pool: DbPool,
}

impl SqlClaimStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &ClaimId) -> Result<Option<Claim>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CLAIM_COLUMNS} FROM claim WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_claim(r)?)),
            None => Ok(None),
        }
    }

    pub async fn list_by_status(&self, status: &ClaimStatus) -> Result<Vec<Claim>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claim WHERE status = ? ORDER BY created_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_claim).collect::<Result<Vec<_>, _>>()
    }
}

fn row_to_claim(row: &sqlx::sqlite::SqliteRow) -> Result<Claim, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode)?;
    let claim_number: String = row.try_get("claim_number").map_err(decode)?;
    let employee_email: String = row.try_get("employee_email").map_err(decode)?;
    let claim_type: String = row.try_get("claim_type").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let current_approver_role: Option<String> =
        row.try_get("current_approver_role").map_err(decode)?;
    let total_amount: String = row.try_get("total_amount").map_err(decode)?;
    let routing_version: i64 = row.try_get("routing_version").map_err(decode)?;
    let created_at: String = row.try_get("created_at").map_err(decode)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode)?;

    Ok(Claim {
        id: ClaimId(id),
        claim_number,
        employee_email,
        claim_type: ClaimType::from_str(&claim_type).map_err(RepositoryError::Decode)?,
        status: ClaimStatus::new(status),
        current_approver_role,
        total_amount: Decimal::from_str(&total_amount).map_err(decode)?,
        routing_version,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl ClaimStore for SqlClaimStore {
    async fn find_by_id(&self, id: &ClaimId) -> Result<Option<Claim>, StoreError> {
        Ok(self.fetch(id).await?)
    }

    async fn save(&self, claim: Claim) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO claim (id, claim_number, employee_email, claim_type, status,
                                current_approver_role, total_amount, routing_version,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 claim_number = excluded.claim_number,
                 employee_email = excluded.employee_email,
                 claim_type = excluded.claim_type,
                 status = excluded.status,
                 current_approver_role = excluded.current_approver_role,
                 total_amount = excluded.total_amount,
                 routing_version = excluded.routing_version,
                 updated_at = excluded.updated_at",
        )
        .bind(&claim.id.0)
        .bind(&claim.claim_number)
        .bind(&claim.employee_email)
        .bind(claim.claim_type.as_str())
        .bind(claim.status.as_str())
        .bind(&claim.current_approver_role)
        .bind(claim.total_amount.to_string())
        .bind(claim.routing_version)
        .bind(claim.created_at.to_rfc3339())
        .bind(claim.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn compare_and_set_routing(
        &self,
        id: &ClaimId,
        expected_status: &ClaimStatus,
        expected_version: i64,
        patch: RoutingPatch,
    ) -> Result<Claim, StoreError> {
        let result = sqlx::query(
            "UPDATE claim
             SET status = ?,
                 current_approver_role = COALESCE(?, current_approver_role),
                 routing_version = routing_version + 1,
                 updated_at = ?
             WHERE id = ? AND status = ? AND routing_version = ?",
        )
        .bind(patch.status.as_str())
        .bind(&patch.current_approver_role)
        .bind(Utc::now().to_rfc3339())
        .bind(&id.0)
        .bind(expected_status.as_str())
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return match self.fetch(id).await? {
                Some(_) => Err(StoreError::ConcurrentModification { claim_id: id.clone() }),
                None => Err(StoreError::NotFound(id.clone())),
            };
        }

        self.fetch(id).await?.ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
