use std::collections::BTreeMap;

use sqlx::Row;

use claimflow_core::audit::{AuditCategory, AuditEvent, AuditOutcome};
use claimflow_core::domain::claim::ClaimId;
use claimflow_core::errors::StoreError;
use claimflow_core::ports::AuditSink;

use super::{decode, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlAuditLog {
    pool: DbPool,
}

impl SqlAuditLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_claim(&self, claim_id: &ClaimId) -> Result<Vec<AuditEvent>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, claim_id, correlation_id, event_type, event_category, actor, outcome,
                    metadata_json, occurred_at
             FROM audit_event WHERE claim_id = ?
             ORDER BY occurred_at ASC, rowid ASC",
        )
        .bind(&claim_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }
}

fn parse_category(value: &str) -> Result<AuditCategory, RepositoryError> {
    match value {
        "routing" => Ok(AuditCategory::Routing),
        "bulk_admission" => Ok(AuditCategory::BulkAdmission),
        other => Err(RepositoryError::Decode(format!("unknown audit category `{other}`"))),
    }
}

fn parse_outcome(value: &str) -> Result<AuditOutcome, RepositoryError> {
    match value {
        "success" => Ok(AuditOutcome::Success),
        "skipped" => Ok(AuditOutcome::Skipped),
        "held" => Ok(AuditOutcome::Held),
        other => Err(RepositoryError::Decode(format!("unknown audit outcome `{other}`"))),
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEvent, RepositoryError> {
    let category: String = row.try_get("event_category").map_err(decode)?;
    let outcome: String = row.try_get("outcome").map_err(decode)?;
    let metadata_json: String = row.try_get("metadata_json").map_err(decode)?;
    let occurred_at: String = row.try_get("occurred_at").map_err(decode)?;

    Ok(AuditEvent {
        event_id: row.try_get("id").map_err(decode)?,
        claim_id: ClaimId(row.try_get("claim_id").map_err(decode)?),
        correlation_id: row.try_get("correlation_id").map_err(decode)?,
        event_type: row.try_get("event_type").map_err(decode)?,
        category: parse_category(&category)?,
        actor: row.try_get("actor").map_err(decode)?,
        outcome: parse_outcome(&outcome)?,
        metadata: serde_json::from_str::<BTreeMap<String, String>>(&metadata_json)
            .map_err(decode)?,
        occurred_at: parse_timestamp(&occurred_at)?,
    })
}

#[async_trait::async_trait]
impl AuditSink for SqlAuditLog {
    async fn emit(&self, event: AuditEvent) -> Result<(), StoreError> {
        let metadata_json = serde_json::to_string(&event.metadata).map_err(decode)?;

        sqlx::query(
            "INSERT INTO audit_event (id, claim_id, correlation_id, event_type, event_category,
                                      actor, outcome, metadata_json, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.event_id)
        .bind(&event.claim_id.0)
        .bind(&event.correlation_id)
        .bind(&event.event_type)
        .bind(event.category.as_str())
        .bind(&event.actor)
        .bind(event.outcome.as_str())
        .bind(metadata_json)
        .bind(event.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(())
    }
}
