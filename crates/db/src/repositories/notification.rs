use sqlx::Row;

use claimflow_core::domain::claim::ClaimId;
use claimflow_core::domain::notification::{Notification, NotificationKind};
use claimflow_core::errors::StoreError;
use claimflow_core::ports::NotificationEmitter;

use super::{decode, parse_timestamp, RepositoryError};
use crate::DbPool;

/// Persists in-app notifications; delivery to the user happens elsewhere.
pub struct SqlNotificationSink {
    pool: DbPool,
}

impl SqlNotificationSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_recipient(
        &self,
        recipient_email: &str,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, recipient_email, claim_id, claim_number, kind, title, message, created_at
             FROM notification WHERE lower(recipient_email) = lower(?)
             ORDER BY created_at ASC",
        )
        .bind(recipient_email)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_notification).collect::<Result<Vec<_>, _>>()
    }
}

fn parse_kind(value: &str) -> Result<NotificationKind, RepositoryError> {
    match value {
        "pending_approval" => Ok(NotificationKind::PendingApproval),
        other => Err(RepositoryError::Decode(format!("unknown notification kind `{other}`"))),
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification, RepositoryError> {
    let kind: String = row.try_get("kind").map_err(decode)?;
    let created_at: String = row.try_get("created_at").map_err(decode)?;

    Ok(Notification {
        id: row.try_get("id").map_err(decode)?,
        recipient_email: row.try_get("recipient_email").map_err(decode)?,
        claim_id: ClaimId(row.try_get("claim_id").map_err(decode)?),
        claim_number: row.try_get("claim_number").map_err(decode)?,
        kind: parse_kind(&kind)?,
        title: row.try_get("title").map_err(decode)?,
        message: row.try_get("message").map_err(decode)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl NotificationEmitter for SqlNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO notification (id, recipient_email, claim_id, claim_number, kind,
                                       title, message, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(&notification.recipient_email)
        .bind(&notification.claim_id.0)
        .bind(&notification.claim_number)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(())
    }
}
