use serde::Serialize;
use uuid::Uuid;

use claimflow_core::audit::AuditContext;
use claimflow_core::config::AppConfig;
use claimflow_core::domain::claim::{ClaimId, ClaimStatus};
use claimflow_core::errors::RoutingError;
use claimflow_core::routing::StageResolver;
use claimflow_core::workflow::{AdmissionOutcome, AdvanceResponse, BulkAdmission, ClaimWorkflow};
use claimflow_db::{
    connect_with_config, migrations, DbPool, SqlAuditLog, SqlClaimStore, SqlDirectory,
    SqlNotificationSink,
};

use crate::commands::{build_runtime, load_config, CommandResult};

type SqlWorkflow = ClaimWorkflow<SqlClaimStore, SqlDirectory, SqlNotificationSink, SqlAuditLog>;

type Failure = (&'static str, String, u8);

const DEFAULT_ACTOR: &str = "claimflow-cli";

#[derive(Debug)]
enum RoutingAction {
    Advance { claim_id: ClaimId, status: ClaimStatus },
    Approve { claim_id: ClaimId, status: ClaimStatus },
    AdmitBulk(BulkAdmission),
}

impl RoutingAction {
    fn command(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::Approve { .. } => "approve",
            Self::AdmitBulk(_) => "admit-bulk",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RoutingBody {
    Routed(AdvanceResponse),
    Admitted(AdmissionOutcome),
}

#[derive(Debug, Serialize)]
struct RoutingOutcome<'a> {
    command: &'a str,
    status: &'static str,
    correlation_id: &'a str,
    #[serde(flatten)]
    body: RoutingBody,
}

/// Resolves and assigns the approver for the claim's current stage.
pub fn advance(claim_id: &str, status: &str, actor: Option<&str>) -> CommandResult {
    execute(
        RoutingAction::Advance {
            claim_id: ClaimId(claim_id.trim().to_string()),
            status: ClaimStatus::new(status),
        },
        actor,
    )
}

/// Records that the approver of `status` signed off and routes the claim onward.
pub fn approve(claim_id: &str, status: &str, actor: Option<&str>) -> CommandResult {
    execute(
        RoutingAction::Approve {
            claim_id: ClaimId(claim_id.trim().to_string()),
            status: ClaimStatus::new(status),
        },
        actor,
    )
}

pub fn admit_bulk(
    claim_id: &str,
    admitted_by: &str,
    admitted_by_role: &str,
    actor: Option<&str>,
) -> CommandResult {
    execute(
        RoutingAction::AdmitBulk(BulkAdmission {
            claim_id: ClaimId(claim_id.trim().to_string()),
            admitted_by: admitted_by.trim().to_string(),
            admitted_by_role: admitted_by_role.trim().to_string(),
        }),
        actor.or(Some(admitted_by)),
    )
}

fn execute(action: RoutingAction, actor: Option<&str>) -> CommandResult {
    let command = action.command();
    let config = match load_config(command) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let audit = AuditContext::new(Uuid::new_v4().to_string(), actor.unwrap_or(DEFAULT_ACTOR));

    let result = runtime.block_on(async {
        let (pool, workflow) = open_workflow(&config).await?;
        let outcome = perform(&workflow, action, &audit).await;
        pool.close().await;
        Ok::<_, Failure>(outcome)
    });

    match result {
        Ok(Ok(body)) => CommandResult::payload(
            command,
            0,
            &RoutingOutcome {
                command,
                status: "ok",
                correlation_id: &audit.correlation_id,
                body,
            },
        ),
        Ok(Err(error)) => {
            let exit_code = if error.is_retryable() { 7 } else { 6 };
            CommandResult::payload(
                command,
                exit_code,
                &RoutingOutcome {
                    command,
                    status: "error",
                    correlation_id: &audit.correlation_id,
                    body: RoutingBody::Routed(AdvanceResponse::from(error)),
                },
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

async fn open_workflow(config: &AppConfig) -> Result<(DbPool, SqlWorkflow), Failure> {
    let table = config.stage_table().map_err(|error| ("stage_table", error.to_string(), 2u8))?;
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), 5u8))?;

    let workflow = ClaimWorkflow::new(
        SqlClaimStore::new(pool.clone()),
        SqlDirectory::new(pool.clone()),
        SqlNotificationSink::new(pool.clone()),
        SqlAuditLog::new(pool.clone()),
        StageResolver::new(table),
    )
    .with_settings(config.workflow_settings());

    Ok((pool, workflow))
}

async fn perform(
    workflow: &SqlWorkflow,
    action: RoutingAction,
    audit: &AuditContext,
) -> Result<RoutingBody, RoutingError> {
    match action {
        RoutingAction::Advance { claim_id, status } => workflow
            .resolve_current_approver(&claim_id, &status, audit)
            .await
            .map(|resolution| RoutingBody::Routed(resolution.into())),
        RoutingAction::Approve { claim_id, status } => workflow
            .record_approval_and_advance(&claim_id, &status, audit)
            .await
            .map(|resolution| RoutingBody::Routed(resolution.into())),
        RoutingAction::AdmitBulk(admission) => {
            workflow.admit_bulk(&admission, audit).await.map(RoutingBody::Admitted)
        }
    }
}
