use serde::Serialize;

use claimflow_core::routing::{ResolutionMode, StageTable};

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct StageView<'a> {
    status: &'a str,
    approver: String,
    next_status: &'a str,
    skip_for_torch_bearer: bool,
}

#[derive(Debug, Serialize)]
struct StagesReport<'a> {
    command: &'static str,
    status: &'static str,
    source: String,
    terminal_status: &'a str,
    stages: Vec<StageView<'a>>,
}

/// Prints the effective stage table after validation.
pub fn run(json_output: bool) -> CommandResult {
    let config = match load_config("stages") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let table = match config.stage_table() {
        Ok(table) => table,
        Err(error) => return CommandResult::failure("stages", "stage_table", error.to_string(), 2),
    };
    let source = config
        .routing
        .stage_table_path
        .as_ref()
        .map(|path| format!("file ({})", path.display()))
        .unwrap_or_else(|| "built-in".to_string());

    let report = build_report(&table, source);
    if json_output {
        return CommandResult::payload("stages", 0, &report);
    }

    CommandResult { exit_code: 0, output: render_human(&report) }
}

fn build_report(table: &StageTable, source: String) -> StagesReport<'_> {
    let stages = table
        .stages()
        .iter()
        .map(|stage| StageView {
            status: stage.status.as_str(),
            approver: match &stage.resolution {
                ResolutionMode::FixedRole(role) => role.clone(),
                ResolutionMode::ManagerOfEmployee => "manager of employee".to_string(),
            },
            next_status: stage.next_status.as_str(),
            skip_for_torch_bearer: stage.skip_for_torch_bearer,
        })
        .collect();

    StagesReport {
        command: "stages",
        status: "ok",
        source,
        terminal_status: table.terminal_status().as_str(),
        stages,
    }
}

fn render_human(report: &StagesReport<'_>) -> String {
    let mut lines = vec![format!("stage table (source: {}):", report.source)];
    for stage in &report.stages {
        let exemption = if stage.skip_for_torch_bearer { " [skipped for torch bearers]" } else { "" };
        lines.push(format!(
            "- {} -> {} (approver: {}){exemption}",
            stage.status, stage.next_status, stage.approver
        ));
    }
    lines.push(format!("terminal status: {}", report.terminal_status));
    lines.join("\n")
}
