pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "claimflow",
    about = "Claimflow operator CLI",
    long_about = "Route reimbursement claims through the approval pipeline, apply migrations, and inspect configuration.",
    after_help = "Examples:\n  claimflow advance --claim-id c-42 --status submitted\n  claimflow approve --claim-id c-42 --status verified --actor suresh@corp.test\n  claimflow stages --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, the stage table, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the effective approval stage table")]
    Stages {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Resolve and assign the approver for a claim's current stage")]
    Advance {
        #[arg(long)]
        claim_id: String,
        #[arg(long, help = "Status the claim is currently waiting at")]
        status: String,
        #[arg(long, help = "Who triggered the step, recorded in the audit log")]
        actor: Option<String>,
    },
    #[command(about = "Record an approval for a stage and route the claim to the next approver")]
    Approve {
        #[arg(long)]
        claim_id: String,
        #[arg(long, help = "Status whose approver signed off")]
        status: String,
        #[arg(long)]
        actor: Option<String>,
    },
    #[command(about = "Apply the bulk-import fast path to an externally approved claim")]
    AdmitBulk {
        #[arg(long)]
        claim_id: String,
        #[arg(long, help = "Email of the user who imported the claim")]
        admitted_by: String,
        #[arg(long, help = "Portal role of the importing user")]
        role: String,
        #[arg(long)]
        actor: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init_from_env();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            let (passed, output) = commands::doctor::run(json);
            commands::CommandResult { exit_code: if passed { 0 } else { 1 }, output }
        }
        Command::Stages { json } => commands::stages::run(json),
        Command::Advance { claim_id, status, actor } => {
            commands::routing::advance(&claim_id, &status, actor.as_deref())
        }
        Command::Approve { claim_id, status, actor } => {
            commands::routing::approve(&claim_id, &status, actor.as_deref())
        }
        Command::AdmitBulk { claim_id, admitted_by, role, actor } => {
            commands::routing::admit_bulk(&claim_id, &admitted_by, &role, actor.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
