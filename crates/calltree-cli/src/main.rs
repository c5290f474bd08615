mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{contacts, dashboard, export, import, incidents, responses, Context};
use crate::error::{exit_code_for, report_error};
use calltree_config as config;
use calltree_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "calltree", version, about = "Emergency call-tree response dashboard")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage the roster
    #[command(subcommand)]
    Contact(contacts::ContactCommand),
    #[command(subcommand)]
    Import(import::ImportCommand),
    /// Record and inspect replies
    #[command(subcommand)]
    Response(responses::ResponseCommand),
    #[command(subcommand)]
    Incident(incidents::IncidentCommand),
    /// Show the response dashboard for an incident
    Dashboard(dashboard::DashboardArgs),
    #[command(subcommand)]
    Export(export::ExportCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }

    let db_path =
        paths::resolve_db_path(db_path.as_deref()).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store = Store::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let ctx = Context {
        store: &store,
        json,
        config: &app_config,
    };

    match command {
        Command::Contact(cmd) => match cmd {
            contacts::ContactCommand::Add(args) => contacts::add_contact(&ctx, args),
            contacts::ContactCommand::Edit(args) => contacts::edit_contact(&ctx, args),
            contacts::ContactCommand::Rm(args) => contacts::delete_contact(&ctx, args),
            contacts::ContactCommand::Ls(args) => contacts::list_contacts(&ctx, args),
            contacts::ContactCommand::Show(args) => contacts::show_contact(&ctx, args),
        },
        Command::Import(cmd) => match cmd {
            import::ImportCommand::Roster(args) => import::import_roster(&ctx, args),
        },
        Command::Response(cmd) => match cmd {
            responses::ResponseCommand::Add(args) => responses::add_response(&ctx, args),
            responses::ResponseCommand::Manual(args) => responses::manual_response(&ctx, args),
            responses::ResponseCommand::Ls(args) => responses::list_responses(&ctx, args),
            responses::ResponseCommand::Rm(args) => responses::delete_response(&ctx, args),
        },
        Command::Incident(cmd) => match cmd {
            incidents::IncidentCommand::Start(args) => incidents::start_incident(&ctx, args),
            incidents::IncidentCommand::End => incidents::end_incident(&ctx),
            incidents::IncidentCommand::Status => incidents::incident_status(&ctx),
            incidents::IncidentCommand::Register(args) => {
                incidents::register_incident(&ctx, args)
            }
            incidents::IncidentCommand::Edit(args) => incidents::edit_incident(&ctx, args),
            incidents::IncidentCommand::Rm(args) => incidents::delete_incident(&ctx, args),
            incidents::IncidentCommand::History => incidents::incident_history(&ctx),
            incidents::IncidentCommand::Show(args) => incidents::show_incident(&ctx, args),
        },
        Command::Dashboard(args) => dashboard::dashboard(&ctx, args),
        Command::Export(cmd) => match cmd {
            export::ExportCommand::Responses(args) => export::export_responses(&ctx, args),
            export::ExportCommand::Pending(args) => export::export_pending(&ctx, args),
            export::ExportCommand::Unknown(args) => export::export_unknown(&ctx, args),
        },
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
