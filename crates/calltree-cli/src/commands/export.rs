use crate::commands::dashboard::{build_view, FilterArgs, TableArgs};
use crate::commands::snapshot::load_snapshot;
use crate::commands::{write_export, Context, ExportReport};
use anyhow::Result;
use calltree_core::rules::ProjectedContact;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Responded table as CSV
    Responses(ExportTableArgs),
    /// Contacts still awaiting a reply as CSV
    Pending(ExportTableArgs),
    /// Replies tied to no contact as CSV
    Unknown(ExportUnknownArgs),
}

/// Table exports honor the same selection as the dashboard.
#[derive(Debug, Args)]
pub struct ExportTableArgs {
    #[arg(long)]
    pub incident: Option<i64>,
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[command(flatten)]
    pub filter: FilterArgs,
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Debug, Args)]
pub struct ExportUnknownArgs {
    #[arg(long)]
    pub incident: Option<i64>,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn export_responses(ctx: &Context<'_>, args: ExportTableArgs) -> Result<()> {
    let (_, view) = build_view(ctx, args.incident, &args.filter, &args.table)?;
    let rows: Vec<&ProjectedContact> = view.responded.iter().collect();
    let data = calltree_sync::export_responses(&rows);
    write_export(
        ctx,
        ExportReport {
            table: "responses",
            rows: rows.len(),
            output: output_label(args.out.as_ref()),
        },
        args.out.as_deref(),
        &data,
    )
}

pub fn export_pending(ctx: &Context<'_>, args: ExportTableArgs) -> Result<()> {
    let (_, view) = build_view(ctx, args.incident, &args.filter, &args.table)?;
    let rows: Vec<&ProjectedContact> = view.pending.iter().collect();
    let data = calltree_sync::export_pending(&rows);
    write_export(
        ctx,
        ExportReport {
            table: "pending",
            rows: rows.len(),
            output: output_label(args.out.as_ref()),
        },
        args.out.as_deref(),
        &data,
    )
}

pub fn export_unknown(ctx: &Context<'_>, args: ExportUnknownArgs) -> Result<()> {
    let snapshot = load_snapshot(ctx, args.incident)?;
    let unknown = &snapshot.outcome.unknown;
    let data = calltree_sync::export_unknown(unknown);
    write_export(
        ctx,
        ExportReport {
            table: "unknown",
            rows: unknown.len(),
            output: output_label(args.out.as_ref()),
        },
        args.out.as_deref(),
        &data,
    )
}

fn output_label(out: Option<&PathBuf>) -> String {
    out.map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string())
}
