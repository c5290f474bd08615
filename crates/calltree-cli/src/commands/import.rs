use crate::commands::{print_json, Context};
use crate::util::now_utc;
use anyhow::{Context as _, Result};
use calltree_store::error::StoreError;
use calltree_store::repo::ContactNew;
use calltree_sync::{parse_roster, ImportReport};
use clap::{Args, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Import a roster CSV (name, number, department, location, position, level)
    Roster(ImportRosterArgs),
}

#[derive(Debug, Args)]
pub struct ImportRosterArgs {
    pub file: PathBuf,
    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Contacts are matched on their normalized number: a known number updates
/// that contact, anything else creates one. The whole file applies or none
/// of it does.
pub fn import_roster(ctx: &Context<'_>, args: ImportRosterArgs) -> Result<()> {
    let data = fs::read_to_string(&args.file)
        .with_context(|| format!("read roster file {}", args.file.display()))?;
    let parsed = parse_roster(&data)
        .with_context(|| format!("parse roster file {}", args.file.display()))?;
    let mut report = ImportReport {
        skipped: parsed.skipped,
        warnings: parsed.warnings,
        dry_run: args.dry_run,
        ..ImportReport::default()
    };
    let now = now_utc();

    let tx = ctx.store.connection().unchecked_transaction()?;
    let contacts = ctx.store.contacts();
    for row in parsed.rows {
        let name = row.name.clone();
        let outcome = contacts.upsert_by_number(
            now,
            ContactNew {
                name: row.name,
                number: row.number,
                department: row.department,
                location: row.location,
                position: row.position,
                level: row.level,
            },
        );
        match outcome {
            Ok(outcome) if outcome.created => report.created += 1,
            Ok(_) => report.updated += 1,
            Err(err @ StoreError::Core(_)) => {
                report.skipped += 1;
                report.warnings.push(format!("skipping {name}: {err}"));
            }
            Err(err) => return Err(err.into()),
        }
    }

    if args.dry_run {
        debug!("dry run, rolling back roster import");
        tx.rollback()?;
    } else {
        tx.commit()?;
    }

    if !report.warnings.is_empty() {
        warn!(
            file = %args.file.display(),
            count = report.warnings.len(),
            "roster import produced warnings"
        );
    }

    if ctx.json {
        return print_json(&report);
    }

    let verb = if report.dry_run {
        "Would import roster"
    } else {
        "Imported roster"
    };
    println!(
        "{verb}: created {}, updated {}, skipped {}",
        report.created, report.updated, report.skipped
    );
    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in report.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}
