use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use calltree_config::AppConfig;
use calltree_store::Store;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub mod contacts;
pub mod dashboard;
pub mod export;
pub mod import;
pub mod incidents;
pub mod responses;
pub mod snapshot;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub table: &'static str,
    pub rows: usize,
    pub output: String,
}

/// Writes `data` to `out`, or to stdout when no file was given. JSON mode
/// reports on the write, so it needs a file.
pub fn write_export(
    ctx: &Context<'_>,
    report: ExportReport,
    out: Option<&Path>,
    data: &str,
) -> Result<()> {
    if ctx.json && out.is_none() {
        return Err(invalid_input("--json requires --out for export commands"));
    }

    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create export directory {}", parent.display()))?;
                }
            }
            fs::write(path, data)
                .with_context(|| format!("write export file {}", path.display()))?;
            if ctx.json {
                print_json(&report)?;
            } else {
                println!(
                    "Exported {} {} rows to {}",
                    report.rows,
                    report.table,
                    path.display()
                );
            }
            Ok(())
        }
        None => {
            print!("{}", data);
            Ok(())
        }
    }
}
