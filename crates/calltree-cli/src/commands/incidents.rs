use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use crate::util::{format_timestamp_datetime, now_utc, parse_at, parse_incident_id, parse_kind};
use anyhow::Result;
use calltree_core::domain::Incident;
use calltree_core::dto::IncidentDto;
use calltree_store::repo::{IncidentNew, IncidentUpdate};
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum IncidentCommand {
    /// Open a new incident now
    Start(StartArgs),
    /// Close the open incident now
    End,
    Status,
    /// Record a past incident
    Register(RegisterArgs),
    Edit(EditIncidentArgs),
    Rm(IncidentIdArgs),
    /// Ended incidents, newest first
    History,
    Show(IncidentIdArgs),
}

#[derive(Debug, Args)]
pub struct StartArgs {
    pub name: String,
    /// test|actual
    #[arg(long, default_value = "actual")]
    pub kind: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "actual")]
    pub kind: String,
    #[arg(long)]
    pub start: String,
    #[arg(long)]
    pub end: String,
}

#[derive(Debug, Args)]
pub struct EditIncidentArgs {
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub kind: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    /// Clear the end time, making this the open incident
    #[arg(long, conflicts_with = "end")]
    pub reopen: bool,
}

#[derive(Debug, Args)]
pub struct IncidentIdArgs {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct IncidentDetail {
    #[serde(flatten)]
    incident: IncidentDto,
    responses: i64,
}

pub fn start_incident(ctx: &Context<'_>, args: StartArgs) -> Result<()> {
    let kind = parse_kind(&args.kind)?;
    let now = now_utc();
    let incident = ctx.store.incidents().start(now, &args.name, kind)?;
    print_incident(ctx, &incident, now, "started")
}

pub fn end_incident(ctx: &Context<'_>) -> Result<()> {
    let now = now_utc();
    let incident = ctx.store.incidents().end_active(now)?;
    print_incident(ctx, &incident, now, "ended")
}

pub fn incident_status(ctx: &Context<'_>) -> Result<()> {
    let now = now_utc();
    let Some(incident) = ctx.store.incidents().active()? else {
        if ctx.json {
            return print_json(&Option::<IncidentDetail>::None);
        }
        println!("no active incident");
        return Ok(());
    };
    print_detail(ctx, &incident, now)
}

pub fn register_incident(ctx: &Context<'_>, args: RegisterArgs) -> Result<()> {
    let incident = ctx.store.incidents().register(IncidentNew {
        name: args.name,
        kind: parse_kind(&args.kind)?,
        start_time: parse_at(&args.start)?,
        end_time: parse_at(&args.end)?,
    })?;
    print_incident(ctx, &incident, now_utc(), "registered")
}

pub fn edit_incident(ctx: &Context<'_>, args: EditIncidentArgs) -> Result<()> {
    let id = parse_incident_id(args.id)?;
    let end_time = if args.reopen {
        Some(None)
    } else {
        args.end.as_deref().map(parse_at).transpose()?.map(Some)
    };
    let update = IncidentUpdate {
        name: args.name,
        kind: args.kind.as_deref().map(parse_kind).transpose()?,
        start_time: args.start.as_deref().map(parse_at).transpose()?,
        end_time,
    };
    if update.name.is_none()
        && update.kind.is_none()
        && update.start_time.is_none()
        && update.end_time.is_none()
    {
        return Err(invalid_input("no updates provided"));
    }

    let incident = ctx.store.incidents().update(id, update)?;
    print_incident(ctx, &incident, now_utc(), "updated")
}

pub fn delete_incident(ctx: &Context<'_>, args: IncidentIdArgs) -> Result<()> {
    let id = parse_incident_id(args.id)?;
    ctx.store.incidents().delete(id)?;
    if ctx.json {
        print_json(&serde_json::json!({ "id": id }))?;
    } else {
        println!("deleted incident {}", id);
    }
    Ok(())
}

pub fn incident_history(ctx: &Context<'_>) -> Result<()> {
    let now = now_utc();
    let items: Vec<IncidentDto> = ctx
        .store
        .incidents()
        .history()?
        .iter()
        .map(|incident| IncidentDto::from_incident(incident, now))
        .collect();

    if ctx.json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("no past incidents");
        return Ok(());
    }
    for item in &items {
        println!("{}", incident_line(item));
    }
    Ok(())
}

pub fn show_incident(ctx: &Context<'_>, args: IncidentIdArgs) -> Result<()> {
    let id = parse_incident_id(args.id)?;
    let incident = ctx
        .store
        .incidents()
        .get(id)?
        .ok_or_else(|| not_found(format!("incident {id}")))?;
    print_detail(ctx, &incident, now_utc())
}

fn print_incident(ctx: &Context<'_>, incident: &Incident, now: i64, verb: &str) -> Result<()> {
    let dto = IncidentDto::from_incident(incident, now);
    if ctx.json {
        return print_json(&dto);
    }
    println!("{verb} {}", incident_line(&dto));
    Ok(())
}

fn print_detail(ctx: &Context<'_>, incident: &Incident, now: i64) -> Result<()> {
    let (start, end) = incident.window(now);
    let detail = IncidentDetail {
        incident: IncidentDto::from_incident(incident, now),
        responses: ctx.store.responses().count_in_window(start, end)?,
    };
    if ctx.json {
        return print_json(&detail);
    }
    println!("{}", incident_line(&detail.incident));
    println!("responses: {}", detail.responses);
    Ok(())
}

pub fn incident_line(dto: &IncidentDto) -> String {
    let end = match dto.end_time {
        Some(end) => format_timestamp_datetime(end),
        None => "active".to_string(),
    };
    format!(
        "{}  {}  [{}]  {} .. {}  ({})",
        dto.id,
        dto.name,
        dto.kind.as_str(),
        format_timestamp_datetime(dto.start_time),
        end,
        dto.duration
    )
}
