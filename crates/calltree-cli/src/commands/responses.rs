use crate::commands::snapshot::{load_responses, resolve_incident};
use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use crate::util::{
    format_timestamp_datetime, now_millis, now_utc, parse_at, parse_contact_id, parse_status,
};
use anyhow::Result;
use calltree_core::domain::{Contact, RawResponse, ResponseId, ResponseOrigin};
use calltree_core::dto::ResponseDto;
use calltree_core::manual::compose_manual_entry;
use calltree_core::rules::RosterIndex;
use calltree_store::repo::ResponseNew;
use clap::{Args, Subcommand};
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Subcommand)]
pub enum ResponseCommand {
    /// Record an inbound message as delivered by the gateway
    Add(AddResponseArgs),
    /// Record a status on behalf of a contact
    Manual(ManualResponseArgs),
    Ls(ListResponsesArgs),
    Rm(DeleteResponseArgs),
}

#[derive(Debug, Args)]
pub struct AddResponseArgs {
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub text: String,
    /// Receive time (YYYY-MM-DD HH:MM[:SS], local); defaults to now
    #[arg(long)]
    pub at: Option<String>,
    /// Gateway message id; a uid already on file is rejected
    #[arg(long)]
    pub uid: Option<String>,
}

#[derive(Debug, Args)]
pub struct ManualResponseArgs {
    pub contact_id: String,
    #[arg(long)]
    pub status: String,
    #[arg(long)]
    pub message: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListResponsesArgs {
    #[arg(long)]
    pub incident: Option<i64>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DeleteResponseArgs {
    pub id: String,
}

pub fn add_response(ctx: &Context<'_>, args: AddResponseArgs) -> Result<()> {
    if args.from.trim().is_empty() {
        return Err(invalid_input("--from cannot be empty"));
    }
    let now = now_utc();
    let received_at = match args.at.as_deref() {
        Some(raw) => parse_at(raw)?,
        None => now,
    };
    let stored = ctx.store.responses().add(
        now,
        ResponseNew {
            uid: args.uid,
            sender: args.from,
            contents: args.text,
            received_at,
            origin: ResponseOrigin::Sms,
        },
    )?;
    let roster = ctx.store.contacts().list_all()?;
    report_stored(ctx, &roster, stored)
}

pub fn manual_response(ctx: &Context<'_>, args: ManualResponseArgs) -> Result<()> {
    let id = parse_contact_id(&args.contact_id)?;
    let status = parse_status(&args.status)?;
    let contact = ctx
        .store
        .contacts()
        .get(id)?
        .ok_or_else(|| not_found("contact not found"))?;
    let roster = ctx.store.contacts().list_all()?;

    let mut entry = compose_manual_entry(&contact, status, args.message.as_deref(), now_millis())?;
    // The gateway spelling (+63...) and a local roster spelling (09...) are
    // different match keys; the entry must land on this contact.
    let (matched, _) = RosterIndex::new(&roster).match_response(&entry);
    if matched.map(|found| found.id) != Some(contact.id) {
        debug!(
            sender = %entry.sender,
            number = %contact.number,
            "gateway-form sender misses the roster key, using the roster number"
        );
        entry.sender = contact.number.clone();
    }

    let stored = ctx.store.responses().add(now_utc(), entry.into())?;
    if ctx.store.incidents().active()?.is_none() {
        warn!("no active incident; the manual entry only shows for incidents covering its time");
    }
    report_stored(ctx, &roster, stored)
}

pub fn list_responses(ctx: &Context<'_>, args: ListResponsesArgs) -> Result<()> {
    let incident = resolve_incident(ctx, args.incident)?;
    let (roster, responses) = load_responses(ctx, &incident, now_utc())?;
    let index = RosterIndex::new(&roster);
    let limit = args.limit.unwrap_or(usize::MAX);

    let items: Vec<ResponseDto> = responses
        .iter()
        .take(limit)
        .map(|response| {
            let (contact, result) = index.match_response(response);
            ResponseDto::from_match(response, contact, result)
        })
        .collect();

    if ctx.json {
        return print_json(&items);
    }

    if items.is_empty() {
        println!("no responses for incident {}", incident.id);
        return Ok(());
    }

    for item in items {
        println!(
            "{}  {}  {}  {}  {}",
            format_timestamp_datetime(item.received_at),
            item.sender,
            item.status,
            item.contact_name.as_deref().unwrap_or("?"),
            item.contents,
        );
    }
    Ok(())
}

pub fn delete_response(ctx: &Context<'_>, args: DeleteResponseArgs) -> Result<()> {
    let raw = args.id.trim();
    let id = ResponseId::from_str(raw)
        .map_err(|_| invalid_input(format!("invalid response id: {raw}")))?;
    ctx.store.responses().delete(id)?;
    if ctx.json {
        print_json(&serde_json::json!({ "id": id }))?;
    } else {
        println!("deleted {}", id);
    }
    Ok(())
}

/// Echoes how the current roster reads a freshly stored response.
fn report_stored(ctx: &Context<'_>, roster: &[Contact], stored: RawResponse) -> Result<()> {
    let (contact, result) = RosterIndex::new(roster).match_response(&stored);
    let dto = ResponseDto::from_match(&stored, contact, result);

    if ctx.json {
        return print_json(&dto);
    }

    match dto.contact_name.as_deref() {
        Some(name) => println!("recorded {} {} for {}", dto.id, dto.status, name),
        None => println!(
            "recorded {} {} (unmatched sender {})",
            dto.id, dto.status, dto.sender
        ),
    }
    Ok(())
}
