use crate::commands::Context;
use crate::error::not_found;
use crate::util::{now_utc, parse_incident_id};
use anyhow::{Context as _, Result};
use calltree_core::domain::{Contact, Incident, RawResponse};
use calltree_core::rules::{match_responses, MatchOutcome};
use tracing::{debug, warn};

/// One consistent read of the roster and an incident's responses, matched.
pub struct Snapshot {
    pub incident: Incident,
    pub outcome: MatchOutcome,
    pub loaded_at: i64,
}

/// `--incident <id>` when given, otherwise the incident currently open.
pub fn resolve_incident(ctx: &Context<'_>, id: Option<i64>) -> Result<Incident> {
    match id {
        Some(raw) => {
            let id = parse_incident_id(raw)?;
            ctx.store
                .incidents()
                .get(id)?
                .ok_or_else(|| not_found(format!("incident {id}")))
        }
        None => ctx.store.incidents().active()?.ok_or_else(|| {
            not_found("no active incident (start one or pass --incident <id>)")
        }),
    }
}

/// Roster and the incident's window of responses, newest first. An open
/// incident's window ends at the moment of loading.
pub fn load_responses(
    ctx: &Context<'_>,
    incident: &Incident,
    now: i64,
) -> Result<(Vec<Contact>, Vec<RawResponse>)> {
    let (start, end) = incident.window(now);
    let roster = ctx
        .store
        .contacts()
        .list_all()
        .with_context(|| "load roster")?;
    let responses = ctx
        .store
        .responses()
        .list_in_window(start, end, ctx.config.page_size)
        .with_context(|| format!("load responses for incident {}", incident.id))?;
    debug!(
        incident = %incident.id,
        contacts = roster.len(),
        responses = responses.len(),
        page_size = ctx.config.page_size,
        "responses loaded"
    );
    Ok((roster, responses))
}

pub fn load_snapshot(ctx: &Context<'_>, incident_id: Option<i64>) -> Result<Snapshot> {
    let incident = resolve_incident(ctx, incident_id)?;
    let loaded_at = now_utc();
    let (roster, responses) = load_responses(ctx, &incident, loaded_at)?;
    let outcome = match_responses(&roster, &responses);

    for ambiguous in &outcome.ambiguous {
        warn!(
            response = %ambiguous.response_id,
            name = %ambiguous.candidate,
            candidates = ambiguous.contact_ids.len(),
            "name fits several contacts, response left unmatched"
        );
    }
    if outcome.superseded > 0 {
        debug!(superseded = outcome.superseded, "older replies superseded");
    }

    Ok(Snapshot {
        incident,
        outcome,
        loaded_at,
    })
}
