use crate::error::invalid_input;
use anyhow::Result;
use calltree_core::domain::{ContactId, IncidentId, IncidentKind, Status};
use calltree_core::time::parse_local_timestamp;
use std::str::FromStr;

pub use calltree_core::time::{format_timestamp_datetime, format_timestamp_time, now_millis, now_utc};

pub fn parse_contact_id(raw: &str) -> Result<ContactId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("contact id cannot be empty"));
    }
    ContactId::from_str(trimmed)
        .map_err(|_| invalid_input(format!("invalid contact id: {trimmed}")))
}

pub fn parse_incident_id(raw: i64) -> Result<IncidentId> {
    if raw <= 0 {
        return Err(invalid_input(format!("invalid incident id: {raw}")));
    }
    Ok(IncidentId(raw))
}

pub fn parse_status(raw: &str) -> Result<Status> {
    Ok(Status::from_str(raw)?)
}

pub fn parse_kind(raw: &str) -> Result<IncidentKind> {
    Ok(IncidentKind::parse(raw)?)
}

pub fn parse_at(raw: &str) -> Result<i64> {
    Ok(parse_local_timestamp(raw)?)
}

/// Empty strings clear an optional field.
pub fn normalize_optional_value(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
