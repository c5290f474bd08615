use crate::domain::{
    Contact, ContactId, Incident, IncidentId, IncidentKind, RawResponse, ResponseId,
    ResponseOrigin, Status,
};
use crate::rules::{MatchKind, MatchResult};
use crate::time::format_duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDto {
    pub id: IncidentId,
    pub name: String,
    pub kind: IncidentKind,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub active: bool,
    pub duration: String,
}

impl IncidentDto {
    pub fn from_incident(incident: &Incident, now_utc: i64) -> Self {
        let (start, end) = incident.window(now_utc);
        Self {
            id: incident.id,
            name: incident.name.clone(),
            kind: incident.kind,
            start_time: incident.start_time,
            end_time: incident.end_time,
            active: incident.is_active(),
            duration: format_duration(start, end),
        }
    }
}

/// One stored response with how the current roster reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDto {
    pub id: ResponseId,
    pub uid: Option<String>,
    pub sender: String,
    pub contents: String,
    pub received_at: i64,
    pub origin: ResponseOrigin,
    pub status: Status,
    pub residual: String,
    pub contact_id: Option<ContactId>,
    pub contact_name: Option<String>,
    pub match_kind: Option<MatchKind>,
}

impl ResponseDto {
    pub fn from_match(
        response: &RawResponse,
        contact: Option<&Contact>,
        result: MatchResult,
    ) -> Self {
        Self {
            id: response.id,
            uid: response.uid.clone(),
            sender: response.sender.clone(),
            contents: response.contents.clone(),
            received_at: response.received_at,
            origin: response.origin,
            status: result.status,
            residual: result.residual,
            contact_id: contact.map(|c| c.id),
            contact_name: contact.map(|c| c.name.clone()),
            match_kind: result.kind,
        }
    }
}
