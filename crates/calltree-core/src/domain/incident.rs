use crate::domain::ids::IncidentId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Test,
    Actual,
}

impl IncidentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            IncidentKind::Test => "test",
            IncidentKind::Actual => "actual",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "test" | "drill" => Ok(IncidentKind::Test),
            "actual" | "real" => Ok(IncidentKind::Actual),
            _ => Err(CoreError::InvalidIncidentKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub name: String,
    pub kind: IncidentKind,
    pub start_time: i64,
    pub end_time: Option<i64>,
}

impl Incident {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Inclusive response window; an open incident runs until `now_utc`.
    pub fn window(&self, now_utc: i64) -> (i64, i64) {
        (self.start_time, self.end_time.unwrap_or(now_utc))
    }
}

pub fn validate_incident_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyIncidentName);
    }
    Ok(trimmed.to_string())
}

pub fn validate_incident_window(start_time: i64, end_time: Option<i64>) -> Result<(), CoreError> {
    match end_time {
        Some(end) if end < start_time => Err(CoreError::IncidentEndsBeforeStart),
        _ => Ok(()),
    }
}
