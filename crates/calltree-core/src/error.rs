use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("contact name is required")]
    EmptyContactName,
    #[error("incident name is required")]
    EmptyIncidentName,
    #[error("incident ends before it starts")]
    IncidentEndsBeforeStart,
    #[error("an incident is already active: {0}")]
    IncidentAlreadyActive(String),
    #[error("no active incident")]
    NoActiveIncident,
    #[error("invalid incident kind: {0}")]
    InvalidIncidentKind(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("manual entries need a concrete status, not {0}")]
    ManualEntryWithoutStatus(&'static str),
    #[error("contact number is missing")]
    MissingContactNumber,
    #[error("invalid response origin: {0}")]
    InvalidResponseOrigin(String),
    #[error("invalid timestamp")]
    InvalidTimestamp,
}
