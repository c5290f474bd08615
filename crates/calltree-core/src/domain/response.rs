use crate::domain::ids::ResponseId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// How a response entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrigin {
    #[default]
    Sms,
    Manual,
}

impl ResponseOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResponseOrigin::Sms => "sms",
            ResponseOrigin::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "sms" => Ok(ResponseOrigin::Sms),
            "manual" => Ok(ResponseOrigin::Manual),
            _ => Err(CoreError::InvalidResponseOrigin(value.to_string())),
        }
    }
}

/// An inbound message as stored. `sender` is kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    pub id: ResponseId,
    pub uid: Option<String>,
    pub sender: String,
    pub contents: String,
    pub received_at: i64,
    pub origin: ResponseOrigin,
}
