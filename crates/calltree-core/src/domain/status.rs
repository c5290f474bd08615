use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity reported by a responder. `NoResponse` means no classifiable
/// reply was seen and sits outside the severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Safe,
    Slight,
    Moderate,
    Severe,
    #[serde(rename = "No Response")]
    NoResponse,
}

const KEYWORDS: &[(&str, Status)] = &[
    ("1", Status::Safe),
    ("1.0", Status::Safe),
    ("safe", Status::Safe),
    ("unaffected", Status::Safe),
    ("ok", Status::Safe),
    ("2", Status::Slight),
    ("2.0", Status::Slight),
    ("slight", Status::Slight),
    ("minor", Status::Slight),
    ("3", Status::Moderate),
    ("3.0", Status::Moderate),
    ("moderate", Status::Moderate),
    ("4", Status::Severe),
    ("4.0", Status::Severe),
    ("severe", Status::Severe),
    ("help", Status::Severe),
    ("critical", Status::Severe),
];

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Safe => "Safe",
            Status::Slight => "Slight",
            Status::Moderate => "Moderate",
            Status::Severe => "Severe",
            Status::NoResponse => "No Response",
        }
    }

    /// Statuses in dashboard display order.
    pub const fn all() -> &'static [Status] {
        &[
            Status::Safe,
            Status::Slight,
            Status::Moderate,
            Status::Severe,
            Status::NoResponse,
        ]
    }

    pub const fn affected() -> &'static [Status] {
        &[Status::Slight, Status::Moderate, Status::Severe]
    }

    /// Rank in the severity order, `None` for `NoResponse`.
    pub const fn severity(self) -> Option<u8> {
        match self {
            Status::Safe => Some(0),
            Status::Slight => Some(1),
            Status::Moderate => Some(2),
            Status::Severe => Some(3),
            Status::NoResponse => None,
        }
    }

    pub const fn is_responded(self) -> bool {
        !matches!(self, Status::NoResponse)
    }

    /// Numeric reply code ("1".."4") used when composing synthetic replies.
    pub const fn code(self) -> Option<&'static str> {
        match self {
            Status::Safe => Some("1"),
            Status::Slight => Some("2"),
            Status::Moderate => Some("3"),
            Status::Severe => Some("4"),
            Status::NoResponse => None,
        }
    }

    /// Looks up a lower-cased reply keyword.
    pub fn from_keyword(keyword: &str) -> Option<Status> {
        KEYWORDS
            .iter()
            .find(|(candidate, _)| *candidate == keyword)
            .map(|(_, status)| *status)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "safe" => Ok(Status::Safe),
            "slight" => Ok(Status::Slight),
            "moderate" => Ok(Status::Moderate),
            "severe" => Ok(Status::Severe),
            "no response" | "no-response" | "none" | "pending" => Ok(Status::NoResponse),
            _ => Err(CoreError::InvalidStatus(s.to_string())),
        }
    }
}
