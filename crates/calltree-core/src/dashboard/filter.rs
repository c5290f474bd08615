use crate::domain::Status;
use crate::rules::ProjectedContact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("empty value for {0}")]
    EmptyValue(String),
    #[error("unknown filter key: {0}")]
    UnknownKey(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("invalid preset: {0}")]
    InvalidPreset(String),
    #[error("unterminated quote")]
    UnterminatedQuote,
}

/// Status shortcuts behind the KPI cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPreset {
    All,
    Responded,
    Safe,
    Affected,
    Pending,
}

impl StatusPreset {
    pub fn parse(value: &str) -> Result<Self, FilterParseError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusPreset::All),
            "responded" => Ok(StatusPreset::Responded),
            "safe" => Ok(StatusPreset::Safe),
            "affected" => Ok(StatusPreset::Affected),
            "pending" => Ok(StatusPreset::Pending),
            _ => Err(FilterParseError::InvalidPreset(value.to_string())),
        }
    }

    pub fn statuses(self) -> Vec<Status> {
        match self {
            StatusPreset::All => Vec::new(),
            StatusPreset::Responded => vec![
                Status::Safe,
                Status::Slight,
                Status::Moderate,
                Status::Severe,
            ],
            StatusPreset::Safe => vec![Status::Safe],
            StatusPreset::Affected => Status::affected().to_vec(),
            StatusPreset::Pending => vec![Status::NoResponse],
        }
    }
}

/// Dashboard selection. An empty list places no constraint on that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub departments: Vec<String>,
    pub locations: Vec<String>,
    pub levels: Vec<String>,
    pub statuses: Vec<Status>,
}

impl DashboardFilter {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
            && self.locations.is_empty()
            && self.levels.is_empty()
            && self.statuses.is_empty()
    }

    pub fn with_preset(mut self, preset: StatusPreset) -> Self {
        self.statuses = preset.statuses();
        self
    }

    pub fn matches(&self, projected: &ProjectedContact) -> bool {
        let contact = &projected.contact;
        if !self.departments.is_empty() && !self.departments.contains(&contact.department) {
            return false;
        }
        if !self.locations.is_empty() && !self.locations.contains(&contact.location) {
            return false;
        }
        if !self.levels.is_empty()
            && !self
                .levels
                .iter()
                .any(|level| level == contact.level_or_position())
        {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&projected.status) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, contacts: &'a [ProjectedContact]) -> Vec<&'a ProjectedContact> {
        contacts.iter().filter(|c| self.matches(c)).collect()
    }

    /// Initial selection when nobody picked one: departments that already
    /// have at least one reply. Empty when nobody has replied yet.
    pub fn responded_departments(contacts: &[ProjectedContact]) -> Self {
        let departments: BTreeSet<&str> = contacts
            .iter()
            .filter(|c| c.status.is_responded() && !c.contact.department.is_empty())
            .map(|c| c.contact.department.as_str())
            .collect();
        Self {
            departments: departments.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }
}

/// Values available for each filter field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub departments: Vec<String>,
    pub locations: Vec<String>,
    pub levels: Vec<String>,
}

pub fn filter_options(contacts: &[ProjectedContact]) -> FilterOptions {
    fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
        values
            .filter(|value| !value.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    FilterOptions {
        departments: unique(contacts.iter().map(|c| c.contact.department.as_str())),
        locations: unique(contacts.iter().map(|c| c.contact.location.as_str())),
        levels: unique(contacts.iter().map(|c| c.contact.level_or_position())),
    }
}

/// Parses `dept:Finance loc:"Quezon City" level:L3 status:severe is:pending`.
/// Repeated keys accumulate; `is:` replaces the status list with a preset.
pub fn parse_filter(input: &str) -> Result<DashboardFilter, FilterParseError> {
    let mut filter = DashboardFilter::default();

    for term in split_terms(input)? {
        let Some((key, value)) = term.split_once(':') else {
            return Err(FilterParseError::UnknownKey(term));
        };
        if value.is_empty() {
            return Err(FilterParseError::EmptyValue(key.to_string()));
        }
        match key.to_ascii_lowercase().as_str() {
            "dept" | "department" => filter.departments.push(value.to_string()),
            "loc" | "location" => filter.locations.push(value.to_string()),
            "level" | "position" => filter.levels.push(value.to_string()),
            "status" => {
                let status = value
                    .parse::<Status>()
                    .map_err(|_| FilterParseError::InvalidStatus(value.to_string()))?;
                if !filter.statuses.contains(&status) {
                    filter.statuses.push(status);
                }
            }
            "is" => filter.statuses = StatusPreset::parse(value)?.statuses(),
            _ => return Err(FilterParseError::UnknownKey(key.to_string())),
        }
    }

    Ok(filter)
}

fn split_terms(input: &str) -> Result<Vec<String>, FilterParseError> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in input.chars() {
        match ch {
            '"' => quoted = !quoted,
            ch if ch.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            ch => current.push(ch),
        }
    }

    if quoted {
        return Err(FilterParseError::UnterminatedQuote);
    }
    if !current.is_empty() {
        terms.push(current);
    }
    Ok(terms)
}
