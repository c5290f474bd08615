use crate::domain::Status;
use crate::rules::ProjectedContact;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

const UNKNOWN_GROUP: &str = "Unknown";

/// KPI counts over a (filtered) set of projected contacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: usize,
    pub responded: usize,
    pub safe: usize,
    pub affected: usize,
    pub slight: usize,
    pub moderate: usize,
    pub severe: usize,
    pub pending: usize,
}

impl DashboardStats {
    pub fn compute(contacts: &[&ProjectedContact]) -> Self {
        let mut stats = DashboardStats {
            total: contacts.len(),
            ..DashboardStats::default()
        };
        for projected in contacts {
            match projected.status {
                Status::Safe => stats.safe += 1,
                Status::Slight => stats.slight += 1,
                Status::Moderate => stats.moderate += 1,
                Status::Severe => stats.severe += 1,
                Status::NoResponse => stats.pending += 1,
            }
        }
        stats.affected = stats.slight + stats.moderate + stats.severe;
        stats.responded = stats.safe + stats.affected;
        stats
    }

    pub fn response_rate_pct(&self) -> u32 {
        percent(self.responded, self.total)
    }

    pub fn safe_pct_of_responders(&self) -> u32 {
        percent(self.safe, self.responded)
    }

    pub fn severe_pct_of_responders(&self) -> u32 {
        percent(self.severe, self.responded)
    }

    pub fn pending_pct(&self) -> u32 {
        percent(self.pending, self.total)
    }
}

/// Whole percent, halves rounded up; zero when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = (part as u64 * 200 + whole as u64) / (2 * whole as u64);
    scaled as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

/// Counts per status in display order, zero counts left out.
pub fn status_breakdown(contacts: &[&ProjectedContact]) -> Vec<StatusCount> {
    Status::all()
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: contacts.iter().filter(|c| c.status == *status).count(),
        })
        .filter(|entry| entry.count > 0)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demographic {
    Department,
    Location,
}

impl Demographic {
    pub const fn label(self) -> &'static str {
        match self {
            Demographic::Department => "Department",
            Demographic::Location => "Location",
        }
    }

    fn key(self, projected: &ProjectedContact) -> &str {
        let value = match self {
            Demographic::Department => projected.contact.department.as_str(),
            Demographic::Location => projected.contact.location.as_str(),
        };
        if value.is_empty() {
            UNKNOWN_GROUP
        } else {
            value
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicGroup {
    pub name: String,
    pub total: usize,
    pub counts: Vec<StatusCount>,
}

/// Status counts per department or location, largest groups first.
pub fn demographic_breakdown(
    contacts: &[&ProjectedContact],
    by: Demographic,
) -> Vec<DemographicGroup> {
    let mut grouped: HashMap<&str, Vec<&ProjectedContact>> = HashMap::new();
    for projected in contacts {
        grouped.entry(by.key(projected)).or_default().push(projected);
    }

    let mut groups: Vec<DemographicGroup> = grouped
        .into_iter()
        .map(|(name, members)| DemographicGroup {
            name: name.to_string(),
            total: members.len(),
            counts: status_breakdown(&members),
        })
        .collect();
    groups.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub at: i64,
    pub cumulative: usize,
}

/// Cumulative replies over time, oldest first.
pub fn response_timeline(contacts: &[&ProjectedContact]) -> Vec<TimelinePoint> {
    let mut times: Vec<i64> = contacts
        .iter()
        .filter(|c| c.status.is_responded())
        .filter_map(|c| c.response_at)
        .collect();
    times.sort_unstable();
    times
        .into_iter()
        .enumerate()
        .map(|(index, at)| TimelinePoint {
            at,
            cumulative: index + 1,
        })
        .collect()
}

/// Contacts with a classified reply, optionally narrowed by a case-insensitive
/// search over name, status, department, position and normalized number.
pub fn responded<'a>(
    contacts: &[&'a ProjectedContact],
    search: Option<&str>,
) -> Vec<&'a ProjectedContact> {
    let needle = search_needle(search);
    contacts
        .iter()
        .copied()
        .filter(|c| c.status.is_responded())
        .filter(|c| {
            matches_search(
                needle.as_deref(),
                &[
                    c.contact.name.as_str(),
                    c.status.as_str(),
                    c.contact.department.as_str(),
                    c.contact.position.as_str(),
                    c.normalized_number.as_str(),
                ],
            )
        })
        .collect()
}

/// Contacts still awaiting a reply, optionally narrowed by a case-insensitive
/// search over name, department, position and number.
pub fn pending<'a>(
    contacts: &[&'a ProjectedContact],
    search: Option<&str>,
) -> Vec<&'a ProjectedContact> {
    let needle = search_needle(search);
    contacts
        .iter()
        .copied()
        .filter(|c| c.status == Status::NoResponse)
        .filter(|c| {
            matches_search(
                needle.as_deref(),
                &[
                    c.contact.name.as_str(),
                    c.contact.department.as_str(),
                    c.contact.position.as_str(),
                    c.contact.number.as_str(),
                ],
            )
        })
        .collect()
}

fn search_needle(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn matches_search(needle: Option<&str>, fields: &[&str]) -> bool {
    match needle {
        None => true,
        Some(needle) => fields
            .iter()
            .any(|field| field.to_lowercase().contains(needle)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Status,
    Department,
    Position,
    Location,
    Time,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Some(SortKey::Name),
            "status" => Some(SortKey::Status),
            "department" | "dept" => Some(SortKey::Department),
            "position" => Some(SortKey::Position),
            "location" | "loc" => Some(SortKey::Location),
            "time" | "datetime" => Some(SortKey::Time),
            _ => None,
        }
    }
}

/// Stable sort of a table. Text columns compare case-insensitively; contacts
/// without a reply sort as time zero.
pub fn sort_contacts(rows: &mut [&ProjectedContact], key: SortKey, descending: bool) {
    rows.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Time => a.response_at.unwrap_or(0).cmp(&b.response_at.unwrap_or(0)),
            SortKey::Name => cmp_text(&a.contact.name, &b.contact.name),
            SortKey::Status => cmp_text(a.status.as_str(), b.status.as_str()),
            SortKey::Department => cmp_text(&a.contact.department, &b.contact.department),
            SortKey::Position => cmp_text(&a.contact.position, &b.contact.position),
            SortKey::Location => cmp_text(&a.contact.location, &b.contact.location),
        };
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
