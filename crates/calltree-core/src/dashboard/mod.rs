pub mod filter;
pub mod stats;

pub use filter::{
    filter_options, parse_filter, DashboardFilter, FilterOptions, FilterParseError, StatusPreset,
};
pub use stats::{
    demographic_breakdown, pending, percent, responded, response_timeline, sort_contacts,
    status_breakdown, DashboardStats, Demographic, DemographicGroup, SortKey, StatusCount,
    TimelinePoint,
};

use crate::domain::RawResponse;
use crate::rules::{AmbiguousName, MatchOutcome, ProjectedContact};
use serde::{Deserialize, Serialize};

/// Everything one dashboard render needs, computed from a single match pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
    pub filter: DashboardFilter,
    pub options: FilterOptions,
    pub stats: DashboardStats,
    pub status_breakdown: Vec<StatusCount>,
    pub departments: Vec<DemographicGroup>,
    pub locations: Vec<DemographicGroup>,
    pub timeline: Vec<TimelinePoint>,
    pub responded: Vec<ProjectedContact>,
    pub pending: Vec<ProjectedContact>,
    pub unknown: Vec<RawResponse>,
    pub ambiguous: Vec<AmbiguousName>,
    pub superseded: usize,
}

impl DashboardView {
    /// Projects `outcome` through `filter`; `search` narrows the two contact
    /// tables only. Unknown responses are not tied to a contact, so the
    /// filter never hides them.
    pub fn build(outcome: &MatchOutcome, filter: &DashboardFilter, search: Option<&str>) -> Self {
        let selected = filter.apply(&outcome.contacts);

        Self {
            filter: filter.clone(),
            options: filter_options(&outcome.contacts),
            stats: DashboardStats::compute(&selected),
            status_breakdown: status_breakdown(&selected),
            departments: demographic_breakdown(&selected, Demographic::Department),
            locations: demographic_breakdown(&selected, Demographic::Location),
            timeline: response_timeline(&selected),
            responded: responded(&selected, search).into_iter().cloned().collect(),
            pending: pending(&selected, search).into_iter().cloned().collect(),
            unknown: outcome.unknown.clone(),
            ambiguous: outcome.ambiguous.clone(),
            superseded: outcome.superseded,
        }
    }
}
