pub mod dashboard;
pub mod domain;
pub mod dto;
pub mod error;
pub mod manual;
pub mod rules;
pub mod time;

pub use dashboard::{parse_filter, DashboardFilter, DashboardView, FilterParseError, StatusPreset};
pub use domain::*;
pub use dto::*;
pub use error::CoreError;
pub use manual::compose_manual_entry;
pub use rules::*;

pub type Result<T> = std::result::Result<T, CoreError>;
