pub mod csv;
pub mod error;
pub mod export;
pub mod roster;

pub use error::{Result, SyncError};
pub use export::{export_pending, export_responses, export_unknown};
pub use roster::{parse_roster, ImportReport, ParsedRoster, RosterRow};
