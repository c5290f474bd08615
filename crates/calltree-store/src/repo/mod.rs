pub mod contacts;
pub mod incidents;
pub mod responses;

pub use contacts::{ContactNew, ContactUpdate, ContactsRepo, UpsertOutcome};
pub use incidents::{IncidentNew, IncidentUpdate, IncidentsRepo};
pub use responses::{ResponseNew, ResponsesRepo};
