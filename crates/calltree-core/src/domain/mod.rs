pub mod contact;
pub mod ids;
pub mod incident;
pub mod phone;
pub mod response;
pub mod status;

pub use contact::Contact;
pub use ids::{ContactId, IncidentId, ResponseId};
pub use incident::{validate_incident_name, validate_incident_window, Incident, IncidentKind};
pub use phone::{format_phone_display, normalize_phone};
pub use response::{RawResponse, ResponseOrigin};
pub use status::Status;
