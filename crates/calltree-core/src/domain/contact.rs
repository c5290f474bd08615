use crate::domain::ids::ContactId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub number: String,
    pub department: String,
    pub location: String,
    pub position: String,
    pub level: Option<String>,
}

impl Contact {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::EmptyContactName);
        }
        Ok(())
    }

    /// Level used for grouping; rosters without levels fall back to position.
    pub fn level_or_position(&self) -> &str {
        match self.level.as_deref() {
            Some(level) if !level.is_empty() => level,
            _ => &self.position,
        }
    }
}
