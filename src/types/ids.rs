//! Opaque identifiers for events and competitors

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, StandingsError};

/// Identifier of one race event (carrera).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Create an event id, rejecting values that cannot address a document.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() || value.contains('/') {
            return Err(StandingsError::InvalidEventId { value });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a competitor document within an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct CompetitorId(String);

impl CompetitorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompetitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompetitorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CompetitorId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<u32> for CompetitorId {
    fn from(value: u32) -> Self {
        Self::new(value.to_string())
    }
}
