//! Engine configuration
//!
//! Every field has a default, so an empty YAML document is a valid config.
//!
//! ```rust
//! use podium::StandingsConfig;
//!
//! let config = StandingsConfig::from_yaml_str("publish_debounce_ms: 250\n").unwrap();
//! assert_eq!(config.publish_debounce().as_millis(), 250);
//! assert_eq!(config.display.unnamed, "Sin nombre");
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::timing::UNAVAILABLE;
use crate::types::EventId;
use crate::{Result, StandingsError};

/// Upper bound accepted for the publication quiet window.
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandingsConfig {
    /// Quiet window before a recomputed classification is published.
    pub publish_debounce_ms: u64,
    /// Whether classifications are published at all.
    pub publish: bool,
    pub display: DisplayDefaults,
    pub publication: PublicationLocation,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            publish_debounce_ms: 600,
            publish: true,
            display: DisplayDefaults::default(),
            publication: PublicationLocation::default(),
        }
    }
}

impl StandingsConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| StandingsError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.publish_debounce_ms > MAX_DEBOUNCE_MS {
            return Err(StandingsError::config_error(
                "publish_debounce_ms",
                format!("{} exceeds the {} ms limit", self.publish_debounce_ms, MAX_DEBOUNCE_MS),
            ));
        }
        for (key, value) in [
            ("publication.root", &self.publication.root),
            ("publication.collection", &self.publication.collection),
            ("publication.document", &self.publication.document),
        ] {
            if value.trim().is_empty() || value.contains('/') {
                return Err(StandingsError::config_error(key, format!("invalid name '{value}'")));
            }
        }
        Ok(())
    }

    pub fn publish_debounce(&self) -> Duration {
        Duration::from_millis(self.publish_debounce_ms)
    }
}

/// Placeholders for competitor fields that are missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayDefaults {
    pub unnamed: String,
    pub missing_bib: String,
    pub missing_team: String,
}

impl Default for DisplayDefaults {
    fn default() -> Self {
        Self {
            unnamed: "Sin nombre".to_string(),
            missing_bib: UNAVAILABLE.to_string(),
            missing_team: UNAVAILABLE.to_string(),
        }
    }
}

impl DisplayDefaults {
    pub fn name(&self, name: Option<&str>) -> String {
        name.map_or_else(|| self.unnamed.clone(), str::to_owned)
    }

    pub fn bib(&self, bib: Option<&str>) -> String {
        non_empty(bib).map_or_else(|| self.missing_bib.clone(), str::to_owned)
    }

    pub fn team(&self, team: Option<&str>) -> String {
        non_empty(team).map_or_else(|| self.missing_team.clone(), str::to_owned)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Well-known location of the public classification document of an event:
/// `<root>/<event>/<collection>/<document>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationLocation {
    pub root: String,
    pub collection: String,
    pub document: String,
}

impl Default for PublicationLocation {
    fn default() -> Self {
        Self {
            root: "carreras".to_string(),
            collection: "clasificacionPublica".to_string(),
            document: "general".to_string(),
        }
    }
}

impl PublicationLocation {
    /// Document path of the public classification of `event_id`.
    pub fn path(&self, event_id: &EventId) -> String {
        format!("{}/{}/{}/{}", self.root, event_id, self.collection, self.document)
    }
}
