//! Classification rows and the ranked classification of one event

use serde::{Deserialize, Serialize};

use super::{CompetitorId, EventId};

/// One row of the classification.
///
/// Field names on the wire follow the upstream document shape so the same rows
/// can be published, exported and read back by the public view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ClassificationRow {
    /// 1-based position in the classification.
    #[serde(rename = "posicion", alias = "position")]
    pub position: u32,
    #[serde(rename = "competidorId", default)]
    pub competitor_id: CompetitorId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "dorsal")]
    pub bib: String,
    pub team: String,
    /// Elapsed seconds; `None` for incomplete competitors.
    #[serde(rename = "elapsedSec", default)]
    pub elapsed_seconds: Option<i64>,
    /// Formatted elapsed time, or the unavailable marker.
    #[serde(rename = "tiempo")]
    pub time: String,
    /// Formatted gap to the leader (`+M:SS` / `+H:MM:SS`), or the unavailable marker.
    #[serde(rename = "diferencia")]
    pub gap: String,
}

impl ClassificationRow {
    pub fn is_completed(&self) -> bool {
        self.elapsed_seconds.is_some()
    }
}

/// The full classification of one event at one instant.
///
/// Rebuilt from scratch on every input change; never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Classification {
    pub event_id: EventId,
    pub rows: Vec<ClassificationRow>,
}

impl Classification {
    pub fn new(event_id: EventId, rows: Vec<ClassificationRow>) -> Self {
        Self { event_id, rows }
    }

    pub fn rows(&self) -> &[ClassificationRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows with a defined elapsed time.
    pub fn completed_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_completed()).count()
    }

    /// Completed rows only, in classification order, as shown publicly and exported.
    pub fn completed_rows(&self) -> Vec<ClassificationRow> {
        self.rows.iter().filter(|row| row.is_completed()).cloned().collect()
    }
}
