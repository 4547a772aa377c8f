//! Public snapshot documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Classification, ClassificationRow};

/// Payload of one publication: the completed rows of a classification.
///
/// The generation time is not part of the payload; the publication target
/// stamps it with its own clock when the write lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotWrite {
    pub rows: Vec<ClassificationRow>,
}

impl SnapshotWrite {
    pub fn from_classification(classification: &Classification) -> Self {
        Self { rows: classification.completed_rows() }
    }
}

/// The public classification document as stored at the publication target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PublishedSnapshot {
    #[serde(rename = "generatedAt", default)]
    #[cfg_attr(feature = "tauri", specta(type = Option<String>))]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rows: Vec<ClassificationRow>,
}

/// Read model for the public live view, derived from a published snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicStandings {
    pub generated_at: Option<DateTime<Utc>>,
    pub rows: Vec<ClassificationRow>,
}

impl PublicStandings {
    /// Derive the public view. Rows without an elapsed time are dropped even if
    /// a writer included them.
    pub fn from_snapshot(snapshot: &PublishedSnapshot) -> Self {
        let rows = snapshot.rows.iter().filter(|row| row.is_completed()).cloned().collect();
        Self { generated_at: snapshot.generated_at, rows }
    }

    pub fn completed_count(&self) -> usize {
        self.rows.len()
    }
}
