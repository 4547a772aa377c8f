//! Flat tabular view of a classification for spreadsheet and PDF collaborators

use super::{Classification, ClassificationRow};

/// Column headers of an exported classification.
pub const EXPORT_HEADERS: [&str; 6] = ["Posición", "Nombre", "Dorsal", "Team", "Tiempo", "Diferencia"];

/// Completed rows flattened to string cells, one array per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: [&'static str; 6],
    pub rows: Vec<[String; 6]>,
}

impl ExportTable {
    pub fn from_classification(classification: &Classification) -> Self {
        let rows = classification.completed_rows().iter().map(cells).collect();
        Self { headers: EXPORT_HEADERS, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cells(row: &ClassificationRow) -> [String; 6] {
    [
        row.position.to_string(),
        row.name.clone(),
        row.bib.clone(),
        row.team.clone(),
        row.time.clone(),
        row.gap.clone(),
    ]
}
