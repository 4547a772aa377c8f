//! Competitor records as delivered by the competitor directory

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{CompetitorId, ObservationRecord};

/// A registered competitor (competidor) of one event.
///
/// Registration happens elsewhere; the engine only reads these records.
/// Display fields stay optional here and receive their placeholders when a
/// classification row is built.
///
/// Deserializing goes through [`CompetitorRecord::from_document`], so serde
/// input gets the same permissive treatment; only a missing `id` is an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorRecord {
    pub id: CompetitorId,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    /// Bib (dorsal) number, normalized to a string.
    #[serde(rename = "dorsal", default)]
    pub bib: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    /// Observations embedded directly on the record (`tiempos`).
    #[serde(rename = "tiempos", default)]
    pub embedded: Option<Vec<ObservationRecord>>,
}

impl CompetitorRecord {
    pub fn new(id: impl Into<CompetitorId>) -> Self {
        Self { id: id.into(), name: None, bib: None, team: None, embedded: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_bib(mut self, bib: impl Into<String>) -> Self {
        self.bib = Some(bib.into());
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_embedded(mut self, observations: Vec<ObservationRecord>) -> Self {
        self.embedded = Some(observations);
        self
    }

    /// Decode a raw competitor document.
    ///
    /// Wrong-typed fields are treated as absent. A numeric `dorsal` is
    /// normalized to its decimal string; a `tiempos` value that is not an array
    /// is ignored, and each array entry decodes like a sub-collection record.
    pub fn from_document(id: impl Into<CompetitorId>, document: &Value) -> Self {
        let text = |key: &str| document.get(key).and_then(Value::as_str).map(str::to_owned);

        let bib = document.get("dorsal").and_then(scalar_text);

        let embedded = document
            .get("tiempos")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(ObservationRecord::from_document).collect());

        Self { id: id.into(), name: text("nombre"), bib, team: text("team"), embedded }
    }
}

impl<'de> Deserialize<'de> for CompetitorRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let document = Value::deserialize(deserializer)?;
        let id = document.get("id").and_then(scalar_text).ok_or_else(|| D::Error::missing_field("id"))?;
        Ok(Self::from_document(id, &document))
    }
}

/// String form of a string or number; whole floats render without a fraction.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Number(n) => n.as_f64().map(|f| {
            if f.fract() == 0.0 && f.abs() < 1e15 { (f as i64).to_string() } else { f.to_string() }
        }),
        _ => None,
    }
}
