//! Core types for live classification.
//!
//! This module provides the data model shared by every stage of the engine:
//! - [`CompetitorRecord`] is a registered competitor as read from the directory
//! - [`ObservationRecord`] and [`TimestampLike`] carry checkpoint timestamps in
//!   whatever representation the organizer's data uses
//! - [`ClassificationRow`] and [`Classification`] are the ranked, gap-annotated output
//! - [`SnapshotWrite`], [`PublishedSnapshot`] and [`PublicStandings`] form the
//!   public read model
//!
//! ## Usage Example
//!
//! ```rust
//! use podium::types::{CompetitorRecord, ObservationRecord};
//! use serde_json::json;
//!
//! let record = CompetitorRecord::from_document(
//!     "c-17",
//!     &json!({ "nombre": "Ana", "dorsal": 17, "tiempos": [{ "timestamp": { "seconds": 100 } }] }),
//! );
//! assert_eq!(record.bib.as_deref(), Some("17"));
//!
//! let first = &record.embedded.unwrap()[0];
//! assert_eq!(first.epoch_seconds_value(), Some(100));
//! assert_eq!(ObservationRecord::epoch_seconds(160).epoch_seconds_value(), Some(160));
//! ```

mod classification;
mod competitor;
mod export;
mod ids;
mod observation;
mod snapshot;

pub use classification::{Classification, ClassificationRow};
pub use competitor::CompetitorRecord;
pub use export::{EXPORT_HEADERS, ExportTable};
pub use ids::{CompetitorId, EventId};
pub use observation::{ObservationRecord, TIMESTAMP_FIELD, TimestampLike};
pub use snapshot::{PublicStandings, PublishedSnapshot, SnapshotWrite};
