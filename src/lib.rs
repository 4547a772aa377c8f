//! Live race classification engine.
//!
//! Podium turns the raw checkpoint timestamps of a running event into an
//! ordered, gap-annotated classification and keeps it current while
//! competitors and timestamps change upstream.
//!
//! # Features
//!
//! - **Timestamp normalization**: native instants, `{seconds}` objects, epoch
//!   milliseconds and date strings all reduce to epoch seconds
//! - **Ranking**: completed competitors by elapsed time, gaps to the leader,
//!   incomplete competitors listed after them
//! - **Live aggregation**: one subscription per competitor, reconciled as the
//!   competitor list changes
//! - **Publication**: settled classifications are merged into a public document
//!
//! ## Example
//!
//! ```rust
//! use podium::{MemoryDirectory, Podium, StandingsConfig};
//! use podium::types::{CompetitorRecord, EventId, ObservationRecord};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> podium::Result<()> {
//!     let directory = Arc::new(MemoryDirectory::new());
//!     let race = EventId::new("race-1")?;
//!     directory.set_competitors(
//!         &race,
//!         vec![CompetitorRecord::new("7").with_name("Ana").with_embedded(vec![
//!             ObservationRecord::epoch_seconds(100),
//!             ObservationRecord::epoch_seconds(160),
//!         ])],
//!     );
//!
//!     let mut live = Podium::live(directory, None, StandingsConfig::default(), race).await;
//!     let mut updates = live.subscribe();
//!     updates.wait_for(Option::is_some).await.ok();
//!
//!     let classification = live.current().unwrap();
//!     assert_eq!(classification.rows[0].time, "1:00");
//!     live.deactivate().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Derivation pipeline
pub mod ranking;
pub mod timing;

// Live aggregation and publication
pub mod controller;
pub mod directories;
pub mod directory;
pub mod publish;
pub mod stream;

// Core exports
pub use config::{DisplayDefaults, PublicationLocation, StandingsConfig};
pub use error::*;
pub use types::*;

// Main API exports
pub use controller::{LiveStandings, StandingsState};
pub use directories::MemoryDirectory;
pub use directory::{CompetitorDirectory, CompetitorFeed, ObservationFeed};
pub use publish::{MemoryPublicationTarget, PublicationTarget, Publisher};
pub use ranking::{Entrant, classify, rank};

use std::sync::Arc;

/// Unified entry point for live classifications.
///
/// ```rust,no_run
/// use podium::{MemoryDirectory, MemoryPublicationTarget, Podium, PublicationTarget, StandingsConfig};
/// use podium::types::EventId;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> podium::Result<()> {
/// let config = StandingsConfig::from_path("podium.yaml")?;
/// let target: Arc<dyn PublicationTarget> = Arc::new(MemoryPublicationTarget::new());
/// let live = Podium::live(Arc::new(MemoryDirectory::new()), Some(target), config, EventId::new("race-1")?).await;
/// # Ok(())
/// # }
/// ```
pub struct Podium;

impl Podium {
    /// Follow the classification of `event_id`, publishing settled
    /// classifications to `target` when one is given and the config allows it.
    pub async fn live(
        directory: Arc<dyn CompetitorDirectory>,
        target: Option<Arc<dyn PublicationTarget>>,
        config: StandingsConfig,
        event_id: EventId,
    ) -> LiveStandings {
        let mut live = LiveStandings::new(directory, config);
        if let Some(target) = target {
            live = live.with_publication(target);
        }
        live.activate(event_id).await;
        live
    }
}
