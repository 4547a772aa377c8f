//! Directory trait for upstream competitor data

use futures::stream::BoxStream;

use crate::Result;
use crate::types::{CompetitorId, CompetitorRecord, EventId, ObservationRecord};

/// Live feed of an event's full competitor list.
pub type CompetitorFeed = BoxStream<'static, Result<Vec<CompetitorRecord>>>;

/// Live feed of one competitor's full timestamp sub-collection.
pub type ObservationFeed = BoxStream<'static, Result<Vec<ObservationRecord>>>;

/// Trait for competitor data sources
///
/// Directories abstract over where competitors and their timestamps live (a
/// document store, an in-memory fixture). Every feed item is a complete
/// snapshot of the watched set, not a delta. Dropping a feed cancels the
/// underlying subscription immediately.
///
/// Feeds report upstream failures as `Err` items and keep running; a feed that
/// ends has stopped for good.
pub trait CompetitorDirectory: Send + Sync + 'static {
    /// Subscribe to the competitor list of `event_id`, in arrival order.
    fn competitors(&self, event_id: &EventId) -> CompetitorFeed;

    /// Subscribe to the timestamp sub-collection of one competitor, ordered
    /// ascending by observed instant.
    fn observations(&self, event_id: &EventId, competitor_id: &CompetitorId) -> ObservationFeed;
}
