//! Publication of classifications to the public read model
//!
//! The organizer-side engine owns the expensive, access-controlled inputs; the
//! public only ever reads one small document per event. The [`Publisher`]
//! follows the live classification, waits for it to settle, and merges the
//! completed rows into that document through a [`PublicationTarget`].

pub mod memory;

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::Result;
use crate::config::PublicationLocation;
use crate::stream::DebounceExt;
use crate::types::{Classification, EventId, SnapshotWrite};

pub use memory::MemoryPublicationTarget;

/// Trait for public classification stores
#[async_trait::async_trait]
pub trait PublicationTarget: Send + Sync + 'static {
    /// Merge `snapshot` into the document at `location` for `event_id`.
    ///
    /// Fields of the document other than `rows` and `generatedAt` must be left
    /// untouched. `generatedAt` is assigned by the target's own clock.
    async fn merge_snapshot(
        &self,
        event_id: &EventId,
        location: &PublicationLocation,
        snapshot: SnapshotWrite,
    ) -> Result<()>;
}

/// Publisher spawns the debounced publication task of one active event
pub struct Publisher;

impl Publisher {
    /// Spawn the publication task for `event_id`
    ///
    /// The task follows `classifications`, waits for `window` of quiet and then
    /// writes the latest state. Writes run detached: a slow write never holds
    /// back the next one, and whichever lands last wins. Cancelling `cancel`
    /// drops any pending (not yet started) write.
    pub fn spawn(
        target: Arc<dyn PublicationTarget>,
        event_id: EventId,
        location: PublicationLocation,
        window: Duration,
        classifications: watch::Receiver<Option<Arc<Classification>>>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            Self::publish_task(target, event_id, location, window, classifications, cancel).await;
        })
    }

    async fn publish_task(
        target: Arc<dyn PublicationTarget>,
        event_id: EventId,
        location: PublicationLocation,
        window: Duration,
        classifications: watch::Receiver<Option<Arc<Classification>>>,
        cancel: CancellationToken,
    ) {
        info!(event = %event_id, "Publication task started");
        let mut settled = Box::pin(
            WatchStream::new(classifications)
                .filter_map(|opt| async move { opt })
                .debounce(window),
        );
        let mut writes = 0u64;

        loop {
            let classification = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(event = %event_id, pending = settled.has_pending(), "Publication task cancelled");
                    break;
                }
                next = settled.next() => match next {
                    Some(classification) => classification,
                    None => break,
                },
            };

            if classification.event_id != event_id {
                continue;
            }

            writes += 1;
            let snapshot = SnapshotWrite::from_classification(&classification);
            let target = Arc::clone(&target);
            let event_id = event_id.clone();
            let location = location.clone();

            debug!(event = %event_id, rows = snapshot.rows.len(), write = writes, "Publishing classification");
            tokio::spawn(async move {
                if let Err(e) = target.merge_snapshot(&event_id, &location, snapshot).await {
                    error!(event = %event_id, "Could not publish classification: {}", e);
                }
            });
        }

        info!(event = %event_id, "Publication task ended ({} writes started)", writes);
    }
}
