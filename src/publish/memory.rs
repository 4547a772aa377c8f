//! In-memory publication target
//!
//! Stores public documents as JSON objects keyed by path and lets public
//! viewers follow a document live.

use chrono::Utc;
use futures::{Stream, StreamExt};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use super::PublicationTarget;
use crate::config::PublicationLocation;
use crate::types::{EventId, PublicStandings, PublishedSnapshot, SnapshotWrite};
use crate::{Result, StandingsError};

type Document = Map<String, Value>;

/// Publication target backed by process memory.
#[derive(Default)]
pub struct MemoryPublicationTarget {
    documents: Mutex<HashMap<String, watch::Sender<Option<Document>>>>,
    writes: AtomicU64,
    failing: AtomicBool,
}

impl MemoryPublicationTarget {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, watch::Sender<Option<Document>>>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Store a raw document, replacing whatever is at `path`.
    pub fn put_document(&self, path: impl Into<String>, document: Document) {
        let mut documents = self.lock();
        let tx = documents.entry(path.into()).or_insert_with(|| watch::channel(None).0);
        tx.send_replace(Some(document));
    }

    /// Raw document at `path`.
    pub fn document(&self, path: &str) -> Option<Document> {
        self.lock().get(path).and_then(|tx| tx.borrow().clone())
    }

    /// Published snapshot of an event, if one was written and decodes.
    pub fn snapshot(&self, event_id: &EventId, location: &PublicationLocation) -> Option<PublishedSnapshot> {
        self.document(&location.path(event_id)).and_then(decode_snapshot)
    }

    /// Follow the public standings of an event. Yields the current standings
    /// (if any) and then every update.
    pub fn follow(
        &self,
        event_id: &EventId,
        location: &PublicationLocation,
    ) -> impl Stream<Item = PublicStandings> + Send + 'static {
        let rx = {
            let mut documents = self.lock();
            documents.entry(location.path(event_id)).or_insert_with(|| watch::channel(None).0).subscribe()
        };
        WatchStream::new(rx).filter_map(|document| async move {
            document.and_then(decode_snapshot).map(|snapshot| PublicStandings::from_snapshot(&snapshot))
        })
    }
}

fn decode_snapshot(document: Document) -> Option<PublishedSnapshot> {
    match serde_json::from_value(Value::Object(document)) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Public document does not hold a classification snapshot: {}", e);
            None
        }
    }
}

#[async_trait::async_trait]
impl PublicationTarget for MemoryPublicationTarget {
    async fn merge_snapshot(
        &self,
        event_id: &EventId,
        location: &PublicationLocation,
        snapshot: SnapshotWrite,
    ) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StandingsError::publication_failed(event_id.as_str(), "target rejected the write"));
        }

        let rows = serde_json::to_value(&snapshot.rows)
            .map_err(|e| StandingsError::publication_failed(event_id.as_str(), e.to_string()))?;
        let path = location.path(event_id);

        {
            let mut documents = self.lock();
            let tx = documents.entry(path.clone()).or_insert_with(|| watch::channel(None).0);
            tx.send_modify(|document| {
                let document = document.get_or_insert_with(Map::new);
                document.insert("generatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
                document.insert("rows".to_string(), rows);
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);

        debug!(path = %path, rows = snapshot.rows.len(), "Merged public snapshot");
        Ok(())
    }
}
