//! In-memory competitor directory
//!
//! Holds competitors and timestamps per event and broadcasts every change to
//! open feeds through watch channels, the same way a document store pushes
//! snapshots to its listeners. Used by tests, benchmarks and demos, and as a
//! local cache in front of a real store.

use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::directory::{CompetitorDirectory, CompetitorFeed, ObservationFeed};
use crate::types::{CompetitorId, CompetitorRecord, EventId, ObservationRecord};
use crate::{Result, StandingsError};

/// What an open feed currently sees.
#[derive(Debug, Clone)]
enum FeedState<T> {
    Data(Vec<T>),
    Failed(String),
}

/// Stored data of one watched set plus its broadcast channel.
struct Feed<T> {
    data: Vec<T>,
    tx: watch::Sender<FeedState<T>>,
}

impl<T: Clone + Send + Sync + 'static> Feed<T> {
    fn new() -> Self {
        let (tx, _) = watch::channel(FeedState::Data(Vec::new()));
        Self { data: Vec::new(), tx }
    }

    fn broadcast(&self) {
        self.tx.send_replace(FeedState::Data(self.data.clone()));
    }

    fn fail(&self, reason: String) {
        self.tx.send_replace(FeedState::Failed(reason));
    }

    fn stream(&self, scope: String) -> BoxedFeed<T> {
        WatchStream::new(self.tx.subscribe())
            .map(move |state| match state {
                FeedState::Data(items) => Ok(items),
                FeedState::Failed(reason) => Err(StandingsError::subscription_failed(scope.clone(), reason)),
            })
            .boxed()
    }

    fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }
}

type BoxedFeed<T> = futures::stream::BoxStream<'static, Result<Vec<T>>>;

#[derive(Default)]
struct Inner {
    competitors: HashMap<EventId, Feed<CompetitorRecord>>,
    observations: HashMap<(EventId, CompetitorId), Feed<ObservationRecord>>,
    /// Timestamp feeds handed out so far, per competitor
    opened: HashMap<(EventId, CompetitorId), usize>,
}

impl Inner {
    fn competitors(&mut self, event_id: &EventId) -> &mut Feed<CompetitorRecord> {
        self.competitors.entry(event_id.clone()).or_insert_with(Feed::new)
    }

    fn observations(&mut self, event_id: &EventId, competitor_id: &CompetitorId) -> &mut Feed<ObservationRecord> {
        self.observations
            .entry((event_id.clone(), competitor_id.clone()))
            .or_insert_with(Feed::new)
    }
}

/// Competitor directory backed by process memory.
#[derive(Default)]
pub struct MemoryDirectory {
    inner: Mutex<Inner>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole competitor list of an event.
    pub fn set_competitors(&self, event_id: &EventId, records: Vec<CompetitorRecord>) {
        let mut inner = self.lock();
        let feed = inner.competitors(event_id);
        feed.data = records;
        feed.broadcast();
    }

    /// Insert a competitor, or replace the one with the same id in place.
    pub fn upsert_competitor(&self, event_id: &EventId, record: CompetitorRecord) {
        let mut inner = self.lock();
        let feed = inner.competitors(event_id);
        match feed.data.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => feed.data.push(record),
        }
        feed.broadcast();
    }

    /// Remove a competitor. Its stored timestamps are kept, as a store keeps
    /// orphaned sub-collections.
    pub fn remove_competitor(&self, event_id: &EventId, competitor_id: &CompetitorId) {
        let mut inner = self.lock();
        let feed = inner.competitors(event_id);
        feed.data.retain(|record| &record.id != competitor_id);
        feed.broadcast();
    }

    /// Replace the timestamp sub-collection of a competitor.
    pub fn set_observations(
        &self,
        event_id: &EventId,
        competitor_id: &CompetitorId,
        mut records: Vec<ObservationRecord>,
    ) {
        sort_by_instant(&mut records);
        let mut inner = self.lock();
        let feed = inner.observations(event_id, competitor_id);
        feed.data = records;
        feed.broadcast();
    }

    /// Record one more timestamp for a competitor.
    pub fn add_observation(&self, event_id: &EventId, competitor_id: &CompetitorId, record: ObservationRecord) {
        let mut inner = self.lock();
        let feed = inner.observations(event_id, competitor_id);
        feed.data.push(record);
        sort_by_instant(&mut feed.data);
        feed.broadcast();
    }

    /// Make open competitor feeds of an event report a failure. The next
    /// change to the list recovers them.
    pub fn fail_competitors(&self, event_id: &EventId, reason: impl Into<String>) {
        self.lock().competitors(event_id).fail(reason.into());
    }

    /// Make open timestamp feeds of a competitor report a failure. The next
    /// change to its timestamps recovers them.
    pub fn fail_observations(&self, event_id: &EventId, competitor_id: &CompetitorId, reason: impl Into<String>) {
        self.lock().observations(event_id, competitor_id).fail(reason.into());
    }

    /// Number of open competitor feeds of an event.
    pub fn competitor_subscribers(&self, event_id: &EventId) -> usize {
        self.lock().competitors.get(event_id).map_or(0, Feed::subscribers)
    }

    /// Number of open timestamp feeds of a competitor.
    pub fn observation_subscribers(&self, event_id: &EventId, competitor_id: &CompetitorId) -> usize {
        self.lock()
            .observations
            .get(&(event_id.clone(), competitor_id.clone()))
            .map_or(0, Feed::subscribers)
    }

    /// Number of timestamp feeds ever opened for a competitor, including
    /// feeds that were closed since.
    pub fn observation_feeds_opened(&self, event_id: &EventId, competitor_id: &CompetitorId) -> usize {
        self.lock().opened.get(&(event_id.clone(), competitor_id.clone())).copied().unwrap_or(0)
    }

    /// Number of open timestamp feeds across all competitors of an event.
    pub fn total_observation_subscribers(&self, event_id: &EventId) -> usize {
        self.lock()
            .observations
            .iter()
            .filter(|((event, _), _)| event == event_id)
            .map(|(_, feed)| feed.subscribers())
            .sum()
    }
}

fn sort_by_instant(records: &mut [ObservationRecord]) {
    records.sort_by_key(ObservationRecord::epoch_seconds_value);
}

impl CompetitorDirectory for MemoryDirectory {
    fn competitors(&self, event_id: &EventId) -> CompetitorFeed {
        debug!(event = %event_id, "Opening competitor feed");
        self.lock().competitors(event_id).stream(format!("competitors of event {event_id}"))
    }

    fn observations(&self, event_id: &EventId, competitor_id: &CompetitorId) -> ObservationFeed {
        debug!(event = %event_id, competitor = %competitor_id, "Opening timestamp feed");
        let mut inner = self.lock();
        *inner.opened.entry((event_id.clone(), competitor_id.clone())).or_default() += 1;
        inner
            .observations(event_id, competitor_id)
            .stream(format!("timestamps of competitor {competitor_id} in event {event_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::event;

    #[tokio::test]
    async fn feeds_start_with_current_state() {
        let dir = MemoryDirectory::new();
        let race = event("race-1");
        dir.upsert_competitor(&race, CompetitorRecord::new("a").with_name("Ana"));

        let mut feed = dir.competitors(&race);
        let first = feed.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let dir = MemoryDirectory::new();
        let race = event("race-1");
        dir.upsert_competitor(&race, CompetitorRecord::new("a"));
        dir.upsert_competitor(&race, CompetitorRecord::new("b"));
        dir.upsert_competitor(&race, CompetitorRecord::new("a").with_team("Rojo"));

        let list = dir.competitors(&race).next().await.unwrap().unwrap();
        let ids: Vec<_> = list.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(list[0].team.as_deref(), Some("Rojo"));
    }

    #[tokio::test]
    async fn observations_arrive_ordered() {
        let dir = MemoryDirectory::new();
        let race = event("race-1");
        let id = CompetitorId::from("a");
        dir.add_observation(&race, &id, ObservationRecord::epoch_seconds(300));
        dir.add_observation(&race, &id, ObservationRecord::epoch_seconds(100));

        let records = dir.observations(&race, &id).next().await.unwrap().unwrap();
        let secs: Vec<_> = records.iter().filter_map(ObservationRecord::epoch_seconds_value).collect();
        assert_eq!(secs, [100, 300]);
    }

    #[tokio::test]
    async fn failures_surface_and_recover() {
        let dir = MemoryDirectory::new();
        let race = event("race-1");
        let mut feed = dir.competitors(&race);
        assert!(feed.next().await.unwrap().is_ok());

        dir.fail_competitors(&race, "permission denied");
        let err = feed.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("permission denied"));

        dir.upsert_competitor(&race, CompetitorRecord::new("a"));
        assert_eq!(feed.next().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropping_a_feed_unsubscribes() {
        let dir = MemoryDirectory::new();
        let race = event("race-1");
        let id = CompetitorId::from("a");

        let feed = dir.observations(&race, &id);
        assert_eq!(dir.observation_subscribers(&race, &id), 1);
        assert_eq!(dir.total_observation_subscribers(&race), 1);
        drop(feed);
        assert_eq!(dir.observation_subscribers(&race, &id), 0);

        let _again = dir.observations(&race, &id);
        assert_eq!(dir.observation_feeds_opened(&race, &id), 2);
        assert_eq!(dir.observation_feeds_opened(&race, &CompetitorId::from("b")), 0);
    }
}
