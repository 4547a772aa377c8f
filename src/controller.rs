//! Live aggregation of one event's classification
//!
//! [`LiveStandings`] is a two-state machine:
//!
//! - **Idle**: no event selected, no open feeds
//! - **Subscribed**: one competitor-list feed for the active event plus one
//!   timestamp feed per competitor currently on that list
//!
//! While subscribed, an aggregation task owns every feed and the cached
//! timestamps. Each upstream change is applied to the cache and the whole
//! classification is recomputed before the next change is looked at.

use futures::{Stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamMap;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{DisplayDefaults, StandingsConfig};
use crate::directory::{CompetitorDirectory, CompetitorFeed, ObservationFeed};
use crate::publish::{PublicationTarget, Publisher};
use crate::ranking::{self, Entrant};
use crate::types::{Classification, CompetitorId, CompetitorRecord, EventId, ObservationRecord};
use crate::Result;

type ClassificationTx = Arc<watch::Sender<Option<Arc<Classification>>>>;

/// Lifecycle state of a [`LiveStandings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandingsState {
    Idle,
    Subscribed(EventId),
}

/// Tasks and cancellation token of the active event
struct ActiveEvent {
    event_id: EventId,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Live classification of one event at a time.
///
/// Classification updates are delivered through a watch channel: `None` until
/// the first competitor list of the active event has been processed, then the
/// latest classification.
pub struct LiveStandings {
    directory: Arc<dyn CompetitorDirectory>,
    target: Option<Arc<dyn PublicationTarget>>,
    config: StandingsConfig,
    classification: ClassificationTx,
    active: Option<ActiveEvent>,
}

impl LiveStandings {
    /// Create an idle controller reading from `directory`.
    pub fn new(directory: Arc<dyn CompetitorDirectory>, config: StandingsConfig) -> Self {
        let (tx, _) = watch::channel(None);
        Self { directory, target: None, config, classification: Arc::new(tx), active: None }
    }

    /// Publish settled classifications to `target`.
    pub fn with_publication(mut self, target: Arc<dyn PublicationTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Start following `event_id`.
    ///
    /// Any previously active event is fully torn down first, so no feed of the
    /// old event can touch the new event's classification.
    pub async fn activate(&mut self, event_id: EventId) {
        self.deactivate().await;

        self.classification.send_replace(None);
        let cancel = CancellationToken::new();

        let feed = self.directory.competitors(&event_id);
        let aggregator = Aggregator::new(
            event_id.clone(),
            Arc::clone(&self.directory),
            self.config.display.clone(),
            Arc::clone(&self.classification),
        );
        let mut tasks = vec![aggregator.spawn(feed, cancel.clone())];

        match (&self.target, self.config.publish) {
            (Some(target), true) => tasks.push(Publisher::spawn(
                Arc::clone(target),
                event_id.clone(),
                self.config.publication.clone(),
                self.config.publish_debounce(),
                self.classification.subscribe(),
                cancel.clone(),
            )),
            (None, true) => debug!("No publication target configured, classification stays private"),
            (_, false) => debug!("Publication disabled by configuration"),
        }

        info!("Following classification of event {}", event_id);
        self.active = Some(ActiveEvent { event_id, cancel, tasks });
    }

    /// Stop following the active event.
    ///
    /// Returns once every feed is closed and every task has exited; from then on
    /// the classification no longer changes. The last classification stays
    /// readable. Pending (debounced) publications are dropped.
    pub async fn deactivate(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.cancel.cancel();
        for task in active.tasks {
            if let Err(e) = task.await {
                error!("Classification task for event {} failed: {}", active.event_id, e);
            }
        }
        info!("Stopped following event {}", active.event_id);
    }

    /// Current lifecycle state
    pub fn state(&self) -> StandingsState {
        match &self.active {
            Some(active) => StandingsState::Subscribed(active.event_id.clone()),
            None => StandingsState::Idle,
        }
    }

    /// Active event, if any
    pub fn active_event(&self) -> Option<&EventId> {
        self.active.as_ref().map(|active| &active.event_id)
    }

    /// Watch receiver for classification updates
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Classification>>> {
        self.classification.subscribe()
    }

    /// Get classification updates as a stream
    ///
    /// Yields the current classification immediately (if any), then each update.
    pub fn updates(&self) -> impl Stream<Item = Arc<Classification>> + 'static {
        WatchStream::new(self.classification.subscribe()).filter_map(|opt| async move { opt })
    }

    /// Latest classification (if any)
    pub fn current(&self) -> Option<Arc<Classification>> {
        self.classification.borrow().clone()
    }

    /// Latest classification of the active event
    pub fn current_for_active(&self) -> Result<Option<Arc<Classification>>> {
        let event_id = self.active_event().ok_or(crate::StandingsError::NotActive)?;
        Ok(self.current().filter(|c| &c.event_id == event_id))
    }

    /// Number of completed competitors in the latest classification
    pub fn completed_count(&self) -> usize {
        self.classification.borrow().as_ref().map_or(0, |c| c.completed_count())
    }

    pub fn config(&self) -> &StandingsConfig {
        &self.config
    }
}

impl Drop for LiveStandings {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            debug!("Dropping live standings for event {}", active.event_id);
            // Cancel tasks on drop for clean shutdown
            active.cancel.cancel();
        }
    }
}

/// Aggregation task state: every open feed and everything cached from them
struct Aggregator {
    event_id: EventId,
    directory: Arc<dyn CompetitorDirectory>,
    display: DisplayDefaults,
    competitors: Vec<CompetitorRecord>,
    /// Latest sub-collection records per competitor
    timestamps: HashMap<CompetitorId, Vec<ObservationRecord>>,
    feeds: StreamMap<CompetitorId, ObservationFeed>,
    output: ClassificationTx,
    recomputations: u64,
}

impl Aggregator {
    fn new(
        event_id: EventId,
        directory: Arc<dyn CompetitorDirectory>,
        display: DisplayDefaults,
        output: ClassificationTx,
    ) -> Self {
        Self {
            event_id,
            directory,
            display,
            competitors: Vec::new(),
            timestamps: HashMap::new(),
            feeds: StreamMap::new(),
            output,
            recomputations: 0,
        }
    }

    fn spawn(self, competitors: CompetitorFeed, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(competitors, cancel))
    }

    async fn run(mut self, mut competitors: CompetitorFeed, cancel: CancellationToken) {
        info!("Aggregation task started for event {}", self.event_id);
        let mut directory_open = true;

        loop {
            let changed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                update = competitors.next(), if directory_open => match update {
                    Some(Ok(records)) => {
                        self.apply_competitors(records);
                        true
                    }
                    Some(Err(e)) => {
                        warn!("Competitor feed error for event {}, keeping last known list: {}", self.event_id, e);
                        false
                    }
                    None => {
                        info!("Competitor feed of event {} ended", self.event_id);
                        directory_open = false;
                        false
                    }
                },
                Some((competitor_id, update)) = self.feeds.next(), if !self.feeds.is_empty() => {
                    self.apply_timestamps(competitor_id, update)
                }
            };

            if changed && !cancel.is_cancelled() {
                self.recompute();
            }
        }

        info!(
            "Aggregation task for event {} ended ({} recomputations, {} open timestamp feeds)",
            self.event_id,
            self.recomputations,
            self.feeds.len()
        );
    }

    /// Replace the competitor set and reconcile timestamp feeds with it.
    ///
    /// Feeds of competitors that left are dropped (closing them), competitors
    /// without a feed get one, and existing feeds stay as they are.
    fn apply_competitors(&mut self, records: Vec<CompetitorRecord>) {
        let present: HashSet<CompetitorId> = records.iter().map(|r| r.id.clone()).collect();

        let departed: Vec<CompetitorId> =
            self.feeds.keys().filter(|id| !present.contains(*id)).cloned().collect();
        for competitor_id in departed {
            self.feeds.remove(&competitor_id);
            debug!("Closed timestamp feed of competitor {}", competitor_id);
        }
        self.timestamps.retain(|competitor_id, _| present.contains(competitor_id));

        for record in &records {
            if !self.feeds.contains_key(&record.id) {
                let feed = self.directory.observations(&self.event_id, &record.id);
                self.feeds.insert(record.id.clone(), feed);
                debug!("Opened timestamp feed of competitor {}", record.id);
            }
        }

        trace!("Event {} now has {} competitors", self.event_id, records.len());
        self.competitors = records;
    }

    /// Cache a new timestamp snapshot for one competitor. Returns whether
    /// anything changed.
    fn apply_timestamps(&mut self, competitor_id: CompetitorId, update: Result<Vec<ObservationRecord>>) -> bool {
        match update {
            Ok(records) => {
                trace!("Competitor {} has {} timestamp records", competitor_id, records.len());
                self.timestamps.insert(competitor_id, records);
                true
            }
            Err(e) => {
                warn!("Timestamp feed error for competitor {}, keeping last known timestamps: {}", competitor_id, e);
                false
            }
        }
    }

    fn recompute(&mut self) {
        let entrants: Vec<Entrant> = self
            .competitors
            .iter()
            .map(|record| {
                let subcollection = self.timestamps.get(&record.id).map(Vec::as_slice).unwrap_or_default();
                Entrant::from_record(record, subcollection, &self.display)
            })
            .collect();

        let classification = ranking::classify(self.event_id.clone(), &entrants);
        self.recomputations += 1;
        trace!(
            "Recomputed classification #{} for event {}: {}/{} completed",
            self.recomputations,
            self.event_id,
            classification.completed_count(),
            classification.rows.len()
        );
        self.output.send_replace(Some(Arc::new(classification)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directories::MemoryDirectory;
    use crate::publish::MemoryPublicationTarget;
    use crate::test_utils::{event, scenario_records};
    use crate::timing::UNAVAILABLE;
    use std::time::Duration;

    fn controller(dir: &Arc<MemoryDirectory>) -> LiveStandings {
        LiveStandings::new(Arc::clone(dir) as Arc<dyn CompetitorDirectory>, StandingsConfig::default())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn ids(classification: &Classification) -> Vec<&str> {
        classification.rows.iter().map(|r| r.competitor_id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn activation_opens_one_feed_per_competitor() {
        let dir = Arc::new(MemoryDirectory::new());
        let race = event("race-1");
        dir.set_competitors(&race, scenario_records());

        let mut live = controller(&dir);
        assert_eq!(live.state(), StandingsState::Idle);
        live.activate(race.clone()).await;
        settle().await;

        assert_eq!(live.state(), StandingsState::Subscribed(race.clone()));
        assert_eq!(dir.competitor_subscribers(&race), 1);
        assert_eq!(dir.total_observation_subscribers(&race), 3);

        let current = live.current().unwrap();
        assert_eq!(ids(&current), ["3", "1", "2"]);
        assert_eq!(live.completed_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn subcollection_updates_rerank() {
        let dir = Arc::new(MemoryDirectory::new());
        let race = event("race-1");
        dir.set_competitors(&race, scenario_records());

        let mut live = controller(&dir);
        live.activate(race.clone()).await;
        settle().await;

        // competitor 2 finishes 5s after its start at 100
        dir.add_observation(&race, &CompetitorId::from("2"), ObservationRecord::epoch_seconds(105));
        settle().await;

        let current = live.current().unwrap();
        assert_eq!(ids(&current), ["2", "3", "1"]);
        assert_eq!(current.rows[0].time, "0:05");
        assert_eq!(current.rows[1].gap, "+0:10");
        assert_eq!(live.completed_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn competitor_churn_reconciles_feeds() {
        let dir = Arc::new(MemoryDirectory::new());
        let race = event("race-1");
        dir.set_competitors(&race, scenario_records());

        let mut live = controller(&dir);
        live.activate(race.clone()).await;
        settle().await;

        dir.remove_competitor(&race, &CompetitorId::from("3"));
        settle().await;
        assert_eq!(dir.observation_subscribers(&race, &CompetitorId::from("3")), 0);
        assert_eq!(dir.observation_subscribers(&race, &CompetitorId::from("1")), 1);

        dir.upsert_competitor(&race, CompetitorRecord::new("4").with_name("Nuevo"));
        settle().await;
        assert_eq!(dir.observation_subscribers(&race, &CompetitorId::from("4")), 1);
        // still-present competitors kept their original feed
        for id in ["1", "2", "4"] {
            assert_eq!(dir.observation_subscribers(&race, &CompetitorId::from(id)), 1);
            assert_eq!(dir.observation_feeds_opened(&race, &CompetitorId::from(id)), 1, "{id}");
        }

        // a returning competitor gets a fresh feed
        dir.upsert_competitor(&race, CompetitorRecord::new("3"));
        settle().await;
        assert_eq!(dir.observation_feeds_opened(&race, &CompetitorId::from("3")), 2);
        assert_eq!(dir.observation_feeds_opened(&race, &CompetitorId::from("1")), 1);
        dir.remove_competitor(&race, &CompetitorId::from("3"));
        settle().await;

        let current = live.current().unwrap();
        assert_eq!(ids(&current), ["1", "2", "4"]);
        assert_eq!(current.rows[2].name, "Nuevo");
        assert_eq!(current.rows[2].gap, UNAVAILABLE);
    }

    #[tokio::test(start_paused = true)]
    async fn feed_errors_freeze_only_the_affected_competitor() {
        let dir = Arc::new(MemoryDirectory::new());
        let race = event("race-1");
        dir.set_competitors(&race, scenario_records());
        let one = CompetitorId::from("1");
        dir.set_observations(&race, &one, vec![ObservationRecord::epoch_seconds(200)]);

        let mut live = controller(&dir);
        live.activate(race.clone()).await;
        settle().await;
        assert_eq!(live.current().unwrap().rows[1].elapsed_seconds, Some(100));

        dir.fail_observations(&race, &one, "unavailable");
        dir.fail_competitors(&race, "unavailable");
        dir.add_observation(&race, &CompetitorId::from("2"), ObservationRecord::epoch_seconds(190));
        settle().await;

        let current = live.current().unwrap();
        let one_row = current.rows.iter().find(|r| r.competitor_id == one).unwrap();
        assert_eq!(one_row.elapsed_seconds, Some(100));
        let two_row = current.rows.iter().find(|r| r.competitor_id.as_str() == "2").unwrap();
        assert_eq!(two_row.elapsed_seconds, Some(90));
        assert_eq!(dir.competitor_subscribers(&race), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_stops_all_updates() {
        let dir = Arc::new(MemoryDirectory::new());
        let race = event("race-1");
        dir.set_competitors(&race, scenario_records());

        let mut live = controller(&dir);
        live.activate(race.clone()).await;
        settle().await;
        let before = live.current().unwrap();
        let rx = live.subscribe();

        live.deactivate().await;
        assert_eq!(live.state(), StandingsState::Idle);
        assert_eq!(dir.competitor_subscribers(&race), 0);
        assert_eq!(dir.total_observation_subscribers(&race), 0);

        dir.add_observation(&race, &CompetitorId::from("2"), ObservationRecord::epoch_seconds(101));
        dir.upsert_competitor(&race, CompetitorRecord::new("9"));
        settle().await;

        assert!(!rx.has_changed().unwrap_or(false));
        assert_eq!(live.current().unwrap(), before);
        assert!(matches!(live.current_for_active(), Err(crate::StandingsError::NotActive)));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_events_resets_classification() {
        let dir = Arc::new(MemoryDirectory::new());
        let first = event("race-1");
        let second = event("race-2");
        dir.set_competitors(&first, scenario_records());
        dir.set_competitors(&second, vec![CompetitorRecord::new("z").with_name("Zoe")]);

        let mut live = controller(&dir);
        live.activate(first.clone()).await;
        settle().await;
        live.activate(second.clone()).await;
        assert_eq!(dir.competitor_subscribers(&first), 0);
        settle().await;

        let current = live.current_for_active().unwrap().unwrap();
        assert_eq!(current.event_id, second);
        assert_eq!(ids(&current), ["z"]);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_classification_is_published_once() {
        let dir = Arc::new(MemoryDirectory::new());
        let target = Arc::new(MemoryPublicationTarget::new());
        let race = event("race-1");
        dir.set_competitors(&race, scenario_records());

        let mut live = controller(&dir).with_publication(Arc::clone(&target) as Arc<dyn PublicationTarget>);
        live.activate(race.clone()).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(target.write_count(), 1);
        let snapshot = target.snapshot(&race, &live.config().publication).unwrap();
        let published: Vec<_> = snapshot.rows.iter().map(|r| r.competitor_id.as_str()).collect();
        assert_eq!(published, ["3", "1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_drops_pending_publication() {
        let dir = Arc::new(MemoryDirectory::new());
        let target = Arc::new(MemoryPublicationTarget::new());
        let race = event("race-1");
        dir.set_competitors(&race, scenario_records());

        let mut live = controller(&dir).with_publication(Arc::clone(&target) as Arc<dyn PublicationTarget>);
        live.activate(race.clone()).await;
        settle().await;
        live.deactivate().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(target.write_count(), 0);
    }
}
