//! Ranking and gap computation
//!
//! Turns the elapsed results of every competitor of one event into the ordered
//! classification:
//!
//! 1. completed entrants, ascending by elapsed time (ties keep input order)
//! 2. incomplete entrants, in input order
//!
//! Positions run `1..=N` over that concatenation. The leader is the first
//! completed entrant; each completed row carries its gap to the leader.
//!
//! ```rust
//! use podium::ranking::{Entrant, rank};
//! use podium::timing::Elapsed;
//!
//! let rows = rank(&[
//!     Entrant::new("1", "Ana", "7", "—", Elapsed::Complete(60)),
//!     Entrant::new("2", "Luis", "9", "—", Elapsed::Incomplete),
//!     Entrant::new("3", "Eva", "3", "—", Elapsed::Complete(15)),
//! ]);
//! let order: Vec<_> = rows.iter().map(|r| (r.position, r.name.as_str(), r.gap.as_str())).collect();
//! assert_eq!(order, [(1, "Eva", "+0:00"), (2, "Ana", "+0:45"), (3, "Luis", "—")]);
//! ```

use crate::config::DisplayDefaults;
use crate::timing::{self, Elapsed};
use crate::types::{Classification, ClassificationRow, CompetitorId, CompetitorRecord, EventId, ObservationRecord};

/// One competitor as seen by the ranking engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entrant {
    pub competitor_id: CompetitorId,
    pub name: String,
    pub bib: String,
    pub team: String,
    pub elapsed: Elapsed,
}

impl Entrant {
    pub fn new(
        competitor_id: impl Into<CompetitorId>,
        name: impl Into<String>,
        bib: impl Into<String>,
        team: impl Into<String>,
        elapsed: Elapsed,
    ) -> Self {
        Self {
            competitor_id: competitor_id.into(),
            name: name.into(),
            bib: bib.into(),
            team: team.into(),
            elapsed,
        }
    }

    /// Build an entrant from a competitor record and the records of its
    /// timestamp sub-collection.
    pub fn from_record(
        record: &CompetitorRecord,
        subcollection: &[ObservationRecord],
        display: &DisplayDefaults,
    ) -> Self {
        let observations = timing::normalize(record.embedded.as_deref(), subcollection);

        Self {
            competitor_id: record.id.clone(),
            name: display.name(record.name.as_deref()),
            bib: display.bib(record.bib.as_deref()),
            team: display.team(record.team.as_deref()),
            elapsed: timing::elapsed(&observations),
        }
    }
}

/// Rank entrants into classification rows. Pure; the input is left untouched.
pub fn rank(entrants: &[Entrant]) -> Vec<ClassificationRow> {
    let mut completed: Vec<(&Entrant, i64)> =
        entrants.iter().filter_map(|e| e.elapsed.seconds().map(|secs| (e, secs))).collect();
    // stable: equal times stay in input order
    completed.sort_by_key(|&(_, secs)| secs);

    let leader = completed.first().map(|&(_, secs)| secs);

    let completed_rows = completed.into_iter().map(|(entrant, secs)| (entrant, Some(secs)));
    let incomplete_rows = entrants.iter().filter(|e| !e.elapsed.is_complete()).map(|e| (e, None));

    completed_rows
        .chain(incomplete_rows)
        .zip(1u32..)
        .map(|((entrant, elapsed), position)| {
            let gap = elapsed.zip(leader).and_then(|(secs, best)| secs.checked_sub(best));
            ClassificationRow {
                position,
                competitor_id: entrant.competitor_id.clone(),
                name: entrant.name.clone(),
                bib: entrant.bib.clone(),
                team: entrant.team.clone(),
                elapsed_seconds: elapsed,
                time: timing::format_elapsed(elapsed),
                gap: timing::format_gap(gap),
            }
        })
        .collect()
}

/// Rank entrants into the classification of `event_id`.
pub fn classify(event_id: EventId, entrants: &[Entrant]) -> Classification {
    Classification::new(event_id, rank(entrants))
}
