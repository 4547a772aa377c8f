//! Test utilities shared by unit tests, integration tests and benchmarks
//!
//! Provides the reference race used across the test suite and a generator for
//! large synthetic fields.

#![cfg(any(test, feature = "benchmark"))]

use crate::config::DisplayDefaults;
use crate::ranking::{self, Entrant};
use crate::timing::Elapsed;
use crate::types::{Classification, CompetitorRecord, EventId, ObservationRecord};

/// Event id from a literal known to be valid.
pub fn event(id: &str) -> EventId {
    EventId::new(id).unwrap_or_else(|e| panic!("Invalid test event id '{id}': {e}"))
}

/// Entrant whose display fields are derived from its id.
pub fn entrant(id: &str, elapsed: Option<i64>) -> Entrant {
    let elapsed = elapsed.map_or(Elapsed::Incomplete, Elapsed::Complete);
    Entrant::new(id, format!("Competitor {id}"), id, "—", elapsed)
}

/// The reference race: three competitors starting at 100.
///
/// | id | name | timestamps | elapsed |
/// |----|------|------------|---------|
/// | 1  | Ana  | 100, 160   | 60      |
/// | 2  | Luis | 100        | -       |
/// | 3  | Eva  | 100, 115   | 15      |
pub fn scenario_records() -> Vec<CompetitorRecord> {
    vec![
        CompetitorRecord::new("1")
            .with_name("Ana")
            .with_bib("7")
            .with_team("Rojo")
            .with_embedded(observations(&[100, 160])),
        CompetitorRecord::new("2").with_name("Luis").with_bib("9").with_embedded(observations(&[100])),
        CompetitorRecord::new("3")
            .with_name("Eva")
            .with_bib("3")
            .with_team("Azul")
            .with_embedded(observations(&[100, 115])),
    ]
}

/// Classification of the reference race as event `race-1`.
pub fn scenario_classification() -> Classification {
    let display = DisplayDefaults::default();
    let entrants: Vec<Entrant> =
        scenario_records().iter().map(|r| Entrant::from_record(r, &[], &display)).collect();
    ranking::classify(event("race-1"), &entrants)
}

/// Synthetic field of `size` competitors. Every fifth competitor has only a
/// start timestamp; the others finish with pseudo-random elapsed times and
/// a few intermediate checkpoints.
pub fn large_field(size: usize) -> Vec<CompetitorRecord> {
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..size)
        .map(|i| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;

            let start = 1_700_000_000 + (seed % 600) as i64;
            let mut secs = vec![start];
            if i % 5 != 0 {
                let finish = start + 3_000 + (seed % 4_000) as i64;
                secs.push(start + (finish - start) / 3);
                secs.push(finish);
            }

            CompetitorRecord::new(format!("c{i}"))
                .with_name(format!("Competitor {i}"))
                .with_bib(i.to_string())
                .with_embedded(observations(&secs))
        })
        .collect()
}

fn observations(secs: &[i64]) -> Vec<ObservationRecord> {
    secs.iter().copied().map(ObservationRecord::epoch_seconds).collect()
}
