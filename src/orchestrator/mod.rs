//! Pipeline coordination: intake, normalization, dedup, matching and
//! entity assembly. `main` handles I/O and hands raw batches in; this
//! module owns everything between raw records and merged entities.

pub mod summary;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::AppConfig;
use crate::dedup::{dedup, DedupStats};
use crate::matching::{match_registries, MatchOutcome, MatchPass};
use crate::models::{MergedVenue, Origin, RawVenueRecord, Venue};
use crate::normalize::attach_keys;

/// Per-stage record counts. The observable contract of a run: every
/// surviving input venue appears in exactly one output entity, and
/// `merged_total + standalone_total` accounts for all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub raw_a: usize,
    pub raw_b: usize,
    pub rejected_a: usize,
    pub rejected_b: usize,
    pub deduped_a: usize,
    pub deduped_b: usize,
    pub matched_exact: usize,
    pub matched_range: usize,
    pub matched_geo: usize,
    pub merged_total: usize,
    pub standalone_total: usize,
}

/// Wall-clock time spent in each pipeline stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub normalize: std::time::Duration,
    pub matching: std::time::Duration,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub entities: Vec<MergedVenue>,
    pub counts: StageCounts,
    pub dedup_a: DedupStats,
    pub dedup_b: DedupStats,
    pub timings: StageTimings,
}

/// Intake: convert raw rows into venues, dropping rows without the
/// identity fields and counting them.
fn build_venues(raw: Vec<RawVenueRecord>, origin: Origin) -> (Vec<Venue>, usize) {
    let total = raw.len();
    let mut venues = Vec::with_capacity(total);
    for record in raw {
        if let Ok(v) = Venue::from_raw(record, origin) {
            venues.push(v);
        }
    }
    let rejected = total - venues.len();
    if rejected > 0 {
        warn!(
            "{}: rejected {rejected} of {total} raw records (missing id or name)",
            origin.label()
        );
    }
    (venues, rejected)
}

pub fn run_pipeline(
    raw_a: Vec<RawVenueRecord>,
    raw_b: Vec<RawVenueRecord>,
    cfg: &AppConfig,
) -> PipelineOutcome {
    let raw_a_count = raw_a.len();
    let raw_b_count = raw_b.len();

    let (mut venues_a, rejected_a) = build_venues(raw_a, Origin::Inspection);
    let (mut venues_b, rejected_b) = build_venues(raw_b, Origin::Liquor);

    // Key derivation is per-record and order-preserving, so it
    // parallelizes freely.
    let normalize_started = std::time::Instant::now();
    venues_a.par_iter_mut().for_each(attach_keys);
    venues_b.par_iter_mut().for_each(attach_keys);
    let normalize_elapsed = normalize_started.elapsed();

    let (venues_a, dedup_a) = dedup(Origin::Inspection, venues_a);
    let (venues_b, dedup_b) = dedup(Origin::Liquor, venues_b);
    info!(
        "dedup: {} -> {} inspection venues ({} id collapses, {} building collapses)",
        dedup_a.raw,
        dedup_a.surviving,
        dedup_a.raw - dedup_a.unique_ids,
        dedup_a.removed_by_building
    );

    let deduped_a_count = venues_a.len();
    let deduped_b_count = venues_b.len();

    let match_started = std::time::Instant::now();
    let outcome = match_registries(venues_a, venues_b, &cfg.matching);
    let match_elapsed = match_started.elapsed();
    log_passes(&outcome);

    let MatchOutcome {
        pairs,
        unmatched_a,
        unmatched_b,
        exact,
        range,
        geo,
    } = outcome;

    let merged_total = pairs.len();
    let standalone_total = unmatched_a.len() + unmatched_b.len();

    // Pairs first in pass order, then leftovers from each registry in
    // input order.
    let mut entities = Vec::with_capacity(merged_total + standalone_total);
    for pair in pairs {
        entities.push(MergedVenue::paired(pair.a, pair.b));
    }
    entities.extend(unmatched_a.into_iter().map(MergedVenue::standalone));
    entities.extend(unmatched_b.into_iter().map(MergedVenue::standalone));

    let counts = StageCounts {
        raw_a: raw_a_count,
        raw_b: raw_b_count,
        rejected_a,
        rejected_b,
        deduped_a: deduped_a_count,
        deduped_b: deduped_b_count,
        matched_exact: exact.matched,
        matched_range: range.matched,
        matched_geo: geo.matched,
        merged_total,
        standalone_total,
    };

    PipelineOutcome {
        entities,
        counts,
        dedup_a,
        dedup_b,
        timings: StageTimings {
            normalize: normalize_elapsed,
            matching: match_elapsed,
        },
    }
}

fn log_passes(outcome: &MatchOutcome) {
    let stages = [
        (MatchPass::Exact, outcome.exact),
        (MatchPass::Range, outcome.range),
        (MatchPass::Geo, outcome.geo),
    ];
    for (pass, counts) in stages {
        info!(
            "{} pass: {} matched ({} remaining a, {} remaining b)",
            pass.label(),
            counts.matched,
            counts.remaining_a,
            counts.remaining_b
        );
    }
}
