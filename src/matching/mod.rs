//! Cross-source matcher: three ordered, mutually exclusive passes.
//!
//! Each pass consumes the unmatched pools it is given and returns the
//! merge pairs it found plus the disjoint remainder pools for the next
//! pass. There is no shared "consumed" flag; ownership of a venue moves
//! either into a pair or into the remainder, exactly once.

pub mod grid;
mod helpers;
pub mod range;

use crate::config::MatchingConfig;
use crate::models::{Borough, Venue};
use grid::{haversine_m, GridIndex};
use helpers::name_similarity;
use range::{parse_house_number, parse_range};
use serde::Serialize;
use std::collections::BTreeMap;

/// Which pass produced a merge pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPass {
    Exact,
    Range,
    Geo,
}

impl MatchPass {
    pub fn label(&self) -> &'static str {
        match self {
            MatchPass::Exact => "exact",
            MatchPass::Range => "range",
            MatchPass::Geo => "geo",
        }
    }
}

/// Two venues judged to be the same physical establishment.
#[derive(Debug, Clone, Serialize)]
pub struct MergePair {
    pub a: Venue,
    pub b: Venue,
    pub pass: MatchPass,
}

/// Per-pass counters; part of the observable contract, consumed by the
/// reporting table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassCounts {
    /// Registry-B venues the pass evaluated (those eligible for its key).
    pub attempted: usize,
    pub matched: usize,
    pub remaining_a: usize,
    pub remaining_b: usize,
}

#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub pairs: Vec<MergePair>,
    pub unmatched_a: Vec<Venue>,
    pub unmatched_b: Vec<Venue>,
    pub exact: PassCounts,
    pub range: PassCounts,
    pub geo: PassCounts,
}

/// Run the exact, range and geo passes in order over two deduped pools.
/// Deterministic for a given input order.
pub fn match_registries(a: Vec<Venue>, b: Vec<Venue>, cfg: &MatchingConfig) -> MatchOutcome {
    let mut out = MatchOutcome::default();

    let (pairs, a, b) = exact_pass(a, b);
    out.exact = PassCounts {
        attempted: pairs.len() + b.len(),
        matched: pairs.len(),
        remaining_a: a.len(),
        remaining_b: b.len(),
    };
    out.pairs.extend(pairs.into_iter().map(|(a, b)| MergePair {
        a,
        b,
        pass: MatchPass::Exact,
    }));

    let (pairs, attempted, a, b) = range_pass(a, b, cfg.range_span_max);
    out.range = PassCounts {
        attempted,
        matched: pairs.len(),
        remaining_a: a.len(),
        remaining_b: b.len(),
    };
    out.pairs.extend(pairs.into_iter().map(|(a, b)| MergePair {
        a,
        b,
        pass: MatchPass::Range,
    }));

    let (pairs, attempted, a, b) = geo_pass(a, b, cfg);
    out.geo = PassCounts {
        attempted,
        matched: pairs.len(),
        remaining_a: a.len(),
        remaining_b: b.len(),
    };
    out.pairs.extend(pairs.into_iter().map(|(a, b)| MergePair {
        a,
        b,
        pass: MatchPass::Geo,
    }));

    out.unmatched_a = a;
    out.unmatched_b = b;
    out
}

type PassResult = (Vec<(Venue, Venue)>, Vec<Venue>, Vec<Venue>);

/// Pass 1: group both pools by (normalized address, borough); a group
/// with exactly one venue per side merges. Ambiguous groups (more than
/// one on either side) are left for later passes rather than guessed.
fn exact_pass(a: Vec<Venue>, b: Vec<Venue>) -> PassResult {
    let mut groups: BTreeMap<(String, Borough), (Vec<usize>, Vec<usize>)> = BTreeMap::new();
    for (i, v) in a.iter().enumerate() {
        if let Some(boro) = v.borough {
            if !v.normalized_address.is_empty() {
                groups
                    .entry((v.normalized_address.clone(), boro))
                    .or_default()
                    .0
                    .push(i);
            }
        }
    }
    for (i, v) in b.iter().enumerate() {
        if let Some(boro) = v.borough {
            if !v.normalized_address.is_empty() {
                groups
                    .entry((v.normalized_address.clone(), boro))
                    .or_default()
                    .1
                    .push(i);
            }
        }
    }

    let mut slots_a: Vec<Option<Venue>> = a.into_iter().map(Some).collect();
    let mut slots_b: Vec<Option<Venue>> = b.into_iter().map(Some).collect();
    let mut pairs = Vec::new();
    for ((_, _), (ia, ib)) in groups {
        if let ([i], [j]) = (ia.as_slice(), ib.as_slice()) {
            let va = slots_a[*i].take().expect("venue taken twice");
            let vb = slots_b[*j].take().expect("venue taken twice");
            pairs.push((va, vb));
        }
    }
    (
        pairs,
        slots_a.into_iter().flatten().collect(),
        slots_b.into_iter().flatten().collect(),
    )
}

/// Pass 2: registry-B frontage ranges against registry-A point addresses
/// on the same (street, borough). Among in-range candidates the house
/// number closest to the range midpoint wins; an exact distance tie means
/// nobody merges. B is processed in ascending source-id order so results
/// do not depend on input order.
fn range_pass(
    a: Vec<Venue>,
    b: Vec<Venue>,
    span_max: u32,
) -> (Vec<(Venue, Venue)>, usize, Vec<Venue>, Vec<Venue>) {
    let mut by_street: BTreeMap<(&str, Borough), Vec<(u32, usize)>> = BTreeMap::new();
    for (i, v) in a.iter().enumerate() {
        let (Some(boro), Some((num, street))) =
            (v.borough, parse_house_number(&v.normalized_address))
        else {
            continue;
        };
        by_street.entry((street, boro)).or_default().push((num, i));
    }

    let mut order: Vec<usize> = (0..b.len()).collect();
    order.sort_by(|&x, &y| b[x].source_id.cmp(&b[y].source_id));

    let mut taken_a = vec![false; a.len()];
    let mut matches: Vec<(usize, usize)> = Vec::new(); // (a idx, b idx)
    let mut attempted = 0usize;
    for &bi in &order {
        let bv = &b[bi];
        let Some(boro) = bv.borough else { continue };
        let Some(rng) = parse_range(&bv.raw_address, span_max) else {
            continue;
        };
        attempted += 1;
        let Some(candidates) = by_street.get(&(rng.street.as_str(), boro)) else {
            continue;
        };
        let mid = rng.midpoint();
        let mut best: Option<(f64, usize)> = None;
        let mut tied = false;
        for &(num, ai) in candidates {
            if !rng.contains(num) || taken_a[ai] {
                continue;
            }
            let dist = (num as f64 - mid).abs();
            match best {
                Some((bd, _)) if dist > bd => {}
                Some((bd, _)) if dist == bd => tied = true,
                _ => {
                    best = Some((dist, ai));
                    tied = false;
                }
            }
        }
        if let (Some((_, ai)), false) = (best, tied) {
            taken_a[ai] = true;
            matches.push((ai, bi));
        }
    }

    collect_pass(a, b, matches, attempted)
}

/// Pass 3: spatial-grid proximity over whatever survived the address
/// passes. B is processed in ascending source-id order; each takes its
/// nearest in-radius registry-A candidate that is still free and clears
/// the name-similarity gate.
fn geo_pass(
    a: Vec<Venue>,
    b: Vec<Venue>,
    cfg: &MatchingConfig,
) -> (Vec<(Venue, Venue)>, usize, Vec<Venue>, Vec<Venue>) {
    // Longitude cells must stay radius-covering at every indexed point,
    // so size them at the widest latitude present.
    let base_lat = a
        .iter()
        .filter(|v| v.has_coords())
        .map(|v| v.lat.unwrap_or_default().abs())
        .fold(f64::NAN, f64::max);
    let base_lat = if base_lat.is_nan() { 40.7128 } else { base_lat };

    let mut index = GridIndex::new(cfg.geo_radius_m, base_lat);
    for (i, v) in a.iter().enumerate() {
        if v.has_coords() {
            index.insert(i, v.lat.unwrap_or_default(), v.lon.unwrap_or_default());
        }
    }

    let mut order: Vec<usize> = (0..b.len()).collect();
    order.sort_by(|&x, &y| b[x].source_id.cmp(&b[y].source_id));

    let mut taken_a = vec![false; a.len()];
    let mut matches: Vec<(usize, usize)> = Vec::new();
    let mut attempted = 0usize;
    if !index.is_empty() {
        for &bi in &order {
            let bv = &b[bi];
            if !bv.has_coords() {
                continue;
            }
            attempted += 1;
            let (blat, blon) = (bv.lat.unwrap_or_default(), bv.lon.unwrap_or_default());
            let mut candidates: Vec<(f64, usize)> = index
                .query_near(blat, blon)
                .into_iter()
                .map(|ai| {
                    let av = &a[ai];
                    let d = haversine_m(
                        blat,
                        blon,
                        av.lat.unwrap_or_default(),
                        av.lon.unwrap_or_default(),
                    );
                    (d, ai)
                })
                .filter(|&(d, _)| d <= cfg.geo_radius_m)
                .collect();
            // Nearest first; source id breaks exact distance ties.
            candidates.sort_by(|x, y| {
                x.0.partial_cmp(&y.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a[x.1].source_id.cmp(&a[y.1].source_id))
            });
            for (_, ai) in candidates {
                if taken_a[ai] {
                    continue;
                }
                if name_similarity(&a[ai].name, &bv.name) >= cfg.geo_name_threshold {
                    taken_a[ai] = true;
                    matches.push((ai, bi));
                    break;
                }
            }
        }
    }

    collect_pass(a, b, matches, attempted)
}

/// Move matched venues out of the pools into pairs, preserving input
/// order in the remainders. Pairs are emitted in registry-A index order.
fn collect_pass(
    a: Vec<Venue>,
    b: Vec<Venue>,
    mut matches: Vec<(usize, usize)>,
    attempted: usize,
) -> (Vec<(Venue, Venue)>, usize, Vec<Venue>, Vec<Venue>) {
    matches.sort_by_key(|&(ai, _)| ai);
    let mut slots_a: Vec<Option<Venue>> = a.into_iter().map(Some).collect();
    let mut slots_b: Vec<Option<Venue>> = b.into_iter().map(Some).collect();
    let mut pairs = Vec::with_capacity(matches.len());
    for (ai, bi) in matches {
        let va = slots_a[ai].take().expect("venue taken twice");
        let vb = slots_b[bi].take().expect("venue taken twice");
        pairs.push((va, vb));
    }
    (
        pairs,
        attempted,
        slots_a.into_iter().flatten().collect(),
        slots_b.into_iter().flatten().collect(),
    )
}
