//! Intra-source deduplication, applied per registry before cross-matching.
//!
//! Registry A (inspections) is row-per-inspection, so a venue recurs once
//! per visit; registry B (licenses) is already one row per license and
//! passes through untouched.

use crate::models::{Origin, Venue};
use log::info;
use std::collections::HashMap;

/// Counters surfaced in the pipeline report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub raw: usize,
    /// Survivors after the source-id collapse.
    pub unique_ids: usize,
    /// Removed by the (normalized name, building id) collapse.
    pub removed_by_building: usize,
    pub surviving: usize,
}

/// Collapse duplicate rows within one registry. Idempotent.
///
/// Registry A: first one venue per `source_id` — the LAST row seen in
/// input order wins, since the feed is appended chronologically and the
/// newest row carries the current attributes. Then venues sharing
/// (`normalized_name`, `building_id`) collapse to one, catching
/// re-registrations of the same physical venue under a new id; the
/// survivor is the record carrying a "grade" attr, else the earlier one.
pub fn dedup(origin: Origin, venues: Vec<Venue>) -> (Vec<Venue>, DedupStats) {
    let raw = venues.len();
    if origin == Origin::Liquor {
        let stats = DedupStats {
            raw,
            unique_ids: raw,
            removed_by_building: 0,
            surviving: raw,
        };
        return (venues, stats);
    }

    // Pass one: collapse by source_id, last row wins, first-seen position
    // keeps the output order stable.
    let mut slot_of_id: HashMap<String, usize> = HashMap::new();
    let mut by_id: Vec<Venue> = Vec::with_capacity(venues.len());
    for v in venues {
        match slot_of_id.get(&v.source_id) {
            Some(&slot) => by_id[slot] = v,
            None => {
                slot_of_id.insert(v.source_id.clone(), by_id.len());
                by_id.push(v);
            }
        }
    }
    let unique_ids = by_id.len();

    // Pass two: collapse by (normalized name, building id) when a
    // building id is present.
    let mut slot_of_key: HashMap<(String, String), usize> = HashMap::new();
    let mut out: Vec<Option<Venue>> = Vec::with_capacity(by_id.len());
    let mut removed = 0usize;
    for v in by_id {
        let key = match &v.building_id {
            Some(b) => (v.normalized_name.clone(), b.clone()),
            None => {
                out.push(Some(v));
                continue;
            }
        };
        match slot_of_key.get(&key) {
            Some(&slot) => {
                removed += 1;
                let keep_new = v.attrs.contains_key("grade")
                    && !out[slot]
                        .as_ref()
                        .is_some_and(|e| e.attrs.contains_key("grade"));
                if keep_new {
                    out[slot] = Some(v);
                }
            }
            None => {
                slot_of_key.insert(key, out.len());
                out.push(Some(v));
            }
        }
    }

    let surviving: Vec<Venue> = out.into_iter().flatten().collect();
    let stats = DedupStats {
        raw,
        unique_ids,
        removed_by_building: removed,
        surviving: surviving.len(),
    };
    if removed > 0 {
        info!(
            "dedup: {} raw rows -> {} unique ids -> {} after building collapse",
            raw,
            unique_ids,
            surviving.len()
        );
    }
    (surviving, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Origin, RawVenueRecord, Venue};
    use crate::normalize::{normalize_address, normalize_name};
    use std::collections::BTreeMap;

    fn v(id: &str, name: &str, bin: Option<&str>, grade: Option<&str>) -> Venue {
        let mut attrs = BTreeMap::new();
        if let Some(g) = grade {
            attrs.insert("grade".to_string(), g.to_string());
        }
        let raw = RawVenueRecord {
            source_id: id.into(),
            name: name.into(),
            address: "1 MAIN ST".into(),
            borough: "Manhattan".into(),
            building_id: bin.map(String::from),
            lat: None,
            lon: None,
            tags: vec![],
            attrs,
        };
        let mut venue = Venue::from_raw(raw, Origin::Inspection).unwrap();
        venue.normalized_address = normalize_address(&venue.raw_address);
        venue.normalized_name = normalize_name(&venue.name);
        venue
    }

    #[test]
    fn source_id_collapse_keeps_last_row() {
        let rows = vec![
            v("100", "Old Name", None, None),
            v("100", "New Name", None, None),
            v("200", "Other", None, None),
        ];
        let (out, stats) = dedup(Origin::Inspection, rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "New Name");
        assert_eq!(stats.raw, 3);
        assert_eq!(stats.unique_ids, 2);
    }

    #[test]
    fn building_collapse_prefers_graded_record() {
        let rows = vec![
            v("1", "Corner Cafe", Some("B-77"), None),
            v("2", "CORNER CAFE", Some("B-77"), Some("A")),
            v("3", "Corner Cafe", Some("B-99"), None),
        ];
        let (out, stats) = dedup(Origin::Inspection, rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source_id, "2");
        assert_eq!(stats.removed_by_building, 1);
    }

    #[test]
    fn missing_building_id_never_collapses() {
        let rows = vec![
            v("1", "Corner Cafe", None, None),
            v("2", "Corner Cafe", None, None),
        ];
        let (out, _) = dedup(Origin::Inspection, rows);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn idempotent() {
        let rows = vec![
            v("1", "A", Some("B-1"), None),
            v("1", "A", Some("B-1"), Some("A")),
            v("2", "a", Some("B-1"), None),
            v("3", "C", None, None),
        ];
        let (once, _) = dedup(Origin::Inspection, rows);
        let (twice, stats) = dedup(Origin::Inspection, once.clone());
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.source_id, b.source_id);
        }
        assert_eq!(stats.removed_by_building, 0);
    }

    #[test]
    fn liquor_rows_pass_through() {
        let mut a = v("1", "Bar", None, None);
        a.origin = Origin::Liquor;
        let mut b = v("1", "Bar Again", None, None);
        b.origin = Origin::Liquor;
        let (out, stats) = dedup(Origin::Liquor, vec![a, b]);
        assert_eq!(out.len(), 2);
        assert_eq!(stats.surviving, 2);
    }
}
