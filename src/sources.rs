//! Source adapter seam.
//!
//! The pipeline never fetches anything itself; adapters own network
//! retrieval, pagination and schema mapping and hand over
//! `RawVenueRecord` batches. Adapters are registered statically — the
//! pipeline depends only on the trait, never on a concrete adapter.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::config::CacheConfig;
use crate::error::SourceError;
use crate::models::{Origin, RawVenueRecord};

pub trait VenueSource {
    /// Short identifier, e.g. "inspections".
    fn name(&self) -> &'static str;
    /// Human-readable description for reporting.
    fn description(&self) -> &'static str;
    fn origin(&self) -> Origin;
    /// Fetch all records. Pagination and retries are the adapter's
    /// responsibility.
    fn fetch(&self) -> Result<Vec<RawVenueRecord>, SourceError>;
}

/// A previously fetched batch plus when it was fetched. An explicit
/// value passed into the run — there is no global cache lifecycle.
#[derive(Debug, Clone)]
pub struct CachedBatch {
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<RawVenueRecord>,
}

impl CachedBatch {
    pub fn is_fresh(&self, cfg: &CacheConfig, now: DateTime<Utc>) -> bool {
        now - self.fetched_at <= Duration::hours(cfg.max_age_hours)
    }
}

/// Resolve a batch for one source: use the cache while fresh, otherwise
/// fetch, and fall back to the stale cache when the fetch fails.
pub fn resolve_batch(
    source: &dyn VenueSource,
    cache: Option<&CachedBatch>,
    cfg: &CacheConfig,
    now: DateTime<Utc>,
) -> Result<Vec<RawVenueRecord>, SourceError> {
    if let Some(c) = cache {
        if c.is_fresh(cfg, now) {
            info!(
                "{}: using cached batch of {} records",
                source.name(),
                c.records.len()
            );
            return Ok(c.records.clone());
        }
        info!("{}: cache is stale, refetching", source.name());
    }
    match source.fetch() {
        Ok(records) => Ok(records),
        Err(e) => match cache {
            Some(c) => {
                warn!("{}: fetch failed ({}), using stale cache", source.name(), e);
                Ok(c.records.clone())
            }
            None => Err(e),
        },
    }
}

/// Fixed registry of the two source adapters for one run.
pub struct SourceRegistry {
    pub inspections: Box<dyn VenueSource>,
    pub liquor: Box<dyn VenueSource>,
}

impl SourceRegistry {
    pub fn new(inspections: Box<dyn VenueSource>, liquor: Box<dyn VenueSource>) -> Self {
        debug_assert_eq!(inspections.origin(), Origin::Inspection);
        debug_assert_eq!(liquor.origin(), Origin::Liquor);
        SourceRegistry {
            inspections,
            liquor,
        }
    }
}

/// Adapter over an already-materialized batch (JSON files, tests).
pub struct StaticSource {
    pub source_name: &'static str,
    pub about: &'static str,
    pub origin: Origin,
    pub records: Vec<RawVenueRecord>,
}

impl VenueSource for StaticSource {
    fn name(&self) -> &'static str {
        self.source_name
    }
    fn description(&self) -> &'static str {
        self.about
    }
    fn origin(&self) -> Origin {
        self.origin
    }
    fn fetch(&self) -> Result<Vec<RawVenueRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct FailingSource;
    impl VenueSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn description(&self) -> &'static str {
            "always fails"
        }
        fn origin(&self) -> Origin {
            Origin::Inspection
        }
        fn fetch(&self) -> Result<Vec<RawVenueRecord>, SourceError> {
            Err(SourceError::Fetch {
                source_name: "failing".into(),
                reason: "boom".into(),
            })
        }
    }

    fn record(id: &str) -> RawVenueRecord {
        RawVenueRecord {
            source_id: id.into(),
            name: "Cafe".into(),
            address: String::new(),
            borough: String::new(),
            building_id: None,
            lat: None,
            lon: None,
            tags: vec![],
            attrs: BTreeMap::new(),
        }
    }

    #[test]
    fn fresh_cache_short_circuits_fetch() {
        let now = Utc::now();
        let cache = CachedBatch {
            fetched_at: now - Duration::hours(1),
            records: vec![record("1")],
        };
        let got = resolve_batch(&FailingSource, Some(&cache), &CacheConfig::default(), now)
            .expect("fresh cache should win");
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn stale_cache_is_fallback_only() {
        let now = Utc::now();
        let cache = CachedBatch {
            fetched_at: now - Duration::hours(48),
            records: vec![record("1")],
        };
        // Fetch fails, so the stale cache still saves the run.
        let got =
            resolve_batch(&FailingSource, Some(&cache), &CacheConfig::default(), now).unwrap();
        assert_eq!(got.len(), 1);

        // A healthy source wins over a stale cache.
        let healthy = StaticSource {
            source_name: "static",
            about: "test batch",
            origin: Origin::Inspection,
            records: vec![record("1"), record("2")],
        };
        let got = resolve_batch(&healthy, Some(&cache), &CacheConfig::default(), now).unwrap();
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn no_cache_propagates_fetch_error() {
        let r = resolve_batch(&FailingSource, None, &CacheConfig::default(), Utc::now());
        assert!(r.is_err());
    }
}
