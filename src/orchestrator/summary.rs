//! Run summary assembly.

use crate::export::csv_export::RunSummary;
use crate::orchestrator::StageCounts;

/// Builder for [`RunSummary`] so `main` does not have to thread two
/// dozen fields through manually.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    pub source_a: String,
    pub source_b: String,
    pub counts: StageCounts,
    pub fetch_time: std::time::Duration,
    pub normalize_time: std::time::Duration,
    pub match_time: std::time::Duration,
    pub export_time: std::time::Duration,
    pub mem_used_start_mb: u64,
    pub mem_used_end_mb: u64,
    pub started_utc: chrono::DateTime<chrono::Utc>,
    pub ended_utc: chrono::DateTime<chrono::Utc>,
}

impl Default for SummaryBuilder {
    fn default() -> Self {
        let now = chrono::Utc::now();
        Self {
            source_a: String::new(),
            source_b: String::new(),
            counts: StageCounts::default(),
            fetch_time: std::time::Duration::ZERO,
            normalize_time: std::time::Duration::ZERO,
            match_time: std::time::Duration::ZERO,
            export_time: std::time::Duration::ZERO,
            mem_used_start_mb: 0,
            mem_used_end_mb: 0,
            started_utc: now,
            ended_utc: now,
        }
    }
}

impl SummaryBuilder {
    pub fn new(source_a: &str, source_b: &str) -> Self {
        Self {
            source_a: source_a.to_string(),
            source_b: source_b.to_string(),
            ..Default::default()
        }
    }

    pub fn with_counts(mut self, counts: StageCounts) -> Self {
        self.counts = counts;
        self
    }

    pub fn with_timestamps(
        mut self,
        started: chrono::DateTime<chrono::Utc>,
        ended: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        self.started_utc = started;
        self.ended_utc = ended;
        self
    }

    pub fn with_memory(mut self, start_mb: u64, end_mb: u64) -> Self {
        self.mem_used_start_mb = start_mb;
        self.mem_used_end_mb = end_mb;
        self
    }

    pub fn with_timings(
        mut self,
        fetch: std::time::Duration,
        normalize: std::time::Duration,
        matching: std::time::Duration,
        export: std::time::Duration,
    ) -> Self {
        self.fetch_time = fetch;
        self.normalize_time = normalize;
        self.match_time = matching;
        self.export_time = export;
        self
    }

    pub fn build(self) -> RunSummary {
        let duration_secs = (self.ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0;
        RunSummary {
            source_a: self.source_a,
            source_b: self.source_b,
            raw_a: self.counts.raw_a,
            raw_b: self.counts.raw_b,
            rejected_a: self.counts.rejected_a,
            rejected_b: self.counts.rejected_b,
            deduped_a: self.counts.deduped_a,
            deduped_b: self.counts.deduped_b,
            matched_exact: self.counts.matched_exact,
            matched_range: self.counts.matched_range,
            matched_geo: self.counts.matched_geo,
            merged_total: self.counts.merged_total,
            standalone_total: self.counts.standalone_total,
            fetch_time: self.fetch_time,
            normalize_time: self.normalize_time,
            match_time: self.match_time,
            export_time: self.export_time,
            mem_used_start_mb: self.mem_used_start_mb,
            mem_used_end_mb: self.mem_used_end_mb,
            started_utc: self.started_utc,
            ended_utc: self.ended_utc,
            duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_derived_from_timestamps() {
        let started = chrono::Utc::now();
        let ended = started + chrono::Duration::milliseconds(2500);
        let summary = SummaryBuilder::new("inspections", "liquor")
            .with_timestamps(started, ended)
            .build();
        assert!((summary.duration_secs - 2.5).abs() < 1e-9);
        assert_eq!(summary.source_a, "inspections");
    }
}
