use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use venue_matcher::cli::Cli;
use venue_matcher::export::csv_export::{export_entities_csv, export_summary_csv};
use venue_matcher::logging::init_tracing_from_env;
use venue_matcher::metrics::memory_stats_mb;
use venue_matcher::models::{Origin, RawVenueRecord};
use venue_matcher::orchestrator::summary::SummaryBuilder;
use venue_matcher::orchestrator::run_pipeline;
use venue_matcher::sources::{resolve_batch, SourceRegistry, StaticSource};

fn read_batch(path: &str) -> Result<Vec<RawVenueRecord>> {
    let file = File::open(path).with_context(|| format!("opening batch file {path}"))?;
    let records: Vec<RawVenueRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("decoding batch file {path}"))?;
    Ok(records)
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = cli.to_app_config()?;
    let started = chrono::Utc::now();
    let mem_start = memory_stats_mb();

    // File batches are pre-fetched snapshots, so they enter through the
    // same adapter seam a live source would.
    let fetch_started = Instant::now();
    let registry = SourceRegistry::new(
        Box::new(StaticSource {
            source_name: "inspections",
            about: "health-inspection registry batch",
            origin: Origin::Inspection,
            records: read_batch(&cli.inspections_path)?,
        }),
        Box::new(StaticSource {
            source_name: "liquor",
            about: "liquor-license registry batch",
            origin: Origin::Liquor,
            records: read_batch(&cli.liquor_path)?,
        }),
    );
    let now = chrono::Utc::now();
    let raw_a = resolve_batch(registry.inspections.as_ref(), None, &cfg.cache, now)?;
    let raw_b = resolve_batch(registry.liquor.as_ref(), None, &cfg.cache, now)?;
    let fetch_time = fetch_started.elapsed();
    info!(
        "loaded {} inspection and {} liquor records",
        raw_a.len(),
        raw_b.len()
    );

    let out = run_pipeline(raw_a, raw_b, &cfg);

    let export_started = Instant::now();
    export_entities_csv(&out.entities, Path::new(&cli.out_path))?;
    let export_time = export_started.elapsed();
    info!(
        "wrote {} entities to {}",
        out.entities.len(),
        cli.out_path
    );

    let ended = chrono::Utc::now();
    let mem_end = memory_stats_mb();
    let summary = SummaryBuilder::new(&cli.inspections_path, &cli.liquor_path)
        .with_counts(out.counts)
        .with_timestamps(started, ended)
        .with_memory(mem_start.used_mb, mem_end.used_mb)
        .with_timings(
            fetch_time,
            out.timings.normalize,
            out.timings.matching,
            export_time,
        )
        .build();
    let summary_path = cli.summary_path();
    export_summary_csv(&summary, Path::new(&summary_path))?;
    info!(
        "run complete in {:.3}s: {} merged, {} standalone (summary: {})",
        summary.duration_secs, out.counts.merged_total, out.counts.standalone_total, summary_path
    );
    Ok(())
}

fn main() {
    init_tracing_from_env();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
