use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExportError;
use crate::models::{MergedVenue, Origin};

/// Everything the summary sheet reports about one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub source_a: String,
    pub source_b: String,
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
    pub fetch_time: std::time::Duration,
    pub normalize_time: std::time::Duration,
    pub match_time: std::time::Duration,
    pub export_time: std::time::Duration,
    pub mem_used_start_mb: u64,
    pub mem_used_end_mb: u64,
    pub started_utc: chrono::DateTime<chrono::Utc>,
    pub ended_utc: chrono::DateTime<chrono::Utc>,
    pub duration_secs: f64,
}

pub fn export_entities_csv(entities: &[MergedVenue], path: &Path) -> Result<(), ExportError> {
    let attr_names = collect_attr_names(entities);

    let file = File::create(path).map_err(|e| ExportError::Csv(e.to_string()))?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    let mut w = WriterBuilder::new().from_writer(buf_writer);

    write_entity_headers(&mut w, &attr_names)?;
    for entity in entities {
        write_entity(&mut w, entity, &attr_names)?;
    }
    w.flush().map_err(|e| ExportError::Csv(e.to_string()))?;
    Ok(())
}

/// Union of attribute names across all entities, sorted for a stable
/// column order.
fn collect_attr_names(entities: &[MergedVenue]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for entity in entities {
        for key in entity.venue.attrs.keys() {
            names.insert(key.clone());
        }
    }
    names.into_iter().collect()
}

fn write_entity_headers<W: std::io::Write>(
    w: &mut Writer<W>,
    attr_names: &[String],
) -> Result<(), ExportError> {
    let mut headers = vec![
        "name".to_string(),
        "address".to_string(),
        "normalized_address".to_string(),
        "borough".to_string(),
        "origin".to_string(),
        "inspection_id".to_string(),
        "liquor_id".to_string(),
        "lat".to_string(),
        "lon".to_string(),
        "tags".to_string(),
    ];
    for name in attr_names {
        headers.push(format!("attr_{name}"));
    }
    w.write_record(&headers)
        .map_err(|e| ExportError::Csv(e.to_string()))
}

fn write_entity<W: std::io::Write>(
    w: &mut Writer<W>,
    entity: &MergedVenue,
    attr_names: &[String],
) -> Result<(), ExportError> {
    let v = &entity.venue;
    let (inspection_id, liquor_id) = ids_by_origin(entity);
    let mut row = vec![
        v.name.clone(),
        v.raw_address.clone(),
        v.normalized_address.clone(),
        v.borough.map(|b| b.name().to_string()).unwrap_or_default(),
        entity.origin_label().to_string(),
        inspection_id,
        liquor_id,
        v.lat.map(|x| x.to_string()).unwrap_or_default(),
        v.lon.map(|x| x.to_string()).unwrap_or_default(),
        v.tags.join(";"),
    ];
    for name in attr_names {
        row.push(v.attrs.get(name).cloned().unwrap_or_default());
    }
    w.write_record(&row)
        .map_err(|e| ExportError::Csv(e.to_string()))
}

fn ids_by_origin(entity: &MergedVenue) -> (String, String) {
    let mut inspection = String::new();
    let mut liquor = String::new();
    let mut put = |origin: Origin, id: &str| match origin {
        Origin::Inspection => inspection = id.to_string(),
        Origin::Liquor => liquor = id.to_string(),
    };
    put(entity.venue.origin, &entity.venue.source_id);
    if let Some(ref p) = entity.partner {
        put(p.origin, &p.source_id);
    }
    (inspection, liquor)
}

pub fn export_summary_csv(summary: &RunSummary, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|e| ExportError::Csv(e.to_string()))?;
    let mut w = WriterBuilder::new().from_writer(BufWriter::new(file));

    w.write_record(["metric", "value"])
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    let rows: Vec<(&str, String)> = vec![
        ("source_a", summary.source_a.clone()),
        ("source_b", summary.source_b.clone()),
        ("raw_a", summary.raw_a.to_string()),
        ("raw_b", summary.raw_b.to_string()),
        ("rejected_a", summary.rejected_a.to_string()),
        ("rejected_b", summary.rejected_b.to_string()),
        ("deduped_a", summary.deduped_a.to_string()),
        ("deduped_b", summary.deduped_b.to_string()),
        ("matched_exact", summary.matched_exact.to_string()),
        ("matched_range", summary.matched_range.to_string()),
        ("matched_geo", summary.matched_geo.to_string()),
        ("merged_total", summary.merged_total.to_string()),
        ("standalone_total", summary.standalone_total.to_string()),
        (
            "fetch_time_secs",
            format!("{:.3}", summary.fetch_time.as_secs_f64()),
        ),
        (
            "normalize_time_secs",
            format!("{:.3}", summary.normalize_time.as_secs_f64()),
        ),
        (
            "match_time_secs",
            format!("{:.3}", summary.match_time.as_secs_f64()),
        ),
        (
            "export_time_secs",
            format!("{:.3}", summary.export_time.as_secs_f64()),
        ),
        ("mem_used_start_mb", summary.mem_used_start_mb.to_string()),
        ("mem_used_end_mb", summary.mem_used_end_mb.to_string()),
        ("started_utc", summary.started_utc.to_rfc3339()),
        ("ended_utc", summary.ended_utc.to_rfc3339()),
        ("duration_secs", format!("{:.3}", summary.duration_secs)),
    ];
    for (metric, value) in rows {
        w.write_record([metric, value.as_str()])
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }
    w.flush().map_err(|e| ExportError::Csv(e.to_string()))?;
    Ok(())
}
