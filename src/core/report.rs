use crate::core::gamma::MAX_SEARCH_STEPS;
use crate::domain::model::{
    BatchSummary, ComparisonOptions, Direction, MatchedPair, NormalizedProfile, PairReport,
    PairStatus, PassBand, PassBands,
};
use crate::domain::ports::ReportRenderer;
use crate::utils::error::{CompareError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const SUMMARY_FILE: &str = "summary.csv";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const PAGES_DIR: &str = "pages";

/// ZIP report: a CSV summary, a manifest, and one JSON page per compared pair.
pub struct ArchiveReport {
    options: ComparisonOptions,
    bands: PassBands,
    zip: ZipWriter<Cursor<Vec<u8>>>,
    rows: HashMap<MatchedPair, RowMetadata>,
    pages: usize,
}

#[derive(Debug, Clone)]
struct RowMetadata {
    beam_type: String,
    beam_energy: f64,
    field_size_x: f64,
    field_size_y: f64,
    depth: f64,
}

#[derive(Serialize)]
struct ReportPage<'a> {
    page: usize,
    pair: MatchedPair,
    direction: Direction,
    normalization: &'static str,
    pass_ratio: f64,
    band: PassBand,
    evaluable_points: usize,
    index_histogram: Histogram,
    index: &'a [f64],
    reference: &'a NormalizedProfile,
    measurement: &'a NormalizedProfile,
}

#[derive(Debug, Serialize, PartialEq)]
struct Histogram {
    upper_bound: f64,
    counts: Vec<usize>,
}

#[derive(Serialize)]
struct Manifest<'a> {
    generated_at: DateTime<Utc>,
    normalization: &'static str,
    options: &'a ComparisonOptions,
    pass_bands: PassBands,
    pages: usize,
    summary: &'a BatchSummary,
}

#[derive(Serialize)]
struct SummaryRow {
    measurement_id: u32,
    reference_id: u32,
    status: &'static str,
    direction: String,
    pass_rate_percent: String,
    band: String,
    beam_type: String,
    beam_energy: String,
    field_size_mm: String,
    depth_mm: String,
    reason: String,
}

impl ArchiveReport {
    pub fn new(options: ComparisonOptions, bands: PassBands) -> Self {
        Self {
            options,
            bands,
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            rows: HashMap::new(),
            pages: 0,
        }
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.zip.start_file(name, SimpleFileOptions::default())?;
        self.zip.write_all(data)?;
        Ok(())
    }

    fn summary_csv(&self, summary: &BatchSummary) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        for entry in &summary.pairs {
            let meta = self.rows.get(&entry.pair);
            let row = SummaryRow {
                measurement_id: entry.pair.measurement_id,
                reference_id: entry.pair.reference_id,
                status: match entry.status {
                    PairStatus::Succeeded => "succeeded",
                    PairStatus::Failed => "failed",
                },
                direction: entry.direction.map(|d| d.to_string()).unwrap_or_default(),
                pass_rate_percent: entry
                    .pass_ratio
                    .map(|r| format!("{:.2}", r * 100.0))
                    .unwrap_or_default(),
                band: entry.band.map(|b| format!("{:?}", b)).unwrap_or_default(),
                beam_type: meta.map(|m| m.beam_type.clone()).unwrap_or_default(),
                beam_energy: meta.map(|m| m.beam_energy.to_string()).unwrap_or_default(),
                field_size_mm: meta
                    .map(|m| format!("{}x{}", m.field_size_x, m.field_size_y))
                    .unwrap_or_default(),
                depth_mm: meta.map(|m| m.depth.to_string()).unwrap_or_default(),
                reason: entry.reason.clone().unwrap_or_default(),
            };
            writer.serialize(row)?;
        }

        writer
            .into_inner()
            .map_err(|e| CompareError::IoError(e.into_error()))
    }
}

impl ReportRenderer for ArchiveReport {
    fn append_page(&mut self, report: &PairReport) -> Result<()> {
        self.pages += 1;
        let header = &report.reference.representative.header;
        self.rows.insert(
            report.pair,
            RowMetadata {
                beam_type: header.beam_type.clone(),
                beam_energy: header.beam_energy,
                field_size_x: header.field_size_x,
                field_size_y: header.field_size_y,
                depth: header.depth(),
            },
        );

        let page = ReportPage {
            page: self.pages,
            pair: report.pair,
            direction: report.direction,
            normalization: self.options.normalization_label(),
            pass_ratio: report.pass_ratio,
            band: self.bands.classify(report.pass_ratio),
            evaluable_points: report.valid_index().count(),
            index_histogram: index_histogram(report.valid_index(), &self.options),
            index: &report.index,
            reference: &report.reference,
            measurement: &report.measurement,
        };
        let json = serde_json::to_vec_pretty(&page)?;

        let name = format!(
            "{}/{:03}_m{}_r{}.json",
            PAGES_DIR, self.pages, report.pair.measurement_id, report.pair.reference_id
        );
        tracing::debug!("Adding report page {}", name);
        self.write_entry(&name, &json)
    }

    fn finish(mut self, summary: &BatchSummary) -> Result<Vec<u8>> {
        let csv = self.summary_csv(summary)?;
        self.write_entry(SUMMARY_FILE, &csv)?;

        let manifest = Manifest {
            generated_at: Utc::now(),
            normalization: self.options.normalization_label(),
            options: &self.options,
            pass_bands: self.bands,
            pages: self.pages,
            summary,
        };
        let json = serde_json::to_vec_pretty(&manifest)?;
        self.write_entry(MANIFEST_FILE, &json)?;

        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// `interp_fraction * max_index` equal bins over `[0, max_index]`, capped at
/// [`MAX_SEARCH_STEPS`]; the top edge falls in the last bin.
fn index_histogram(values: impl Iterator<Item = f64>, options: &ComparisonOptions) -> Histogram {
    let bins = ((options.interp_fraction as f64 * options.max_index).round() as usize)
        .clamp(1, MAX_SEARCH_STEPS);
    let mut counts = vec![0; bins];

    for value in values {
        if !(0.0..=options.max_index).contains(&value) {
            continue;
        }
        let bin = ((value / options.max_index) * bins as f64) as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    Histogram {
        upper_bound: options.max_index,
        counts,
    }
}
