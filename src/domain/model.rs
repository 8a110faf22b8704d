use crate::utils::error::CompareError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one measurement block, taken from `# Measurement number`.
pub type ProfileId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Inside the ±1 mm square around the beam centre.
    pub fn on_central_axis(&self) -> bool {
        self.x > -1.0 && self.x < 1.0 && self.y > -1.0 && self.y < 1.0
    }
}

/// Header of one scanned profile, committed at `:EOM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileHeader {
    pub id: ProfileId,
    pub date: String,
    pub time: String,
    pub scan_type: String,
    pub beam_type: String,
    pub beam_energy: f64,
    pub field_size_x: f64,
    pub field_size_y: f64,
    pub ssd: f64,
    pub start: Position,
    pub stop: Position,
}

impl ProfileHeader {
    /// Stop-Z of the scan; the key used to pair reference and measurement.
    pub fn depth(&self) -> f64 {
        self.stop.z
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub id: ProfileId,
    pub position: Position,
    pub dose: f64,
}

/// All profiles parsed from one export file. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    headers: Vec<ProfileHeader>,
    points: Vec<ProfilePoint>,
    declared_measurements: Option<usize>,
}

impl ProfileSet {
    pub fn new(
        headers: Vec<ProfileHeader>,
        points: Vec<ProfilePoint>,
        declared_measurements: Option<usize>,
    ) -> Self {
        Self {
            headers,
            points,
            declared_measurements,
        }
    }

    pub fn headers(&self) -> &[ProfileHeader] {
        &self.headers
    }

    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    /// Count announced by the file's `:MSR` line, if any. Informational only.
    pub fn declared_measurements(&self) -> Option<usize> {
        self.declared_measurements
    }

    pub fn header(&self, id: ProfileId) -> Option<&ProfileHeader> {
        self.headers.iter().find(|h| h.id == id)
    }

    pub fn points_for(&self, id: ProfileId) -> impl Iterator<Item = &ProfilePoint> + '_ {
        self.points.iter().filter(move |p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// The two profile sets of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub reference: ProfileSet,
    pub measurement: ProfileSet,
}

impl AnalysisContext {
    pub fn new(reference: ProfileSet, measurement: ProfileSet) -> Self {
        Self {
            reference,
            measurement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchedPair {
    pub measurement_id: ProfileId,
    pub reference_id: ProfileId,
}

impl MatchedPair {
    pub fn new(measurement_id: ProfileId, reference_id: ProfileId) -> Self {
        Self {
            measurement_id,
            reference_id,
        }
    }
}

impl fmt::Display for MatchedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "measurement #{} vs reference #{}",
            self.measurement_id, self.reference_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// x constant, compared along y
    Inline,
    /// y constant, compared along x
    Crossline,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inline => write!(f, "Inline"),
            Direction::Crossline => write!(f, "Crossline"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub position: Position,
    pub dose: f64,
    pub normalized_dose: f64,
}

/// Header plus first trimmed point of a profile, shown on the report page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub header: ProfileHeader,
    pub point: NormalizedPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProfile {
    pub axis: Vec<f64>,
    pub dose: Vec<f64>,
    pub direction: Direction,
    pub representative: ProfileRow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPair {
    pub direction: Direction,
    pub reference: NormalizedProfile,
    pub measurement: NormalizedProfile,
}

/// Named thresholds handed to the comparison engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonOptions {
    pub dose_percent_threshold: f64,
    pub distance_mm_threshold: f64,
    pub lower_percent_dose_cutoff: f64,
    pub interp_fraction: usize,
    #[serde(alias = "max_gamma")]
    pub max_index: f64,
    #[serde(alias = "local_gamma")]
    pub local_normalization: bool,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            dose_percent_threshold: 2.0,
            distance_mm_threshold: 2.0,
            lower_percent_dose_cutoff: 50.0,
            interp_fraction: 10,
            max_index: 2.0,
            local_normalization: false,
        }
    }
}

impl ComparisonOptions {
    pub fn normalization_label(&self) -> &'static str {
        if self.local_normalization {
            "Local gamma"
        } else {
            "Global gamma"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchCriteria {
    /// Depths must differ by strictly less than this.
    pub depth_tolerance_mm: f64,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            depth_tolerance_mm: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassBand {
    Pass,
    Marginal,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassBands {
    pub pass_threshold: f64,
    pub marginal_threshold: f64,
}

impl Default for PassBands {
    fn default() -> Self {
        Self {
            pass_threshold: 0.95,
            marginal_threshold: 0.90,
        }
    }
}

impl PassBands {
    pub fn classify(&self, pass_ratio: f64) -> PassBand {
        if pass_ratio >= self.pass_threshold {
            PassBand::Pass
        } else if pass_ratio >= self.marginal_threshold {
            PassBand::Marginal
        } else {
            PassBand::Fail
        }
    }
}

/// Everything the report needs for one successfully compared pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub pair: MatchedPair,
    pub direction: Direction,
    pub pass_ratio: f64,
    pub index: Vec<f64>,
    pub reference: NormalizedProfile,
    pub measurement: NormalizedProfile,
}

impl PairReport {
    pub fn valid_index(&self) -> impl Iterator<Item = f64> + '_ {
        self.index.iter().copied().filter(|g| !g.is_nan())
    }
}

#[derive(Debug)]
pub struct PairOutcome {
    pub pair: MatchedPair,
    pub result: Result<PairReport, CompareError>,
}

impl PairOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered outcomes of one batch, in match-discovery order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<PairOutcome>,
}

impl BatchResult {
    pub fn matched(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.matched() - self.succeeded()
    }

    pub fn reports(&self) -> impl Iterator<Item = &PairReport> + '_ {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (MatchedPair, &CompareError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.pair, e)))
    }

    pub fn summary(&self, bands: &PassBands) -> BatchSummary {
        let pairs = self
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(report) => PairSummary {
                    pair: outcome.pair,
                    status: PairStatus::Succeeded,
                    direction: Some(report.direction),
                    pass_ratio: Some(report.pass_ratio),
                    band: Some(bands.classify(report.pass_ratio)),
                    reason: None,
                },
                Err(e) => PairSummary {
                    pair: outcome.pair,
                    status: PairStatus::Failed,
                    direction: None,
                    pass_ratio: None,
                    band: None,
                    reason: Some(e.to_string()),
                },
            })
            .collect();

        BatchSummary {
            matched: self.matched(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            pairs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub pair: MatchedPair,
    pub status: PairStatus,
    pub direction: Option<Direction>,
    pub pass_ratio: Option<f64>,
    pub band: Option<PassBand>,
    pub reason: Option<String>,
}

/// Externally observable outcome of a full run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub matched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub pairs: Vec<PairSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_axis_bounds_are_exclusive() {
        assert!(Position::new(0.0, 0.5, 100.0).on_central_axis());
        assert!(Position::new(-0.99, 0.99, 0.0).on_central_axis());
        assert!(!Position::new(1.0, 0.0, 0.0).on_central_axis());
        assert!(!Position::new(0.0, -1.0, 0.0).on_central_axis());
    }

    #[test]
    fn test_pass_band_classification() {
        let bands = PassBands::default();
        assert_eq!(bands.classify(1.0), PassBand::Pass);
        assert_eq!(bands.classify(0.95), PassBand::Pass);
        assert_eq!(bands.classify(0.92), PassBand::Marginal);
        assert_eq!(bands.classify(0.5), PassBand::Fail);
    }

    #[test]
    fn test_comparison_options_accept_gamma_aliases() {
        let options: ComparisonOptions =
            toml::from_str("max_gamma = 3.0\nlocal_gamma = true\n").unwrap();
        assert_eq!(options.max_index, 3.0);
        assert!(options.local_normalization);
        assert_eq!(options.distance_mm_threshold, 2.0);
        assert_eq!(options.normalization_label(), "Local gamma");
    }

    #[test]
    fn test_batch_summary_counts_failures() {
        let batch = BatchResult {
            outcomes: vec![PairOutcome {
                pair: MatchedPair::new(1, 2),
                result: Err(CompareError::normalization("no central-axis points")),
            }],
        };

        let summary = batch.summary(&PassBands::default());
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pairs[0].status, PairStatus::Failed);
        assert!(summary.pairs[0]
            .reason
            .as_deref()
            .unwrap()
            .contains("central-axis"));
        assert_eq!(batch.failures().count(), 1);
    }
}
