use crate::config::toml_config::TomlConfig;
use crate::domain::model::{ComparisonOptions, MatchCriteria, PassBands};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CompareError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_path, validate_positive, validate_range,
    validate_required_field, Validate,
};
use serde::Serialize;

pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_REPORT_NAME: &str = "scan_compare_report.zip";
pub const MAX_INTERP_FRACTION: usize = 100;
pub const MAX_INDEX: f64 = 10.0;

/// Values given on the command line; they win over the TOML file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub reference: Option<String>,
    pub measurement: Option<String>,
    pub output_path: Option<String>,
    pub report_name: Option<String>,
}

/// Fully resolved settings for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSettings {
    pub reference_file: String,
    pub measurement_file: String,
    pub output_path: String,
    pub report_name: String,
    pub comparison: ComparisonOptions,
    pub matching: MatchCriteria,
    pub pass_bands: PassBands,
}

impl AnalysisSettings {
    pub fn new(reference_file: impl Into<String>, measurement_file: impl Into<String>) -> Self {
        Self {
            reference_file: reference_file.into(),
            measurement_file: measurement_file.into(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
            comparison: ComparisonOptions::default(),
            matching: MatchCriteria::default(),
            pass_bands: PassBands::default(),
        }
    }

    pub fn with_output_path(mut self, output_path: impl Into<String>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn resolve(file: TomlConfig, overrides: SettingsOverrides) -> Result<Self> {
        let reference = overrides.reference.or(file.input.reference);
        let measurement = overrides.measurement.or(file.input.measurement);

        Ok(Self {
            reference_file: validate_required_field("input.reference", &reference)?.clone(),
            measurement_file: validate_required_field("input.measurement", &measurement)?.clone(),
            output_path: overrides
                .output_path
                .or(file.output.path)
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            report_name: overrides
                .report_name
                .or(file.output.report_name)
                .unwrap_or_else(|| DEFAULT_REPORT_NAME.to_string()),
            comparison: file.comparison,
            matching: file.matching,
            pass_bands: file.report,
        })
    }
}

impl ConfigProvider for AnalysisSettings {
    fn reference_file(&self) -> &str {
        &self.reference_file
    }

    fn measurement_file(&self) -> &str {
        &self.measurement_file
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn report_name(&self) -> &str {
        &self.report_name
    }

    fn comparison_options(&self) -> &ComparisonOptions {
        &self.comparison
    }

    fn match_criteria(&self) -> &MatchCriteria {
        &self.matching
    }

    fn pass_bands(&self) -> PassBands {
        self.pass_bands
    }
}

impl Validate for AnalysisSettings {
    fn validate(&self) -> Result<()> {
        validate_path("input.reference", &self.reference_file)?;
        validate_path("input.measurement", &self.measurement_file)?;
        validate_path("output.path", &self.output_path)?;
        validate_file_extensions(
            "output.report_name",
            std::slice::from_ref(&self.report_name),
            &["zip"],
        )?;

        let comparison = &self.comparison;
        validate_positive(
            "comparison.dose_percent_threshold",
            comparison.dose_percent_threshold,
        )?;
        validate_positive(
            "comparison.distance_mm_threshold",
            comparison.distance_mm_threshold,
        )?;
        validate_range(
            "comparison.lower_percent_dose_cutoff",
            comparison.lower_percent_dose_cutoff,
            0.0,
            100.0,
        )?;
        validate_range(
            "comparison.interp_fraction",
            comparison.interp_fraction,
            1,
            MAX_INTERP_FRACTION,
        )?;
        validate_positive("comparison.max_index", comparison.max_index)?;
        validate_range("comparison.max_index", comparison.max_index, 0.0, MAX_INDEX)?;

        validate_positive("matching.depth_tolerance_mm", self.matching.depth_tolerance_mm)?;

        validate_range("report.pass_threshold", self.pass_bands.pass_threshold, 0.0, 1.0)?;
        validate_range(
            "report.marginal_threshold",
            self.pass_bands.marginal_threshold,
            0.0,
            1.0,
        )?;
        if self.pass_bands.marginal_threshold > self.pass_bands.pass_threshold {
            return Err(CompareError::ConfigValidationError {
                field: "report.marginal_threshold".to_string(),
                message: "must not exceed report.pass_threshold".to_string(),
            });
        }

        Ok(())
    }
}
