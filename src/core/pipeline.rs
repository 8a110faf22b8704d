use crate::core::orchestrator::Orchestrator;
use crate::core::parser::parse_profiles;
use crate::core::report::ArchiveReport;
use crate::domain::model::{AnalysisContext, BatchResult, PassBands, ProfileSet};
use crate::domain::ports::{ComparisonEngine, ConfigProvider, Pipeline, ReportRenderer, Storage};
use crate::utils::error::Result;
use std::path::Path;

/// Reads both exports from storage, compares every matched pair and writes
/// the report archive back to storage.
pub struct ScanComparePipeline<S: Storage, C: ConfigProvider, E: ComparisonEngine> {
    storage: S,
    config: C,
    orchestrator: Orchestrator<E>,
}

impl<S: Storage, C: ConfigProvider, E: ComparisonEngine> ScanComparePipeline<S, C, E> {
    pub fn new(storage: S, config: C, engine: E) -> Self {
        let orchestrator = Orchestrator::new(
            engine,
            config.comparison_options().clone(),
            config.match_criteria().clone(),
        );

        Self {
            storage,
            config,
            orchestrator,
        }
    }

    async fn load_profiles(&self, role: &str, path: &str) -> Result<ProfileSet> {
        tracing::debug!("Reading {} file: {}", role, path);
        let bytes = self.storage.read_file(path).await?;
        let text = String::from_utf8_lossy(&bytes);

        let set = parse_profiles(&text).inspect_err(|e| {
            tracing::error!("Failed to parse {} file {}: {}", role, path, e);
        })?;
        tracing::info!(
            "Parsed {} profiles ({} points) from {} file",
            set.len(),
            set.points().len(),
            role
        );
        Ok(set)
    }

    fn report_path(&self) -> String {
        Path::new(self.config.output_path())
            .join(self.config.report_name())
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, E: ComparisonEngine> Pipeline for ScanComparePipeline<S, C, E> {
    async fn extract(&self) -> Result<AnalysisContext> {
        let reference = self
            .load_profiles("reference", self.config.reference_file())
            .await?;
        let measurement = self
            .load_profiles("measurement", self.config.measurement_file())
            .await?;

        Ok(AnalysisContext::new(reference, measurement))
    }

    async fn transform(&self, context: AnalysisContext) -> Result<BatchResult> {
        Ok(self.orchestrator.run(&context))
    }

    async fn load(&self, result: &BatchResult) -> Result<String> {
        let bands = self.config.pass_bands();
        let mut renderer = ArchiveReport::new(self.orchestrator.options().clone(), bands);

        for report in result.reports() {
            renderer.append_page(report)?;
        }
        let data = renderer.finish(&result.summary(&bands))?;

        let output_path = self.report_path();
        tracing::debug!("Writing report ({} bytes) to {}", data.len(), output_path);
        self.storage.write_file(&output_path, &data).await?;

        Ok(output_path)
    }

    fn pass_bands(&self) -> PassBands {
        self.config.pass_bands()
    }
}
