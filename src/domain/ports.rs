use crate::domain::model::{
    AnalysisContext, BatchResult, BatchSummary, ComparisonOptions, MatchCriteria, PairReport,
    PassBands,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn reference_file(&self) -> &str;
    fn measurement_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn report_name(&self) -> &str;
    fn comparison_options(&self) -> &ComparisonOptions;
    fn match_criteria(&self) -> &MatchCriteria;
    fn pass_bands(&self) -> PassBands;
}

/// Dose-distribution index calculator.
///
/// Returns one value per reference point; NaN where the evaluation curve
/// cannot be evaluated at that point.
pub trait ComparisonEngine: Send + Sync {
    fn compare(
        &self,
        axis_reference: &[f64],
        dose_reference: &[f64],
        axis_evaluation: &[f64],
        dose_evaluation: &[f64],
        options: &ComparisonOptions,
    ) -> Result<Vec<f64>>;
}

/// Cumulative output document, one page per compared pair.
pub trait ReportRenderer {
    fn append_page(&mut self, report: &PairReport) -> Result<()>;
    fn finish(self, summary: &BatchSummary) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<AnalysisContext>;
    async fn transform(&self, context: AnalysisContext) -> Result<BatchResult>;
    async fn load(&self, result: &BatchResult) -> Result<String>;

    fn pass_bands(&self) -> PassBands {
        PassBands::default()
    }
}
