use crate::domain::model::BatchSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What a finished run hands back to the caller.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub output_path: String,
    pub summary: BatchSummary,
}

pub struct AnalysisRunner<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AnalysisRunner<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutput> {
        tracing::info!("Starting profile comparison");
        self.monitor.log_stats("Start");

        tracing::info!("Reading profile files...");
        let context = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} reference and {} measurement profiles",
            context.reference.len(),
            context.measurement.len()
        );
        self.monitor.log_stats("Extract");

        tracing::info!("Comparing matched profiles...");
        let result = self.pipeline.transform(context).await?;
        tracing::info!(
            "Compared {} pairs: {} succeeded, {} failed",
            result.matched(),
            result.succeeded(),
            result.failed()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Writing report...");
        let output_path = self.pipeline.load(&result).await?;
        tracing::info!("Report saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunOutput {
            output_path,
            summary: result.summary(&self.pipeline.pass_bands()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AnalysisContext, BatchResult, Direction, MatchedPair, NormalizedPoint, NormalizedProfile,
        PairOutcome, PairReport, PairStatus, PassBand, PassBands, Position, ProfileHeader,
        ProfileRow, ProfileSet,
    };
    use crate::utils::error::CompareError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn profile() -> NormalizedProfile {
        let header = ProfileHeader {
            id: 1,
            date: "03-15-2024".to_string(),
            time: "10:00:00".to_string(),
            scan_type: "PRO".to_string(),
            beam_type: "PHO".to_string(),
            beam_energy: 6.0,
            field_size_x: 100.0,
            field_size_y: 100.0,
            ssd: 1000.0,
            start: Position::new(0.0, -1.0, 100.0),
            stop: Position::new(0.0, 1.0, 100.0),
        };
        NormalizedProfile {
            axis: vec![0.0],
            dose: vec![1.0],
            direction: Direction::Inline,
            representative: ProfileRow {
                header,
                point: NormalizedPoint {
                    position: Position::new(0.0, 0.0, 100.0),
                    dose: 100.0,
                    normalized_dose: 1.0,
                },
            },
        }
    }

    struct StubPipeline {
        fail_extract: bool,
        loaded: AtomicBool,
    }

    impl StubPipeline {
        fn new(fail_extract: bool) -> Self {
            Self {
                fail_extract,
                loaded: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<AnalysisContext> {
            if self.fail_extract {
                return Err(CompareError::parse(3, "missing tag"));
            }
            let empty = || ProfileSet::new(Vec::new(), Vec::new(), None);
            Ok(AnalysisContext::new(empty(), empty()))
        }

        async fn transform(&self, _context: AnalysisContext) -> Result<BatchResult> {
            Ok(BatchResult {
                outcomes: vec![
                    PairOutcome {
                        pair: MatchedPair::new(1, 2),
                        result: Ok(PairReport {
                            pair: MatchedPair::new(1, 2),
                            direction: Direction::Inline,
                            pass_ratio: 0.92,
                            index: vec![0.5],
                            reference: profile(),
                            measurement: profile(),
                        }),
                    },
                    PairOutcome {
                        pair: MatchedPair::new(3, 4),
                        result: Err(CompareError::normalization("no central-axis point")),
                    },
                ],
            })
        }

        async fn load(&self, _result: &BatchResult) -> Result<String> {
            self.loaded.store(true, Ordering::SeqCst);
            Ok("out/report.zip".to_string())
        }

        fn pass_bands(&self) -> PassBands {
            PassBands {
                pass_threshold: 0.9,
                marginal_threshold: 0.8,
            }
        }
    }

    #[tokio::test]
    async fn test_run_returns_summary_and_path() {
        let runner = AnalysisRunner::new(StubPipeline::new(false));
        let output = runner.run().await.unwrap();

        assert_eq!(output.output_path, "out/report.zip");
        assert_eq!(output.summary.matched, 2);
        assert_eq!(output.summary.succeeded, 1);
        assert_eq!(output.summary.failed, 1);
        assert_eq!(output.summary.pairs[0].band, Some(PassBand::Pass));
        assert_eq!(output.summary.pairs[1].status, PairStatus::Failed);
        assert!(runner.pipeline.loaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_extract_failure_stops_run() {
        let runner = AnalysisRunner::new_with_monitoring(StubPipeline::new(true), true);
        let err = runner.run().await.unwrap_err();

        assert!(matches!(err, CompareError::ParseError { line: 3, .. }));
        assert!(!runner.pipeline.loaded.load(Ordering::SeqCst));
    }
}
