use crate::core::matcher::match_profiles;
use crate::core::normalizer::normalize_pair;
use crate::domain::model::{
    AnalysisContext, BatchResult, ComparisonOptions, MatchCriteria, MatchedPair, PairOutcome,
    PairReport,
};
use crate::domain::ports::ComparisonEngine;
use crate::utils::error::{CompareError, Result};

/// Matches profiles and compares every pair, one pair at a time.
pub struct Orchestrator<E: ComparisonEngine> {
    engine: E,
    options: ComparisonOptions,
    criteria: MatchCriteria,
}

impl<E: ComparisonEngine> Orchestrator<E> {
    pub fn new(engine: E, options: ComparisonOptions, criteria: MatchCriteria) -> Self {
        Self {
            engine,
            options,
            criteria,
        }
    }

    pub fn options(&self) -> &ComparisonOptions {
        &self.options
    }

    /// Outcomes follow measurement-header order. A failing pair is recorded
    /// and the batch moves on.
    pub fn run(&self, context: &AnalysisContext) -> BatchResult {
        let pairs = match_profiles(
            context.measurement.headers(),
            context.reference.headers(),
            &self.criteria,
        );
        tracing::info!("Found {} matching profile pairs", pairs.len());

        let outcomes = pairs
            .into_iter()
            .map(|pair| {
                let result = self.process_pair(context, pair);
                match &result {
                    Ok(report) => tracing::info!(
                        "✓ Pair ({}): {} {:.2}% pass rate",
                        pair,
                        report.direction,
                        report.pass_ratio * 100.0
                    ),
                    Err(e) => tracing::warn!("✗ Pair ({}) failed: {}", pair, e),
                }
                PairOutcome { pair, result }
            })
            .collect();

        BatchResult { outcomes }
    }

    pub fn process_pair(&self, context: &AnalysisContext, pair: MatchedPair) -> Result<PairReport> {
        let normalized = normalize_pair(context, pair)?;

        let index = self.engine.compare(
            &normalized.reference.axis,
            &normalized.reference.dose,
            &normalized.measurement.axis,
            &normalized.measurement.dose,
            &self.options,
        )?;
        if index.len() != normalized.reference.axis.len() {
            return Err(CompareError::engine(format!(
                "engine returned {} values for {} reference points",
                index.len(),
                normalized.reference.axis.len()
            )));
        }

        let pass_ratio = pass_ratio(&index).ok_or_else(|| {
            CompareError::engine("no reference point could be evaluated (all values are NaN)")
        })?;
        tracing::debug!(
            "Pair ({}): {} of {} reference points evaluable",
            pair,
            index.iter().filter(|g| !g.is_nan()).count(),
            index.len()
        );

        Ok(PairReport {
            pair,
            direction: normalized.direction,
            pass_ratio,
            index,
            reference: normalized.reference,
            measurement: normalized.measurement,
        })
    }
}

/// Share of non-NaN values that are at most 1; `None` when all are NaN.
pub fn pass_ratio(index: &[f64]) -> Option<f64> {
    let (passed, valid) = index
        .iter()
        .filter(|g| !g.is_nan())
        .fold((0usize, 0usize), |(passed, valid), &g| {
            (passed + usize::from(g <= 1.0), valid + 1)
        });

    (valid > 0).then(|| passed as f64 / valid as f64)
}
