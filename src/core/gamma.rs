//! 1-D gamma index, the default [`ComparisonEngine`].

use crate::domain::model::ComparisonOptions;
use crate::domain::ports::ComparisonEngine;
use crate::utils::error::{CompareError, Result};

/// Upper bound on `interp_fraction * max_index`, the search steps per side.
pub const MAX_SEARCH_STEPS: usize = 10_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct GammaEngine;

impl GammaEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ComparisonEngine for GammaEngine {
    fn compare(
        &self,
        axis_reference: &[f64],
        dose_reference: &[f64],
        axis_evaluation: &[f64],
        dose_evaluation: &[f64],
        options: &ComparisonOptions,
    ) -> Result<Vec<f64>> {
        check_options(options)?;
        if axis_reference.len() != dose_reference.len() {
            return Err(CompareError::engine(format!(
                "reference axis has {} values but dose has {}",
                axis_reference.len(),
                dose_reference.len()
            )));
        }
        if axis_reference.is_empty() {
            return Err(CompareError::engine("reference profile is empty"));
        }

        let curve = EvaluationCurve::new(axis_evaluation, dose_evaluation)?;

        let max_reference = dose_reference
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if !(max_reference > 0.0) {
            return Err(CompareError::engine(
                "reference dose has no positive values",
            ));
        }

        let search = Search {
            options,
            max_reference,
            cutoff: options.lower_percent_dose_cutoff / 100.0 * max_reference,
            step: options.distance_mm_threshold / options.interp_fraction as f64,
            steps: (options.max_index * options.interp_fraction as f64).ceil() as i64,
        };

        Ok(axis_reference
            .iter()
            .zip(dose_reference)
            .map(|(&position, &dose)| search.index_at(&curve, position, dose))
            .collect())
    }
}

fn check_options(options: &ComparisonOptions) -> Result<()> {
    let positive = [
        ("dose_percent_threshold", options.dose_percent_threshold),
        ("distance_mm_threshold", options.distance_mm_threshold),
        ("max_index", options.max_index),
    ];
    for (name, value) in positive {
        if !(value > 0.0) || !value.is_finite() {
            return Err(CompareError::engine(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
    }
    if options.interp_fraction == 0 {
        return Err(CompareError::engine("interp_fraction must be at least 1"));
    }
    let steps = options.max_index * options.interp_fraction as f64;
    if steps.ceil() > MAX_SEARCH_STEPS as f64 {
        return Err(CompareError::engine(format!(
            "interp_fraction * max_index is {}, at most {} search steps are allowed",
            steps, MAX_SEARCH_STEPS
        )));
    }
    Ok(())
}

struct Search<'a> {
    options: &'a ComparisonOptions,
    max_reference: f64,
    cutoff: f64,
    step: f64,
    steps: i64,
}

impl Search<'_> {
    fn index_at(&self, curve: &EvaluationCurve, position: f64, dose: f64) -> f64 {
        if !dose.is_finite() || dose < self.cutoff || !curve.covers(position) {
            return f64::NAN;
        }

        let norm = if self.options.local_normalization {
            dose
        } else {
            self.max_reference
        };
        let dose_tolerance = self.options.dose_percent_threshold / 100.0 * norm;
        if !(dose_tolerance > 0.0) {
            return f64::NAN;
        }

        let mut best = self.options.max_index;
        for k in -self.steps..=self.steps {
            let offset = k as f64 * self.step;
            let Some(evaluated) = curve.at(position + offset) else {
                continue;
            };
            let distance = offset / self.options.distance_mm_threshold;
            let difference = (evaluated - dose) / dose_tolerance;
            best = best.min((distance * distance + difference * difference).sqrt());
        }
        best
    }
}

/// Evaluation profile sorted by position, linearly interpolated.
struct EvaluationCurve {
    axis: Vec<f64>,
    dose: Vec<f64>,
}

impl EvaluationCurve {
    fn new(axis: &[f64], dose: &[f64]) -> Result<Self> {
        if axis.len() != dose.len() {
            return Err(CompareError::engine(format!(
                "evaluation axis has {} values but dose has {}",
                axis.len(),
                dose.len()
            )));
        }

        let mut samples: Vec<(f64, f64)> = axis
            .iter()
            .copied()
            .zip(dose.iter().copied())
            .filter(|(x, d)| x.is_finite() && d.is_finite())
            .collect();
        if samples.is_empty() {
            return Err(CompareError::engine("evaluation profile has no finite samples"));
        }
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (axis, dose) = samples.into_iter().unzip();
        Ok(Self { axis, dose })
    }

    fn covers(&self, position: f64) -> bool {
        match (self.axis.first(), self.axis.last()) {
            (Some(&first), Some(&last)) => position >= first && position <= last,
            _ => false,
        }
    }

    fn at(&self, position: f64) -> Option<f64> {
        if !self.covers(position) {
            return None;
        }
        let upper = self.axis.partition_point(|&x| x < position);
        if upper == 0 || self.axis[upper] == position {
            return Some(self.dose[upper]);
        }

        let (x0, x1) = (self.axis[upper - 1], self.axis[upper]);
        let (y0, y1) = (self.dose[upper - 1], self.dose[upper]);
        let t = ((position - x0) / (x1 - x0)).clamp(0.0, 1.0);
        Some(y0 + (y1 - y0) * t)
    }
}
