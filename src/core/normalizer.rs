use crate::domain::model::{
    AnalysisContext, Direction, MatchedPair, NormalizedPair, NormalizedPoint, NormalizedProfile,
    ProfileHeader, ProfileId, ProfileRow, ProfileSet,
};
use crate::utils::error::{CompareError, Result};
use std::cmp::Ordering;

/// Fewest raw points that still leave one after dropping both ends.
pub const MIN_TRIMMABLE_POINTS: usize = 3;

/// Prepares both sides of a matched pair for comparison.
///
/// Each side is normalised to its central-axis dose, sorted by (x, y) and
/// trimmed by one point at each end. The scan direction comes from the
/// reference side and decides which axis both sides are compared along.
pub fn normalize_pair(context: &AnalysisContext, pair: MatchedPair) -> Result<NormalizedPair> {
    let reference = prepare_side(&context.reference, pair.reference_id, "reference")?;
    let measurement = prepare_side(&context.measurement, pair.measurement_id, "measurement")?;

    let direction = infer_direction(&reference.points)?;

    Ok(NormalizedPair {
        direction,
        reference: reference.project(direction),
        measurement: measurement.project(direction),
    })
}

struct TrimmedProfile {
    header: ProfileHeader,
    points: Vec<NormalizedPoint>,
}

impl TrimmedProfile {
    fn project(self, direction: Direction) -> NormalizedProfile {
        let axis = self
            .points
            .iter()
            .map(|p| match direction {
                Direction::Inline => p.position.y,
                Direction::Crossline => p.position.x,
            })
            .collect();
        let dose = self.points.iter().map(|p| p.normalized_dose).collect();

        NormalizedProfile {
            axis,
            dose,
            direction,
            representative: ProfileRow {
                header: self.header,
                point: self.points[0],
            },
        }
    }
}

fn prepare_side(set: &ProfileSet, id: ProfileId, side: &str) -> Result<TrimmedProfile> {
    let header = set
        .header(id)
        .cloned()
        .ok_or_else(|| CompareError::normalization(format!("{} profile #{} has no header", side, id)))?;

    let center = central_axis_dose(set, id).map_err(|e| match e {
        CompareError::NormalizationError { message } => {
            CompareError::normalization(format!("{} profile #{}: {}", side, id, message))
        }
        other => other,
    })?;

    let mut points: Vec<NormalizedPoint> = set
        .points_for(id)
        .map(|p| NormalizedPoint {
            position: p.position,
            dose: p.dose,
            normalized_dose: p.dose / center,
        })
        .collect();

    // -0.0 and 0.0 compare equal; coordinates are finite after parsing
    points.sort_by(|a, b| {
        let by_x = a.position.x.partial_cmp(&b.position.x);
        let by_y = a.position.y.partial_cmp(&b.position.y);
        by_x.unwrap_or(Ordering::Equal).then(by_y.unwrap_or(Ordering::Equal))
    });

    let points = trim_edges(points).map_err(|count| {
        CompareError::normalization(format!(
            "{} profile #{} has {} points, at least {} are needed to trim scan edges",
            side, id, count, MIN_TRIMMABLE_POINTS
        ))
    })?;

    Ok(TrimmedProfile { header, points })
}

/// Mean raw dose of the points inside the central-axis square.
pub fn central_axis_dose(set: &ProfileSet, id: ProfileId) -> Result<f64> {
    let (sum, count) = set
        .points_for(id)
        .filter(|p| p.position.on_central_axis())
        .fold((0.0, 0usize), |(sum, count), p| (sum + p.dose, count + 1));

    if count == 0 {
        return Err(CompareError::normalization(
            "no points within ±1 mm of the central axis",
        ));
    }

    let mean = sum / count as f64;
    if mean == 0.0 || !mean.is_finite() {
        return Err(CompareError::normalization(format!(
            "central-axis dose {} cannot be used for normalisation",
            mean
        )));
    }
    Ok(mean)
}

/// Drops the first and last point; `Err` carries the point count when
/// there are too few to trim.
fn trim_edges<T>(mut points: Vec<T>) -> std::result::Result<Vec<T>, usize> {
    if points.len() < MIN_TRIMMABLE_POINTS {
        return Err(points.len());
    }
    points.pop();
    points.remove(0);
    Ok(points)
}

/// Inline when x at the midpoint equals x at the start, crossline when y does.
pub fn infer_direction(points: &[NormalizedPoint]) -> Result<Direction> {
    let (Some(first), Some(mid)) = (points.first(), points.get(points.len() / 2)) else {
        return Err(CompareError::normalization(
            "no points left to infer the scan direction",
        ));
    };

    if mid.position.x == first.position.x {
        Ok(Direction::Inline)
    } else if mid.position.y == first.position.y {
        Ok(Direction::Crossline)
    } else {
        Err(CompareError::AmbiguousDirectionError {
            first_x: first.position.x,
            mid_x: mid.position.x,
            first_y: first.position.y,
            mid_y: mid.position.y,
        })
    }
}
