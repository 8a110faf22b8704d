use crate::domain::model::{MatchCriteria, MatchedPair, ProfileHeader};

/// Pairs every measurement header with the first compatible reference header.
///
/// First match wins, in reference list order; a closer depth further down
/// the list does not replace it. Measurements without a compatible reference
/// are left out of the result.
pub fn match_profiles(
    measurements: &[ProfileHeader],
    references: &[ProfileHeader],
    criteria: &MatchCriteria,
) -> Vec<MatchedPair> {
    let mut pairs = Vec::new();

    for measurement in measurements {
        match references
            .iter()
            .find(|reference| is_compatible(measurement, reference, criteria))
        {
            Some(reference) => {
                tracing::debug!(
                    "Matched measurement #{} to reference #{}: {} {} {}MV, {}mm field, depth {}mm",
                    measurement.id,
                    reference.id,
                    measurement.scan_type,
                    measurement.beam_type,
                    measurement.beam_energy,
                    measurement.field_size_x,
                    measurement.depth()
                );
                pairs.push(MatchedPair::new(measurement.id, reference.id));
            }
            None => {
                tracing::debug!(
                    "No reference profile for measurement #{} ({} {}MV, {}mm field, depth {}mm)",
                    measurement.id,
                    measurement.beam_type,
                    measurement.beam_energy,
                    measurement.field_size_x,
                    measurement.depth()
                );
            }
        }
    }

    if pairs.is_empty() {
        tracing::warn!(
            "No measurement profile matched any of the {} reference profiles",
            references.len()
        );
    }

    pairs
}

/// Same scan, beam and field, nearby depth, and a shared axis through the
/// beam centre so the scan direction can be inferred.
pub fn is_compatible(
    measurement: &ProfileHeader,
    reference: &ProfileHeader,
    criteria: &MatchCriteria,
) -> bool {
    let centred_x = measurement.start.x == 0.0 && reference.start.x == 0.0;
    let centred_y = measurement.start.y == 0.0 && reference.start.y == 0.0;

    measurement.scan_type == reference.scan_type
        && measurement.beam_type == reference.beam_type
        && measurement.beam_energy == reference.beam_energy
        && measurement.field_size_x == reference.field_size_x
        && (measurement.depth() - reference.depth()).abs() < criteria.depth_tolerance_mm
        && (centred_x || centred_y)
}
