//! Line-oriented reader for the scanner's ASCII profile export.
//!
//! Each non-empty line is split on tab, `#`, and line-break characters; the
//! first token is the tag. Header tags accumulate into the current block,
//! `=` lines add data points and `:EOM` commits the block's header.

use crate::domain::model::{Position, ProfileHeader, ProfileId, ProfilePoint, ProfileSet};
use crate::utils::error::{CompareError, Result};

const MEASUREMENT_NUMBER: &str = "Measurement number";
const MEASUREMENT_COUNT: &str = ":MSR";
const SCAN_TYPE: &str = "%SCN";
const DATE: &str = "%DAT";
const TIME: &str = "%TIM";
const FIELD_SIZE: &str = "%FSZ";
const BEAM: &str = "%BMT";
const SSD: &str = "%SSD";
const START: &str = "%STS";
const STOP: &str = "%EDS";
const DATA_POINT: &str = "=";
const END_OF_MEASUREMENT: &str = ":EOM";

const DELIMITERS: [char; 4] = ['\t', '#', '\r', '\n'];

/// Parses one export file into a [`ProfileSet`].
pub fn parse_profiles(text: &str) -> Result<ProfileSet> {
    let mut headers = Vec::new();
    let mut points = Vec::new();
    let mut declared_measurements = None;
    let mut current: Option<HeaderAccumulator> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let tokens = tokenize(raw_line);
        let Some((&tag, values)) = tokens.split_first() else {
            continue;
        };
        let line = LineFields {
            line_no: index + 1,
            tag,
            values,
        };

        if let Some(rest) = tag.strip_prefix(MEASUREMENT_NUMBER) {
            if let Some(open) = current.take() {
                open.ensure_closed(line.line_no)?;
            }
            let raw_id = match rest.trim() {
                "" => line.value(0, "measurement number")?,
                inline => inline,
            };
            current = Some(HeaderAccumulator::new(line.id(raw_id)?, line.line_no));
            continue;
        }

        match tag {
            MEASUREMENT_COUNT => {
                declared_measurements = values.first().and_then(|v| v.parse().ok());
            }
            DATA_POINT => {
                let block = line.block(&mut current)?;
                points.push(ProfilePoint {
                    id: block.id,
                    position: line.position(0)?,
                    dose: line.number(3, "dose")?,
                });
                block.points += 1;
            }
            END_OF_MEASUREMENT => {
                let block = line.block(&mut current)?;
                headers.push(block.commit(line.line_no)?);
                current = None;
            }
            SCAN_TYPE => line.block(&mut current)?.scan_type = Some(line.text(0, "scan type")?),
            DATE => line.block(&mut current)?.date = Some(line.text(0, "date")?),
            TIME => line.block(&mut current)?.time = Some(line.text(0, "time")?),
            FIELD_SIZE => {
                let size = (
                    line.number(0, "field size x")?,
                    line.number(1, "field size y")?,
                );
                line.block(&mut current)?.field_size = Some(size);
            }
            BEAM => {
                let beam = (line.text(0, "beam type")?, line.number(1, "beam energy")?);
                line.block(&mut current)?.beam = Some(beam);
            }
            SSD => {
                let ssd = line.number(0, "source-surface distance")?;
                line.block(&mut current)?.ssd = Some(ssd);
            }
            START => {
                let start = line.position(0)?;
                line.block(&mut current)?.start = Some(start);
            }
            STOP => {
                let stop = line.position(0)?;
                line.block(&mut current)?.stop = Some(stop);
            }
            _ => {}
        }
    }

    if let Some(open) = current {
        open.ensure_closed(text.lines().count())?;
    }

    if let Some(declared) = declared_measurements {
        if declared != headers.len() {
            tracing::warn!(
                "File announces {} measurements but {} were parsed",
                declared,
                headers.len()
            );
        }
    }

    tracing::debug!(
        "Parsed {} profiles with {} data points",
        headers.len(),
        points.len()
    );

    Ok(ProfileSet::new(headers, points, declared_measurements))
}

fn tokenize(line: &str) -> Vec<&str> {
    line.split(DELIMITERS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

struct LineFields<'a> {
    line_no: usize,
    tag: &'a str,
    values: &'a [&'a str],
}

impl LineFields<'_> {
    fn value(&self, index: usize, field: &str) -> Result<&str> {
        self.values.get(index).copied().ok_or_else(|| {
            CompareError::parse(
                self.line_no,
                format!("{} is missing value for {}", self.tag, field),
            )
        })
    }

    fn text(&self, index: usize, field: &str) -> Result<String> {
        self.value(index, field).map(str::to_string)
    }

    fn number(&self, index: usize, field: &str) -> Result<f64> {
        let raw = self.value(index, field)?;
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                CompareError::parse(
                    self.line_no,
                    format!("expected a number for {} in {}, found '{}'", field, self.tag, raw),
                )
            })
    }

    fn position(&self, offset: usize) -> Result<Position> {
        Ok(Position::new(
            self.number(offset, "x")?,
            self.number(offset + 1, "y")?,
            self.number(offset + 2, "z")?,
        ))
    }

    fn id(&self, raw: &str) -> Result<ProfileId> {
        let value = raw.parse::<f64>().map_err(|_| {
            CompareError::parse(
                self.line_no,
                format!("expected a numeric measurement number, found '{}'", raw),
            )
        })?;
        if value.fract() != 0.0 || value < 0.0 || value > f64::from(ProfileId::MAX) {
            return Err(CompareError::parse(
                self.line_no,
                format!("measurement number '{}' is not a non-negative integer", raw),
            ));
        }
        Ok(value as ProfileId)
    }

    fn block<'b>(&self, current: &'b mut Option<HeaderAccumulator>) -> Result<&'b mut HeaderAccumulator> {
        current.as_mut().ok_or_else(|| {
            CompareError::parse(
                self.line_no,
                format!("{} appears before any measurement header", self.tag),
            )
        })
    }
}

/// Header tags seen since the last `Measurement number` line.
struct HeaderAccumulator {
    id: ProfileId,
    opened_at: usize,
    points: usize,
    scan_type: Option<String>,
    date: Option<String>,
    time: Option<String>,
    field_size: Option<(f64, f64)>,
    beam: Option<(String, f64)>,
    ssd: Option<f64>,
    start: Option<Position>,
    stop: Option<Position>,
}

impl HeaderAccumulator {
    fn new(id: ProfileId, opened_at: usize) -> Self {
        Self {
            id,
            opened_at,
            points: 0,
            scan_type: None,
            date: None,
            time: None,
            field_size: None,
            beam: None,
            ssd: None,
            start: None,
            stop: None,
        }
    }

    fn ensure_closed(&self, line_no: usize) -> Result<()> {
        if self.points > 0 {
            return Err(CompareError::parse(
                line_no,
                format!(
                    "measurement {} (opened on line {}) has {} data points but no {}",
                    self.id, self.opened_at, self.points, END_OF_MEASUREMENT
                ),
            ));
        }
        Ok(())
    }

    fn commit(&mut self, line_no: usize) -> Result<ProfileHeader> {
        let id = self.id;
        let missing = |tag: &str| {
            CompareError::parse(
                line_no,
                format!("measurement {} ends without a {} line", id, tag),
            )
        };

        let (field_size_x, field_size_y) = self.field_size.ok_or_else(|| missing(FIELD_SIZE))?;
        let (beam_type, beam_energy) = self.beam.take().ok_or_else(|| missing(BEAM))?;

        Ok(ProfileHeader {
            id,
            date: self.date.take().ok_or_else(|| missing(DATE))?,
            time: self.time.take().ok_or_else(|| missing(TIME))?,
            scan_type: self.scan_type.take().ok_or_else(|| missing(SCAN_TYPE))?,
            beam_type,
            beam_energy,
            field_size_x,
            field_size_y,
            ssd: self.ssd.ok_or_else(|| missing(SSD))?,
            start: self.start.ok_or_else(|| missing(START))?,
            stop: self.stop.ok_or_else(|| missing(STOP))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = ":MSR \t2\t # No. of measurement in file\n\
:SYS BDS 0 # Beam Data Scanner System\n\
#\n\
# RFA300 ASCII Measurement Dump ( BDS format )\n\
#\n\
# Measurement number \t1\n\
#\n\
%VNR 1.0\n\
%MOD \tRAT\n\
%TYP \tSCN \n\
%SCN \tPRO \n\
%FLT \tNOF \n\
%DAT \t03-15-2024\n\
%TIM \t10:12:44\n\
%FSZ \t100\t100\n\
%BMT \tPHO\t    6.0\n\
%SSD \t1000\n\
%PTS \t3\n\
%STS \t    0.0\t  -10.0\t  100.0 # Start Scan values in mm ( X , Y , Z )\n\
%EDS \t    0.0\t   10.0\t  100.0 # End Scan values in mm ( X , Y , Z )\n\
#\n\
#\t  X      Y      Z     Dose\n\
#\n\
= \t    0.0\t  -10.0\t  100.0\t   50.0\n\
= \t    0.0\t    0.0\t  100.0\t  100.0\n\
= \t    0.0\t   10.0\t  100.0\t   50.0\n\
:EOM  # End of Measurement\n\
#\n\
# Measurement number \t2\n\
%SCN \tPRO \n\
%DAT \t03-15-2024\n\
%TIM \t10:20:01\n\
%FSZ \t200\t200\n\
%BMT \tPHO\t    6.0\n\
%SSD \t1000\n\
%STS \t  -20.0\t    0.0\t  200.0\n\
%EDS \t   20.0\t    0.0\t  200.0\n\
= \t  -20.0\t    0.0\t  200.0\t   40.0\n\
= \t    0.0\t    0.0\t  200.0\t   80.0\n\
:EOM  # End of Measurement\n\
:EOF # End of File\n";

    #[test]
    fn test_parse_headers_and_points() {
        let set = parse_profiles(SAMPLE).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.points().len(), 5);
        assert_eq!(set.declared_measurements(), Some(2));

        let first = &set.headers()[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.scan_type, "PRO");
        assert_eq!(first.date, "03-15-2024");
        assert_eq!(first.time, "10:12:44");
        assert_eq!(first.beam_type, "PHO");
        assert_eq!(first.beam_energy, 6.0);
        assert_eq!(first.field_size_x, 100.0);
        assert_eq!(first.field_size_y, 100.0);
        assert_eq!(first.ssd, 1000.0);
        assert_eq!(first.start, Position::new(0.0, -10.0, 100.0));
        assert_eq!(first.depth(), 100.0);

        let second = set.header(2).unwrap();
        assert_eq!(second.field_size_x, 200.0);
        assert_eq!(second.start.y, 0.0);
        assert_eq!(set.points_for(2).count(), 2);
        assert_eq!(set.points_for(1).nth(1).unwrap().dose, 100.0);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse_profiles(SAMPLE).unwrap();
        let second = parse_profiles(SAMPLE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_point_belongs_to_an_earlier_header() {
        let set = parse_profiles(SAMPLE).unwrap();
        for point in set.points() {
            assert!(set.header(point.id).is_some());
        }
    }

    #[test]
    fn test_crlf_line_endings() {
        let crlf = SAMPLE.replace('\n', "\r\n");
        let set = parse_profiles(&crlf).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.headers()[1].time, "10:20:01");
    }

    #[test]
    fn test_non_numeric_value_names_the_line() {
        let text = SAMPLE.replace("%SSD \t1000\n%PTS", "%SSD \tabc\n%PTS");
        let err = parse_profiles(&text).unwrap_err();
        match err {
            CompareError::ParseError { line, message } => {
                assert_eq!(line, 17);
                assert!(message.contains("abc"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_dose_is_rejected() {
        let text = SAMPLE.replace("100.0\t  100.0\n", "100.0\t  NaN\n");
        assert_ne!(text, SAMPLE);
        let err = parse_profiles(&text).unwrap_err();
        assert!(matches!(err, CompareError::ParseError { line: 25, .. }));

        let text = SAMPLE.replace("%SSD \t1000\n%PTS", "%SSD \tinf\n%PTS");
        assert!(parse_profiles(&text).is_err());
    }

    #[test]
    fn test_point_before_header_fails() {
        let err = parse_profiles("= \t0.0\t0.0\t100.0\t50.0\n").unwrap_err();
        assert!(matches!(err, CompareError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_end_marker_before_header_fails() {
        let err = parse_profiles(":MSR \t1\n:EOM  # End of Measurement\n").unwrap_err();
        assert!(matches!(err, CompareError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_header_tag_before_measurement_number_fails() {
        let err = parse_profiles("%BMT \tPHO\t6.0\n").unwrap_err();
        assert!(matches!(err, CompareError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_missing_header_tag_is_reported() {
        let text = SAMPLE.replacen("%BMT \tPHO\t    6.0\n", "", 1);
        let err = parse_profiles(&text).unwrap_err();
        assert!(err.to_string().contains("%BMT"));
    }

    #[test]
    fn test_short_point_line_fails() {
        let text = "# Measurement number \t1\n= \t0.0\t0.0\t100.0\n";
        let err = parse_profiles(text).unwrap_err();
        assert!(err.to_string().contains("dose"));
    }

    #[test]
    fn test_block_without_end_marker_fails() {
        let text = "# Measurement number \t1\n= \t0.0\t0.0\t100.0\t1.0\n# Measurement number \t2\n";
        let err = parse_profiles(text).unwrap_err();
        assert!(err.to_string().contains(":EOM"));

        let truncated = "# Measurement number \t1\n= \t0.0\t0.0\t100.0\t1.0\n";
        assert!(parse_profiles(truncated).is_err());
    }

    #[test]
    fn test_point_after_end_marker_fails() {
        let text = SAMPLE.replace(":EOF # End of File\n", "= \t0.0\t0.0\t200.0\t1.0\n");
        assert!(parse_profiles(&text).is_err());
    }

    #[test]
    fn test_non_integer_measurement_number_fails() {
        let err = parse_profiles("# Measurement number \t1.5\n").unwrap_err();
        assert!(matches!(err, CompareError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        let set = parse_profiles("").unwrap();
        assert!(set.is_empty());
        assert!(set.points().is_empty());
        assert_eq!(set.declared_measurements(), None);
    }
}
