use crate::utils::error::{CompareError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number greater than 0".to_string(),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        if let Some(extension) = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            if !allowed_set.contains(extension) {
                return Err(CompareError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        } else {
            return Err(CompareError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.clone(),
                reason: "File has no extension or invalid filename".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| CompareError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN falls outside every range
    if !(value >= min && value <= max) {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("input.reference", "ref.asc").is_ok());
        assert!(validate_path("input.reference", "").is_err());
        assert!(validate_path("input.reference", "   ").is_err());
        assert!(validate_path("input.reference", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("comparison.distance_mm_threshold", 2.0).is_ok());
        assert!(validate_positive("comparison.distance_mm_threshold", 0.0).is_err());
        assert!(validate_positive("comparison.distance_mm_threshold", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["report.zip".to_string()];
        assert!(validate_file_extensions("output.report_name", &files, &["zip"]).is_ok());

        let invalid = vec!["report.pdf".to_string()];
        assert!(validate_file_extensions("output.report_name", &invalid, &["zip"]).is_err());

        let no_ext = vec!["report".to_string()];
        assert!(validate_file_extensions("output.report_name", &no_ext, &["zip"]).is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        assert!(validate_range("report.pass_threshold", 0.95, 0.0, 1.0).is_ok());
        assert!(validate_range("report.pass_threshold", 1.5, 0.0, 1.0).is_err());
        assert!(validate_range("report.pass_threshold", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("ref.asc".to_string());
        let missing: Option<String> = None;
        assert_eq!(
            validate_required_field("input.reference", &present).unwrap(),
            "ref.asc"
        );
        assert!(matches!(
            validate_required_field("input.reference", &missing),
            Err(CompareError::MissingConfigError { .. })
        ));
    }
}
