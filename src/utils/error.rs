use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Normalization error: {message}")]
    NormalizationError { message: String },

    #[error("Cannot determine scan direction: neither x nor y is constant (x: {first_x} -> {mid_x}, y: {first_y} -> {mid_y})")]
    AmbiguousDirectionError {
        first_x: f64,
        mid_x: f64,
        first_y: f64,
        mid_y: f64,
    },

    #[error("Comparison engine error: {message}")]
    EngineError { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Analysis,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl CompareError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    pub fn normalization(message: impl Into<String>) -> Self {
        Self::NormalizationError {
            message: message.into(),
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::EngineError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ParseError { .. } | Self::CsvError(_) => ErrorCategory::Input,
            Self::NormalizationError { .. }
            | Self::AmbiguousDirectionError { .. }
            | Self::EngineError { .. } => ErrorCategory::Analysis,
            Self::ConfigValidationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ZipError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    /// Pair-scoped errors are recoverable and only cost one pair.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Analysis => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn is_pair_scoped(&self) -> bool {
        self.category() == ErrorCategory::Analysis
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => {
                "Check that the file is an unmodified scanner ASCII export and that every block ends with :EOM"
            }
            Self::NormalizationError { .. } => {
                "Make sure the profile has at least 3 points and passes through the central axis"
            }
            Self::AmbiguousDirectionError { .. } => {
                "Only inline or crossline profiles can be compared; diagonal scans are not supported"
            }
            Self::EngineError { .. } => {
                "Check the comparison thresholds and that both profiles overlap spatially"
            }
            Self::ConfigValidationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the command-line arguments or the TOML configuration file"
            }
            Self::CsvError(_) | Self::ZipError(_) | Self::SerializationError(_) => {
                "Report generation failed; check free disk space and retry"
            }
            Self::IoError(_) => "Check that the input files exist and the output directory is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ParseError { line, message } => {
                format!("Could not read the profile file (line {}): {}", line, message)
            }
            Self::MissingConfigError { field } => {
                format!("Missing setting '{}'", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_scoped_errors_are_medium_severity() {
        let errors = [
            CompareError::normalization("no central-axis points"),
            CompareError::engine("all NaN"),
            CompareError::AmbiguousDirectionError {
                first_x: -10.0,
                mid_x: 0.0,
                first_y: -10.0,
                mid_y: 0.0,
            },
        ];
        for e in &errors {
            assert!(e.is_pair_scoped());
            assert_eq!(e.severity(), ErrorSeverity::Medium);
        }
    }

    #[test]
    fn test_parse_error_is_fatal_input_error() {
        let e = CompareError::parse(12, "expected a number, found 'abc'");
        assert_eq!(e.category(), ErrorCategory::Input);
        assert_eq!(e.severity(), ErrorSeverity::High);
        assert!(!e.is_pair_scoped());
        assert!(e.to_string().contains("line 12"));
        assert!(e.user_friendly_message().contains("line 12"));
    }
}
