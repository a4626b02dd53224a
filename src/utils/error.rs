use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::model::IssueKind;

#[derive(Error, Debug)]
pub enum RateSheetError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid merged range '{value}': expected A1 notation such as C5:C8")]
    InvalidMergedRange { value: String },

    #[error("Unparseable date range: {text}")]
    UnparseableDateRange { text: String },

    #[error("Date range ends before it starts: {start} > {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid price text: {text}")]
    InvalidPriceText { text: String },

    #[error("Structural ambiguity: {message}")]
    StructuralAmbiguity { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Extraction,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RateSheetError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CsvError(_) | Self::InvalidMergedRange { .. } => ErrorCategory::Input,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::UnparseableDateRange { .. }
            | Self::InvertedDateRange { .. }
            | Self::InvalidPriceText { .. }
            | Self::StructuralAmbiguity { .. } => ErrorCategory::Extraction,
            Self::ZipError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Output
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 列級錯誤只影響單一列，抽取仍會完成
            ErrorCategory::Extraction => ErrorSeverity::Low,
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => match self {
                Self::IoError(_) => ErrorSeverity::Critical,
                _ => ErrorSeverity::Medium,
            },
        }
    }

    /// 對應到抽取結果中的列問題種類；非列級錯誤回傳 None
    pub fn issue_kind(&self) -> Option<IssueKind> {
        match self {
            Self::UnparseableDateRange { .. } => Some(IssueKind::UnparseableDateRange),
            Self::InvertedDateRange { .. } => Some(IssueKind::InvertedDateRange),
            Self::InvalidPriceText { .. } => Some(IssueKind::InvalidPriceText),
            Self::StructuralAmbiguity { .. } => Some(IssueKind::StructuralAmbiguity),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::CsvError(_) => "Export the sheet again as CSV/TSV and check the delimiter",
            Self::InvalidMergedRange { .. } => "Write merged ranges as A1:B2, e.g. --merge C5:C8",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration value and retry",
            Self::MissingConfigError { .. } => "Add the missing field to the config or pass it as a flag",
            Self::IoError(_) => "Check that the input exists and the output directory is writable",
            Self::ZipError(_) | Self::SerializationError(_) => "Retry without --zip or with a different output format",
            Self::UnparseableDateRange { .. } | Self::InvertedDateRange { .. } => {
                "Rewrite the period cell as (1May25 - 30Sep25)"
            }
            Self::InvalidPriceText { .. } => "Add the text to legend_prices if it stands for a price",
            Self::StructuralAmbiguity { .. } => "Make sure a hotel row ending in (A) comes first",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not read the rate sheet: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Extraction => format!("Row skipped: {}", self),
            ErrorCategory::Output => format!("Could not write the output: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RateSheetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_level_errors_map_to_issue_kinds() {
        let err = RateSheetError::InvalidPriceText {
            text: "on request".to_string(),
        };
        assert_eq!(err.issue_kind(), Some(IssueKind::InvalidPriceText));
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Extraction);
    }

    #[test]
    fn test_outer_errors_have_no_issue_kind() {
        let err = RateSheetError::MissingConfigError {
            field: "sheet.input_path".to_string(),
        };
        assert!(err.issue_kind().is_none());
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }
}
