//! Error types shared by every calculator and renderer.

use thiserror::Error;

/// Failure raised by an analysis or rendering operation.
///
/// `Validation` covers malformed, missing or out-of-range input and empty
/// datasets. `Arithmetic` covers degenerate denominators such as a
/// zero-length observation window.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{operation}: validation failed: {reason}")]
    Validation {
        operation: &'static str,
        reason: String,
    },
    #[error("{operation}: arithmetic failure: {reason}")]
    Arithmetic {
        operation: &'static str,
        reason: String,
    },
    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to render {artifact}: {reason}")]
    Render {
        artifact: &'static str,
        reason: String,
    },
}

impl AnalysisError {
    pub fn validation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            reason: reason.into(),
        }
    }

    pub fn arithmetic(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Arithmetic {
            operation,
            reason: reason.into(),
        }
    }

    pub fn render(artifact: &'static str, reason: impl Into<String>) -> Self {
        Self::Render {
            artifact,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Arithmetic { .. } => "arithmetic",
            Self::Csv(_) => "csv",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Render { .. } => "render",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Why a single field could not be turned into a typed value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("column '{column}' is missing or empty")]
    Missing { column: &'static str },
    #[error("column '{column}' has unparseable value '{value}'")]
    Malformed { column: &'static str, value: String },
    #[error("column '{column}' value {value} is outside {range}")]
    OutOfRange {
        column: &'static str,
        value: f64,
        range: &'static str,
    },
}

impl FieldError {
    /// Attaches the operation and 1-based data row to a field failure.
    pub fn at_row(self, operation: &'static str, row: usize) -> AnalysisError {
        AnalysisError::validation(operation, format!("row {row}: {self}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_at_row_includes_context() {
        let err = FieldError::Missing {
            column: "Arrival_Time",
        }
        .at_row("read_vessel_movements", 3);

        assert_eq!(err.kind(), "validation");
        let msg = err.to_string();
        assert!(msg.contains("read_vessel_movements"));
        assert!(msg.contains("row 3"));
        assert!(msg.contains("Arrival_Time"));
    }

    #[test]
    fn test_arithmetic_display() {
        let err = AnalysisError::arithmetic("compute_berth_occupancy", "window is zero");
        assert_eq!(
            err.to_string(),
            "compute_berth_occupancy: arithmetic failure: window is zero"
        );
    }
}
