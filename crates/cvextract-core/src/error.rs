use std::path::PathBuf;
use std::time::Duration;

pub const POPPLER_HINT: &str = "Install poppler: brew install poppler (macOS), apt install poppler-utils (Linux), \
or on Windows download a release from https://github.com/oschwartz10612/poppler-windows/releases/ and add its bin/ directory to PATH";

#[derive(Debug, thiserror::Error)]
pub enum CvError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{tool} not found. {hint}")]
    DependencyMissing { tool: &'static str, hint: &'static str },

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    ExtractionFailed { code: i32, stderr: String },

    #[error("PDF to image conversion unavailable: pdftoppm not found. {}", POPPLER_HINT)]
    ConversionUnavailable,

    #[error("PDF to image conversion failed with exit code {code}: {stderr}")]
    ConversionFailed { code: i32, stderr: String },

    #[error("service error: {0}")]
    Service(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("response is not the expected JSON: {0}")]
    Schema(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CvError {
    /// Missing external tools are user-actionable and get remediation text.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(
            self,
            CvError::DependencyMissing { .. } | CvError::ConversionUnavailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_messages_carry_install_hint() {
        let err = CvError::DependencyMissing {
            tool: "pdftotext",
            hint: POPPLER_HINT,
        };
        assert!(err.is_missing_dependency());
        assert!(err.to_string().contains("brew install poppler"));
        assert!(CvError::ConversionUnavailable
            .to_string()
            .contains("apt install poppler-utils"));
    }

    #[test]
    fn test_timeout_display() {
        let err = CvError::Timeout(Duration::from_secs(600));
        assert_eq!(err.to_string(), "request timed out after 600s");
        assert!(!err.is_missing_dependency());
    }
}
