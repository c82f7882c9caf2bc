//! Unified error handling for the GridLAB-D publication generator
//!
//! Every failure a configuration request can hit is a [`PubsError`] variant,
//! so callers branch on the kind instead of the message text.

use thiserror::Error;

// ============================================================================
// PubsError - Main error type
// ============================================================================

/// Main error type for dictionary acquisition and publication generation
#[derive(Debug, Error)]
pub enum PubsError {
    // ======================================
    // Request Errors
    // ======================================
    #[error("Missing parameter {0}")]
    MissingParameter(String),

    // ======================================
    // Acquisition Errors
    // ======================================
    #[error("Dictionary acquisition failed: {origin}: {reason}")]
    DictionaryAcquisition { origin: String, reason: String },

    // ======================================
    // Record Validation Errors
    // ======================================
    #[error("Malformed measurement record: {0}")]
    MalformedRecord(String),

    #[error(
        "Invalid measurement type for {equipment}: {measurement_type} (valid types are {valid})"
    )]
    InvalidMeasurementType {
        equipment: String,
        measurement_type: String,
        valid: String,
    },

    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ======================================
    // Output Errors
    // ======================================
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using PubsError
pub type PubsResult<T> = Result<T, PubsError>;

impl PubsError {
    /// Create a missing parameter error
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    /// Create an acquisition error for the given dictionary origin
    pub fn acquisition(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::DictionaryAcquisition {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a malformed record error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    /// Get error code (for logs and exit reporting)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::DictionaryAcquisition { .. } => "DICTIONARY_ACQUISITION",
            Self::MalformedRecord(_) => "MALFORMED_RECORD",
            Self::InvalidMeasurementType { .. } => "INVALID_MEASUREMENT_TYPE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingParameter(_) => ErrorCategory::Request,
            Self::DictionaryAcquisition { .. } => ErrorCategory::Acquisition,
            Self::MalformedRecord(_) | Self::InvalidMeasurementType { .. } => {
                ErrorCategory::Validation
            },
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the failure came from the dictionary content rather than its source
    pub fn is_record_error(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// Get log level
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;
        match self.category() {
            ErrorCategory::Request | ErrorCategory::Validation => Level::WARN,
            ErrorCategory::Acquisition
            | ErrorCategory::Configuration
            | ErrorCategory::Internal => Level::ERROR,
        }
    }
}

/// Error category enum - used for classification in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request parameters
    Request,
    /// Reading or generating the dictionary
    Acquisition,
    /// Dictionary content
    Validation,
    Configuration,
    Internal,
}

// Helper macros for creating errors
#[macro_export]
macro_rules! malformed_error {
    ($msg:expr) => {
        $crate::PubsError::MalformedRecord($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::PubsError::MalformedRecord(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::PubsError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::PubsError::Configuration(format!($fmt, $($arg)*))
    };
}
