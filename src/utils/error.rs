use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("Chat request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Negative value for {field}: {value}")]
    NegativeInput { field: String, value: f64 },

    #[error("Invalid rates (co-pay {co_pay_rate}, co-insurance {co_insurance_rate}): {reason}")]
    InvalidRate {
        co_pay_rate: f64,
        co_insurance_rate: f64,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {field}")]
    MissingConfigError { field: String },

    #[error("Data error: {message}")]
    DataError { message: String },

    #[error("Chat assistant error: {message}")]
    ChatError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Data,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EstimateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EstimateError::NegativeInput { .. } | EstimateError::InvalidRate { .. } => {
                ErrorCategory::Input
            }
            EstimateError::ConfigValidationError { .. }
            | EstimateError::InvalidConfigValueError { .. }
            | EstimateError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EstimateError::CsvError(_)
            | EstimateError::SerializationError(_)
            | EstimateError::DataError { .. } => ErrorCategory::Data,
            EstimateError::ApiError(_) | EstimateError::ChatError { .. } => {
                ErrorCategory::Network
            }
            EstimateError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EstimateError::NegativeInput { .. } => {
                "Check the fee and plan tables for negative amounts"
            }
            EstimateError::InvalidRate { .. } => {
                "Co-pay and co-insurance percentages must each be 0-100 and sum to at most 100"
            }
            EstimateError::ConfigValidationError { .. }
            | EstimateError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags"
            }
            EstimateError::MissingConfigError { .. } => {
                "Provide the missing setting in the config file, a flag or the environment"
            }
            EstimateError::CsvError(_) | EstimateError::DataError { .. } => {
                "Verify the CSV headers and that every numeric column holds a number"
            }
            EstimateError::SerializationError(_) => "Report this output as a bug",
            EstimateError::ApiError(_) | EstimateError::ChatError { .. } => {
                "Check network access, the assistant endpoint and the API key, then retry"
            }
            EstimateError::IoError(_) => "Check that the file exists and is readable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EstimateError::NegativeInput { field, .. } => {
                format!("The value for {} cannot be negative", field)
            }
            EstimateError::InvalidRate { reason, .. } => {
                format!("The insurance plan rates are invalid: {}", reason)
            }
            EstimateError::MissingConfigError { field } => {
                format!("Missing setting: {}", field)
            }
            EstimateError::InvalidConfigValueError { field, value, .. } => {
                format!("'{}' is not a valid {}", value, field)
            }
            EstimateError::IoError(e) => format!("Could not access a file: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;
