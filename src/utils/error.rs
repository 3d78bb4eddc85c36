use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{provider} credential is missing")]
    MissingCredential { provider: String },

    #[error("{provider} responded with status {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} did not respond within {timeout:?}")]
    TimeoutError { provider: String, timeout: Duration },

    #[error("Invalid audit target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Provider,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AuditError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuditError::ApiError(_) | AuditError::TimeoutError { .. } => ErrorCategory::Network,
            AuditError::ProviderError { .. } | AuditError::MissingCredential { .. } => {
                ErrorCategory::Provider
            }
            AuditError::ConfigError { .. }
            | AuditError::ConfigValidationError { .. }
            | AuditError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AuditError::SerializationError(_) | AuditError::InvalidTarget { .. } => {
                ErrorCategory::Data
            }
            AuditError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Provider | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AuditError::MissingCredential { .. } => {
                "Provide an API key with --api-key, the API_KEY environment variable, or research.api_key in the config file".to_string()
            }
            AuditError::ProviderError { status, .. } if *status == 429 => {
                "The provider is rate limiting requests; wait a moment and try again".to_string()
            }
            AuditError::ProviderError { .. } => {
                "Check the model name and API key, then try again".to_string()
            }
            AuditError::ApiError(_) | AuditError::TimeoutError { .. } => {
                "Check your network connection and try again".to_string()
            }
            AuditError::InvalidTarget { .. } => {
                "Pass a domain such as example.com or a full http(s) URL".to_string()
            }
            AuditError::ConfigError { .. }
            | AuditError::ConfigValidationError { .. }
            | AuditError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            AuditError::SerializationError(_) => {
                "The provider returned an unexpected response; try again".to_string()
            }
            AuditError::IoError(_) => "Check file paths and permissions".to_string(),
        }
    }

    /// Single generic notice shown to end users whenever an audit fails.
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            _ => "Failed to audit. Please check your API key or try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
