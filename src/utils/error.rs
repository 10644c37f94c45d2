use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid regex pattern: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Excel processing error: {0}")]
    ExcelError(#[from] calamine::Error),

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

    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Storage operation '{operation}' failed for s3://{bucket}/{key}: {message}")]
    StorageError {
        operation: String,
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Credentials error: {message}")]
    CredentialsError { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Index {index} is out of range for {len} matching files")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("The file {path} is empty")]
    EmptyFile { path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Storage,
    Credentials,
    Input,
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

impl ControllerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ControllerError::ConfigError { .. }
            | ControllerError::ConfigValidationError { .. }
            | ControllerError::InvalidConfigValueError { .. }
            | ControllerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ControllerError::ObjectNotFound { .. } | ControllerError::StorageError { .. } => {
                ErrorCategory::Storage
            }
            ControllerError::CredentialsError { .. } => ErrorCategory::Credentials,
            ControllerError::RegexError(_)
            | ControllerError::InvalidArgument { .. }
            | ControllerError::IndexOutOfRange { .. } => ErrorCategory::Input,
            ControllerError::CsvError(_)
            | ControllerError::ExcelError(_)
            | ControllerError::SerializationError(_)
            | ControllerError::EmptyFile { .. }
            | ControllerError::ProcessingError { .. } => ErrorCategory::Data,
            ControllerError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Credentials => ErrorSeverity::Critical,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ControllerError::RegexError(_) => {
                "Check the regex syntax; patterns are matched anywhere in the key".to_string()
            }
            ControllerError::ObjectNotFound { bucket, .. } => format!(
                "List the bucket with `s3-controller scan --bucket {}` to confirm the key",
                bucket
            ),
            ControllerError::StorageError { .. } => {
                "Check network access, the endpoint URL and the bucket policy, then retry"
                    .to_string()
            }
            ControllerError::CredentialsError { .. } => {
                "Configure AWS credentials (environment, profile or instance role)".to_string()
            }
            ControllerError::IndexOutOfRange { len, .. } => {
                format!("Use an index between -{} and {}", len, len.saturating_sub(1))
            }
            ControllerError::EmptyFile { .. } => {
                "Make sure the file contains a header row and at least one data row".to_string()
            }
            ControllerError::MissingConfigError { field } => {
                format!("Set '{}' in the config file or on the command line", field)
            }
            ControllerError::ConfigError { .. }
            | ControllerError::ConfigValidationError { .. }
            | ControllerError::InvalidConfigValueError { .. } => {
                "Review the configuration file and environment overrides".to_string()
            }
            ControllerError::InvalidArgument { .. } => {
                "Run with --help to see the accepted arguments".to_string()
            }
            ControllerError::CsvError(_)
            | ControllerError::ExcelError(_)
            | ControllerError::SerializationError(_)
            | ControllerError::ProcessingError { .. } => {
                "Inspect the source file format".to_string()
            }
            ControllerError::IoError(_) => {
                "Check that the local path exists and is writable".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Storage => format!("Storage request failed: {}", self),
            ErrorCategory::Credentials => format!("AWS credentials unavailable: {}", self),
            ErrorCategory::Input => format!("Invalid input: {}", self),
            ErrorCategory::Data => format!("Could not process data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
