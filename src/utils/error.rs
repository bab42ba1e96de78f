use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlanceError {
    #[error("API request failed: {0}")]
    ApiError(reqwest::Error),

    #[error("{provider} returned HTTP {status}: {body}")]
    VendorError {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Malformed {provider} response: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, GlanceError>;

// Google 的金鑰放在 query string，錯誤訊息不能帶 URL
impl From<reqwest::Error> for GlanceError {
    fn from(err: reqwest::Error) -> Self {
        Self::ApiError(err.without_url())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Vendor,
    Input,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GlanceError {
    pub fn vendor(provider: &str, status: u16, body: impl Into<String>) -> Self {
        Self::VendorError {
            provider: provider.to_string(),
            status,
            body: body.into(),
        }
    }

    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::VendorError { .. } | Self::MalformedResponse { .. } => ErrorCategory::Vendor,
            Self::InvalidImage { .. } | Self::ValidationError { .. } => ErrorCategory::Input,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidImage { .. } | Self::ValidationError { .. } => ErrorSeverity::Low,
            Self::ApiError(_) | Self::MalformedResponse { .. } => ErrorSeverity::Medium,
            // 429 可稍後重試，其餘供應商錯誤需人工處理
            Self::VendorError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            Self::VendorError { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    /// True when the provider rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::VendorError { status, .. } if *status == 401 || *status == 403)
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::VendorError { status, .. } if *status == 429)
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ApiError(_) => {
                "Check network connectivity and that the provider endpoint is reachable".to_string()
            }
            Self::VendorError { provider, .. } if self.is_auth_failure() => {
                format!("Verify the {} API key and its permissions", provider)
            }
            Self::VendorError { provider, .. } if self.is_rate_limited() => {
                format!("{} rate limit reached, wait before sending more requests", provider)
            }
            Self::VendorError { provider, .. } => {
                format!("Inspect the {} response body in the logs", provider)
            }
            Self::MalformedResponse { .. } => {
                "The provider answered in an unexpected shape; try again with a clearer image"
                    .to_string()
            }
            Self::InvalidImage { .. } => {
                "Send a base64 JPEG or PNG data URL (data:image/jpeg;base64,...)".to_string()
            }
            Self::IoError(_) => "Check that the file exists and is readable".to_string(),
            Self::SerializationError(_) => "Report this as a bug".to_string(),
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Review the configuration file and environment variables".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Set '{}' in the config file or its environment variable", field)
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            Self::ValidationError { .. } => "Check the request parameters".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(_) => "Could not reach the recognition service".to_string(),
            Self::VendorError { provider, .. } if self.is_auth_failure() => {
                format!("{} rejected the credentials", provider)
            }
            Self::VendorError { provider, .. } if self.is_rate_limited() => {
                format!("{} is rate limiting requests", provider)
            }
            Self::VendorError { provider, status, .. } => {
                format!("{} request failed (HTTP {})", provider, status)
            }
            Self::MalformedResponse { provider, .. } => {
                format!("{} returned a response that could not be read", provider)
            }
            Self::InvalidImage { reason } => reason.clone(),
            Self::ValidationError { message } => message.clone(),
            Self::MissingConfigError { field } => format!("Missing configuration '{}'", field),
            Self::ConfigError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
