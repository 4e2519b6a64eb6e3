use std::fmt;
use thiserror::Error;

/// The remote call a transport failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCall {
    Login,
    UploadBlob,
    CreateRecord,
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiCall::Login => "com.atproto.server.createSession",
            ApiCall::UploadBlob => "com.atproto.repo.uploadBlob",
            ApiCall::CreateRecord => "com.atproto.repo.createRecord",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum TransportErrorKind {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response is missing field `{field}`")]
    MalformedResponse { field: String },
}

#[derive(Error, Debug)]
#[error("{call} failed: {kind}")]
pub struct TransportError {
    pub call: ApiCall,
    #[source]
    pub kind: TransportErrorKind,
}

impl TransportError {
    pub fn network(call: ApiCall, err: reqwest::Error) -> Self {
        Self {
            call,
            kind: TransportErrorKind::Network(err),
        }
    }

    pub fn status(call: ApiCall, status: u16, body: impl Into<String>) -> Self {
        Self {
            call,
            kind: TransportErrorKind::Status {
                status,
                body: body.into(),
            },
        }
    }

    pub fn malformed(call: ApiCall, field: &str) -> Self {
        Self {
            call,
            kind: TransportErrorKind::MalformedResponse {
                field: field.to_string(),
            },
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.kind {
            TransportErrorKind::Status { status, .. } => Some(*status),
            TransportErrorKind::Network(e) => e.status().map(|s| s.as_u16()),
            TransportErrorKind::MalformedResponse { .. } => None,
        }
    }
}

/// Which external generator produced a [`BotError::GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Description,
    Image,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStage::Description => f.write_str("description"),
            GenerationStage::Image => f.write_str("image"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Image encoding failed: {0}")]
    EncodingFailure(#[from] image::ImageError),

    #[error("Image payload is {size} bytes, exceeding the {limit} byte upload limit")]
    SizeLimitExceeded { size: usize, limit: usize },

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    #[error("{stage} generation failed: {message}")]
    GenerationError {
        stage: GenerationStage,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Image,
    Network,
    Generation,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn generation(stage: GenerationStage, message: impl Into<String>) -> Self {
        BotError::GenerationError {
            stage,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::EncodingFailure(_) | BotError::SizeLimitExceeded { .. } => {
                ErrorCategory::Image
            }
            BotError::TransportFailure(_) => ErrorCategory::Network,
            BotError::GenerationError { .. } => ErrorCategory::Generation,
            BotError::ConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BotError::IoError(_) | BotError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Upstream outages usually clear up by the next scheduled run.
            BotError::TransportFailure(e) => match e.status_code() {
                Some(401) | Some(403) => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            BotError::GenerationError { .. } => ErrorSeverity::Medium,
            BotError::EncodingFailure(_) | BotError::SizeLimitExceeded { .. } => {
                ErrorSeverity::High
            }
            BotError::ConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::MissingConfigError { .. } => ErrorSeverity::High,
            BotError::IoError(_) | BotError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BotError::EncodingFailure(_) => {
                "Check that the image service returned a supported image format".to_string()
            }
            BotError::SizeLimitExceeded { limit, .. } => format!(
                "The image could not be reduced below {} bytes even at 512x512; try a simpler image",
                limit
            ),
            BotError::TransportFailure(e) => match e.status_code() {
                Some(401) | Some(400) if e.call == ApiCall::Login => {
                    "Verify BSKY_USERNAME and BSKY_PASSWORD (use an app password)".to_string()
                }
                Some(401) => "The session token was rejected; log in again".to_string(),
                Some(413) => "The upstream rejected the payload as too large".to_string(),
                _ => format!("Check network connectivity and the status of {}", e.call),
            },
            BotError::GenerationError { stage, .. } => match stage {
                GenerationStage::Description => {
                    "Verify OPENAI_API_KEY and the configured model".to_string()
                }
                GenerationStage::Image => {
                    "Verify HUGGINGFACE_KEY; the model may still be loading".to_string()
                }
            },
            BotError::ConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::MissingConfigError { .. } => {
                "Review the configuration file and environment variables".to_string()
            }
            BotError::IoError(_) => "Check that the output directories are writable".to_string(),
            BotError::SerializationError(_) => "Report this as a bug".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BotError::SizeLimitExceeded { size, limit } => format!(
                "Image is still too large after resizing ({} KiB > {} KiB)",
                size / 1024,
                limit / 1024
            ),
            BotError::TransportFailure(e) => format!("Bluesky request {} failed", e.call),
            BotError::MissingConfigError { field } => {
                format!("Missing configuration value: {}", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
