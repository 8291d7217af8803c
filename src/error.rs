use thiserror::Error;

#[derive(Error, Debug)]
pub enum KrakenWatchError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Kraken API error: {0}")]
    ApiError(String),

    #[error("Unexpected HTTP status {status} from {endpoint}")]
    StatusError {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode {what}: {reason}")]
    DecodeError { what: String, reason: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration for {key}: {reason}")]
    ConfigError { key: String, reason: String },

    #[error("Indicator error: {0}")]
    IndicatorError(String),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("SMTP error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),
}

impl KrakenWatchError {
    pub fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        KrakenWatchError::DecodeError {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether another attempt at the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            KrakenWatchError::HttpError(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            KrakenWatchError::StatusError { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            // Kraken reports throttling and maintenance through the error array.
            KrakenWatchError::ApiError(msg) => {
                msg.contains("EAPI:Rate limit") || msg.contains("EService:")
            }
            KrakenWatchError::SmtpError(e) => e.is_transient() || e.is_timeout(),
            KrakenWatchError::IoError(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, KrakenWatchError>;
