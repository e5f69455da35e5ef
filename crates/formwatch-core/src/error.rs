use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing configuration: {0} must be set")]
    ConfigurationMissing(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("source unavailable at {locator}: {reason}")]
    SourceUnavailable { locator: String, reason: String },

    #[error("source returned {status}: {body}")]
    SourceStatus { status: u16, body: String },

    #[error("delivery to {target} failed: {reason}")]
    DeliveryFailed { target: String, reason: String },

    #[error("delivery to {target} rejected with status {status}")]
    DeliveryStatus { target: String, status: u16 },

    #[error("tracked state at {path} is corrupt: {reason}")]
    StateCorrupt { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl RelayError {
    /// True for the startup-time class of errors; everything else is
    /// degraded to a neutral value by the component that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RelayError::ConfigurationMissing(_) | RelayError::InvalidConfiguration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
