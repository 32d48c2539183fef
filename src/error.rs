use crate::protocol::ErrorCode;
use thiserror::Error;

/// Result type for transport-level operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Result of a single vibrator HAL call
pub type HalResult<T> = std::result::Result<T, HalError>;

/// Outcome of a failed vibrator HAL call
///
/// The kind decides what the controller does next: `Unsupported` is handed
/// back to the caller untouched, while `Failed` and `Unavailable` drop the
/// current connection and cause one reconnect-and-retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    /// The operation is not implemented by this HAL
    #[error("operation not supported by the vibrator HAL")]
    Unsupported,

    /// The HAL was reachable but the call failed
    #[error("vibrator HAL call failed: {0}")]
    Failed(String),

    /// The connection to the HAL is dead
    #[error("vibrator HAL unavailable: {0}")]
    Unavailable(String),
}

impl HalError {
    /// Whether the HAL reported the operation as not implemented
    pub fn is_unsupported(&self) -> bool {
        matches!(self, HalError::Unsupported)
    }

    /// Whether this failure means the connection must be replaced
    pub fn should_reconnect(&self) -> bool {
        !self.is_unsupported()
    }
}

/// Errors raised by the WebSocket transport to a remote HAL
#[derive(Error, Debug)]
pub enum TransportError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection was closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connecting to the HAL service took too long
    #[error("Connect timeout")]
    ConnectTimeout,

    /// Request timed out waiting for response
    #[error("Request timeout")]
    Timeout,

    /// HAL service returned an error response
    #[error("API error ({code:?}): {detail}")]
    ApiError {
        /// Machine-readable error class
        code: ErrorCode,
        /// Error detail message from the service
        detail: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unexpected response from the service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Connector configuration is not usable
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<TransportError> for HalError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ApiError {
                code: ErrorCode::Unsupported,
                ..
            } => HalError::Unsupported,
            TransportError::WebSocket(_)
            | TransportError::ConnectionClosed
            | TransportError::ConnectTimeout
            | TransportError::Io(_)
            | TransportError::InvalidConfig(_) => HalError::Unavailable(err.to_string()),
            TransportError::Timeout
            | TransportError::ApiError { .. }
            | TransportError::Json(_)
            | TransportError::InvalidResponse(_) => HalError::Failed(err.to_string()),
        }
    }
}
