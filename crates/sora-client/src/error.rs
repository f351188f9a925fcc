//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Non-2xx response; `body` is the trimmed response text.
    #[error("API {status}: {body}")]
    Api { status: u16, body: String },

    /// The envelope parsed but carried an error object.
    #[error("{0}")]
    Rejected(String),

    #[error("missing job id in response")]
    MissingJobId,

    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Connection-level failure (nothing usable came back).
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Worth another attempt on the next poll tick.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::Api {
            status: 400,
            body: "{\"error\":\"bad prompt\"}".into(),
        };
        assert_eq!(err.to_string(), "API 400: {\"error\":\"bad prompt\"}");
        assert!(!err.is_transport());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = ClientError::Api {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_retryable());
        assert!(!ClientError::MissingJobId.is_retryable());
    }
}
