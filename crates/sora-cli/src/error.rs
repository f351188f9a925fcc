//! Generation error types.

use thiserror::Error;

use sora_client::ClientError;
use sora_history::HistoryError;
use sora_media::MediaError;

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Exit code for a bad flag combination or parameter.
pub const EXIT_VALIDATION: i32 = 2;
/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Why a generation run did not finish.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Rejected before any network or media work.
    #[error("{0}")]
    Validation(String),

    #[error("failed to resolve remix reference: {0}")]
    Resolution(#[source] HistoryError),

    #[error("network error: {0}")]
    Transport(String),

    #[error("API {status}: {body}")]
    Api { status: u16, body: String },

    #[error("API rejected the request: {0}")]
    Rejected(String),

    /// The service reports the job itself failed.
    #[error("job error: {0}")]
    Job(String),

    #[error("input file error: {0}")]
    Media(#[from] MediaError),

    #[error("interrupted before completion")]
    Cancelled,

    #[error("job did not complete within {0} seconds")]
    DeadlineExceeded(u64),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerateError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn job(msg: impl Into<String>) -> Self {
        Self::Job(msg.into())
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::Validation(_) => EXIT_VALIDATION,
            _ => EXIT_FAILURE,
        }
    }

    /// Interrupt or deadline, as opposed to a failure reported by the service.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            GenerateError::Cancelled | GenerateError::DeadlineExceeded(_)
        )
    }
}

impl From<ClientError> for GenerateError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, body } => GenerateError::Api { status, body },
            ClientError::Rejected(message) => GenerateError::Rejected(message),
            ClientError::Transport(e) => GenerateError::Transport(e.to_string()),
            ClientError::MissingJobId => {
                GenerateError::Protocol("missing job id in response".to_string())
            }
            ClientError::Protocol(message) => GenerateError::Protocol(message),
            ClientError::Config(message) => GenerateError::Config(message),
        }
    }
}

impl From<HistoryError> for GenerateError {
    fn from(err: HistoryError) -> Self {
        GenerateError::Resolution(err)
    }
}
