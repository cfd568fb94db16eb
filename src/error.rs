use thiserror::Error;

/// Errors surfaced by the request pipeline.
///
/// The pipeline recovers from some response classes on its own (401 forces a
/// logout, 503 redirects to the maintenance view) but still hands the caller
/// an error so whatever work triggered the request stops cleanly. 403 carries
/// no recovery at all: the session is intact, the caller renders its own
/// message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credential (HTTP 401). The session has
    /// already been cleared by the time the caller sees this.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but not permitted (HTTP 403). No session action taken.
    #[error("forbidden")]
    Forbidden,

    /// Any other non-success status, body included for UI display.
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport error")]
    Transport(#[source] anyhow::Error),

    /// The response arrived but its body did not parse.
    #[error("invalid response body")]
    InvalidBody(#[source] serde_json::Error),
}

impl ApiError {
    /// Status code associated with this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_) | ApiError::InvalidBody(_) => None,
        }
    }
}
