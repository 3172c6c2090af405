use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("No active session")]
    NoSession,

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Rejected by server: {0}")]
    Rejected(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// How the repository should treat a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No usable session; behave as a guest.
    NoSession,
    /// Network, timeout, throttling or server-side fault. Worth retrying.
    Unreachable,
    /// The server understood and refused the request. Retrying won't help.
    Rejected,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl RemoteError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => RemoteError::Unauthorized,
            403 => RemoteError::AccessDenied(truncated),
            429 => RemoteError::RateLimited,
            400..=499 => RemoteError::Rejected(format!("Status {}: {}", status, truncated)),
            500..=599 => RemoteError::ServerError(truncated),
            _ => RemoteError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteError::NoSession | RemoteError::Unauthorized => FailureKind::NoSession,
            RemoteError::RateLimited | RemoteError::ServerError(_) | RemoteError::NetworkError(_) => {
                FailureKind::Unreachable
            }
            RemoteError::AccessDenied(_) | RemoteError::Rejected(_) | RemoteError::InvalidResponse(_) => {
                FailureKind::Rejected
            }
        }
    }

    /// Whether a write that failed this way should be kept for a later replay
    pub fn is_retryable(&self) -> bool {
        self.kind() != FailureKind::Rejected
    }
}
