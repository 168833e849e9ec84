use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to /{endpoint} failed: {reason}")]
    Transport {
        endpoint: &'static str,
        reason: String,
    },
    #[error("/{endpoint} responded with HTTP {status}{}", detail_suffix(.detail))]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: Option<String>,
    },
    #[error("/{endpoint} returned a malformed body: {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        reason: String,
    },
}

impl ServiceError {
    /// True for failures where the service could not be reached or refused the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ServiceError::Transport { .. } | ServiceError::Status { .. }
        )
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write report to '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("report file name '{0}' is not a plain file name")]
    InvalidFileName(String),
}
