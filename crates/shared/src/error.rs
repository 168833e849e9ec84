use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown process parameter '{0}'")]
    UnknownParameter(String),
    #[error(
        "tracker data sequences differ in length: categories={categories} before={before} after={after}"
    )]
    RaggedTracker {
        categories: usize,
        before: usize,
        after: usize,
    },
}

/// Error body returned by the optimizer service on non-success responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
