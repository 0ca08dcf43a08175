//! Error types for highlight orchestration and review sessions

use crate::service::ServiceError;
use margin_diff::DecisionError;
use margin_text::DocumentError;
use std::sync::Arc;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// Remote service call failed; nothing was cached
    #[error("service call failed: {0}")]
    Service(Arc<ServiceError>),

    /// Document snapshot rejected
    #[error("invalid document: {0}")]
    Document(#[from] DocumentError),

    /// Invalid segment decision
    #[error("invalid decision: {0}")]
    Decision(#[from] DecisionError),

    /// Decision made with no rewrite under review
    #[error("no rewrite under review")]
    NoActiveReview,
}

impl HighlightError {
    /// Check if reissuing the request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<Arc<ServiceError>> for HighlightError {
    fn from(err: Arc<ServiceError>) -> Self {
        Self::Service(err)
    }
}

impl From<ServiceError> for HighlightError {
    fn from(err: ServiceError) -> Self {
        Self::Service(Arc::new(err))
    }
}
