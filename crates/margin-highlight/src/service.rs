//! External collaborators: highlight rendering and rewrite suggestion
//!
//! Both services are slow, remote and idempotent for a given document
//! version and excerpt. The engine never retries on its own; a failed call
//! is surfaced and the caller decides whether to reissue.

use margin_cache::RenderedArtifact;
use margin_diff::DiffSegment;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Identifier of one review session, forwarded to every service call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Fresh random session id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing id
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Renders a highlighted artifact for an excerpt
#[async_trait::async_trait]
pub trait HighlightService: Send + Sync {
    /// Produce the highlighted artifact for `raw_excerpt`
    ///
    /// The returned artifact may carry a page hint; without one the engine
    /// locates the page itself.
    async fn generate_highlight(
        &self,
        raw_excerpt: &str,
        session: &SessionId,
    ) -> Result<RenderedArtifact, ServiceError>;
}

/// Suggests a rewrite for an excerpt as ordered diff segments
#[async_trait::async_trait]
pub trait RewriteService: Send + Sync {
    /// Ordered segments whose original spans concatenate to `excerpt`
    async fn suggest_rewrite(
        &self,
        excerpt: &str,
        session: &SessionId,
    ) -> Result<Vec<DiffSegment>, ServiceError>;
}

/// Failure reported by a remote service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Service could not be reached or is overloaded
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Call took too long
    #[error("service timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Service refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Response could not be interpreted
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Check if reissuing the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}
