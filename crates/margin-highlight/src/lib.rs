//! Margin Highlight
//!
//! Drives excerpt highlighting for a document under review: fingerprint the
//! excerpt, resolve the rendered artifact through the coalescing cache,
//! find its page, and publish it only if no newer request superseded it.
//!
//! # Core Concepts
//!
//! - [`HighlightOrchestrator`]: Generation-token request handling over the
//!   artifact cache and page locator
//! - [`ReviewSession`]: Orchestrator plus per-segment rewrite review
//! - [`HighlightService`] / [`RewriteService`]: Remote collaborators
//! - [`RenderSurface`]: Display capability driven by the orchestrator
//!
//! # Example
//!
//! ```rust,ignore
//! use margin_highlight::{HighlightOrchestrator, HighlightOutcome, MarginConfig};
//!
//! let orchestrator = HighlightOrchestrator::with_config(service, surface, &MarginConfig::default());
//! orchestrator.load_document(index);
//!
//! let mut updates = orchestrator.subscribe();
//! if let HighlightOutcome::Applied(view) = orchestrator.request_highlight(excerpt).await? {
//!     println!("artifact {} on page {:?}", view.artifact.id(), view.page_number);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod error;
mod orchestrator;
mod service;
mod session;
mod surface;

pub use config::{ConfigError, MarginConfig};
pub use error::HighlightError;
pub use orchestrator::{
    HighlightOrchestrator, HighlightOutcome, HighlightSnapshot, HighlightState, HighlightView,
};
pub use service::{HighlightService, RewriteService, ServiceError, SessionId};
pub use session::{ActiveReview, ReviewSession, RewriteOutcome};
pub use surface::{BoundingBox, NullSurface, RenderSurface};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
