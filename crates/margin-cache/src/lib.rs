//! Margin Cache
//!
//! Content-addressed storage for rendered highlight artifacts.
//!
//! # Core Concepts
//!
//! - [`Fingerprint`]: 32-byte Blake3 digest of the raw excerpt; the cache key
//! - [`ArtifactCache`]: Coalescing cache; one producer call per fingerprint
//! - [`CacheEntry`]: Immutable artifact plus a set-once page number
//!
//! # Example
//!
//! ```rust,ignore
//! use margin_cache::{ArtifactCache, Fingerprint, RenderedArtifact};
//!
//! let cache = ArtifactCache::default();
//! let fp = Fingerprint::of_text(excerpt);
//! let entry = cache
//!     .resolve(fp, || async { service.render(excerpt).await })
//!     .await?;
//! println!("artifact {} on page {:?}", entry.artifact().id(), entry.page_number());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod artifact;
mod cache;
mod fingerprint;

pub use artifact::{ArtifactHandle, CacheEntry, RenderedArtifact};
pub use cache::{ArtifactCache, CacheStats};
pub use fingerprint::{Fingerprint, FingerprintError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
