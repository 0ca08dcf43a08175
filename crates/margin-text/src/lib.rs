//! Margin Text
//!
//! Comparison-text primitives for locating review excerpts inside a loaded
//! document.
//!
//! # Core Concepts
//!
//! - [`DocumentIndex`]: Immutable, versioned snapshot of a document's pages
//! - [`normalize`] / [`tokenize`]: Canonical comparison text and match tokens
//! - [`PageLocator`]: Scores an excerpt against every page and picks the best
//!
//! # Example
//!
//! ```rust
//! use margin_text::{DocumentIndex, DocumentVersion, PageRecord, PageLocator};
//!
//! let index = DocumentIndex::new(
//!     DocumentVersion::new(1),
//!     vec![
//!         PageRecord::new(1, "alphabet bananas"),
//!         PageRecord::new(2, "alphabet crocodile diagram"),
//!     ],
//! )
//! .unwrap();
//!
//! let page = PageLocator::new().locate("bananas crocodile diagram", &index);
//! assert_eq!(page, Some(2));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod document;
mod locator;
mod normalize;

pub use document::{DocumentError, DocumentIndex, DocumentSnapshot, DocumentVersion, PageRecord};
pub use locator::{locate, AnchorMode, PageLocator, PageScore};
pub use normalize::{normalize, sanitize_anchor, tokenize, MIN_TOKEN_CHARS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
