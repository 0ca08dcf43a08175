//! Versioned document page index
//!
//! A [`DocumentIndex`] is the read-only view of the currently loaded
//! document version. It is never patched: a new upload or an applied edit
//! produces a whole new index with a newer [`DocumentVersion`].

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Monotonic identifier of a loaded document version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DocumentVersion(u64);

impl DocumentVersion {
    /// Create version from raw counter
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw counter value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The version that follows this one
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for DocumentVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// One page of extracted document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number
    #[serde(rename = "pageNumber", alias = "page_number")]
    pub page_number: u32,

    /// Text as extracted; normalized on demand
    #[serde(rename = "text", alias = "raw_text", default)]
    pub raw_text: String,
}

impl PageRecord {
    /// Create page record
    #[inline]
    #[must_use]
    pub fn new(page_number: u32, raw_text: impl Into<String>) -> Self {
        Self {
            page_number,
            raw_text: raw_text.into(),
        }
    }
}

/// Wire shape handed over by the document provider on load/replace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Page count as reported by the provider
    #[serde(rename = "numPages", alias = "num_pages", default)]
    pub num_pages: usize,

    /// Extracted pages in document order
    #[serde(default)]
    pub pages: Vec<PageRecord>,
}

/// Immutable page index of one document version
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentIndex {
    version: DocumentVersion,
    pages: Vec<PageRecord>,
}

impl DocumentIndex {
    /// Build index from pages in document order
    ///
    /// # Errors
    /// Returns error if any page number is zero
    pub fn new(version: DocumentVersion, pages: Vec<PageRecord>) -> Result<Self, DocumentError> {
        if let Some(position) = pages.iter().position(|p| p.page_number == 0) {
            return Err(DocumentError::InvalidPageNumber { position });
        }
        Ok(Self { version, pages })
    }

    /// Empty index (no document loaded)
    #[inline]
    #[must_use]
    pub fn empty(version: DocumentVersion) -> Self {
        Self {
            version,
            pages: Vec::new(),
        }
    }

    /// Build index from a provider snapshot
    ///
    /// A `num_pages` that disagrees with the page list is logged and the
    /// page list wins.
    ///
    /// # Errors
    /// Returns error if any page number is zero
    pub fn from_snapshot(
        version: DocumentVersion,
        snapshot: DocumentSnapshot,
    ) -> Result<Self, DocumentError> {
        if snapshot.num_pages != snapshot.pages.len() {
            tracing::warn!(
                reported = snapshot.num_pages,
                actual = snapshot.pages.len(),
                %version,
                "document snapshot page count mismatch"
            );
        }
        Self::new(version, snapshot.pages)
    }

    /// Document version this index was built for
    #[inline]
    #[must_use]
    pub fn version(&self) -> DocumentVersion {
        self.version
    }

    /// Pages in document order
    #[inline]
    #[must_use]
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Number of pages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True when no pages are indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Errors building a document index
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Page numbers are 1-based
    #[error("page at position {position} has page number 0")]
    InvalidPageNumber { position: usize },
}
