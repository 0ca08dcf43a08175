//! Rendered highlight artifacts and cache entries

use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Output of one highlight-generation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Rendered document bytes (for example a highlighted PDF)
    pub bytes: Vec<u8>,
    /// Page the service reports the highlight on, if it knows
    pub page_hint: Option<u32>,
    /// Free-form service metadata
    pub metadata: BTreeMap<String, String>,
}

impl RenderedArtifact {
    /// Artifact without page hint or metadata
    #[inline]
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Self::default()
        }
    }

    /// Attach a page hint
    #[inline]
    #[must_use]
    pub fn with_page_hint(mut self, page: u32) -> Self {
        self.page_hint = Some(page);
        self
    }

    /// Attach one metadata pair
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Opaque, cheaply clonable reference to rendered bytes
///
/// Two handles are equal when their bytes hash equal.
#[derive(Clone)]
pub struct ArtifactHandle {
    digest: Fingerprint,
    bytes: Arc<[u8]>,
}

impl ArtifactHandle {
    /// Wrap rendered bytes
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            digest: Fingerprint::compute(&bytes),
            bytes: bytes.into(),
        }
    }

    /// Stable identifier a render surface can key its blob on
    #[inline]
    #[must_use]
    pub fn id(&self) -> String {
        self.digest.short()
    }

    /// Digest of the rendered bytes
    #[inline]
    #[must_use]
    pub fn digest(&self) -> &Fingerprint {
        &self.digest
    }

    /// Rendered bytes
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for an empty artifact
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when both handles share one allocation
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl PartialEq for ArtifactHandle {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for ArtifactHandle {}

impl fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactHandle")
            .field("id", &self.id())
            .field("len", &self.len())
            .finish()
    }
}

/// One resolved cache entry
///
/// The artifact is fixed at creation. The page number is a set-once slot:
/// it either comes from the service's page hint or is completed later by
/// the locator fallback, and is never overwritten.
#[derive(Debug)]
pub struct CacheEntry {
    fingerprint: Fingerprint,
    artifact: ArtifactHandle,
    metadata: BTreeMap<String, String>,
    page_number: OnceCell<u32>,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build entry from a freshly produced artifact
    #[must_use]
    pub fn new(fingerprint: Fingerprint, artifact: RenderedArtifact) -> Self {
        let page_number = OnceCell::new();
        if let Some(page) = artifact.page_hint {
            let _ = page_number.set(page);
        }
        Self {
            fingerprint,
            artifact: ArtifactHandle::new(artifact.bytes),
            metadata: artifact.metadata,
            page_number,
            created_at: Utc::now(),
        }
    }

    /// Cache key this entry was produced for
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Rendered artifact
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> &ArtifactHandle {
        &self.artifact
    }

    /// Service metadata
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Page number, if known yet
    #[inline]
    #[must_use]
    pub fn page_number(&self) -> Option<u32> {
        self.page_number.get().copied()
    }

    /// Fill in the page number discovered after creation
    ///
    /// Returns `false` (and changes nothing) if a page number is already
    /// set.
    pub fn complete_page_number(&self, page: u32) -> bool {
        self.page_number.set(page).is_ok()
    }

    /// Creation time
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
