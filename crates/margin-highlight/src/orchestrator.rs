//! Highlight orchestration
//!
//! Turns "the reviewer selected this excerpt" into "this artifact, on this
//! page, is now shown", while any number of earlier requests may still be
//! completing.
//!
//! # Ordering
//!
//! Every request takes a generation token from a monotonically increasing
//! counter. A result is published only if its token is still the latest
//! when it completes; otherwise it is returned as
//! [`HighlightOutcome::Discarded`]. The token check and the publish happen
//! under the snapshot channel's lock, so last-request-wins also holds on a
//! multi-threaded runtime. Discarded results stay cached.
//!
//! Render-surface calls are made after that lock is released, serialized
//! by a separate surface lock so they follow publish order. A surface may
//! read the orchestrator's snapshot from inside a callback.
//!
//! Loading a document bumps the generation too, so nothing requested
//! against an older document is ever published.

use crate::config::MarginConfig;
use crate::error::HighlightError;
use crate::service::{HighlightService, SessionId};
use crate::surface::{BoundingBox, RenderSurface};
use margin_cache::{ArtifactCache, ArtifactHandle, CacheStats, Fingerprint};
use margin_text::{DocumentIndex, DocumentSnapshot, DocumentVersion, PageLocator};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Request lifecycle as seen by observers
///
/// `Applied`, `Discarded` and `Failed` are reported per request through
/// [`HighlightOutcome`] and the returned error; the published state returns
/// to `Idle` after each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightState {
    /// Nothing in flight
    #[default]
    Idle,
    /// The latest request is waiting for its artifact
    Requesting {
        /// Token of that request
        generation: u64,
    },
}

/// A resolved highlight ready to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightView {
    /// Fingerprint of the excerpt that produced this view
    pub fingerprint: Fingerprint,
    /// Rendered artifact
    pub artifact: ArtifactHandle,
    /// Page to navigate to, if the service hinted one or the locator found one
    pub page_number: Option<u32>,
    /// Token of the request that produced this view
    pub generation: u64,
}

/// Published orchestrator state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightSnapshot {
    /// Current lifecycle state
    pub state: HighlightState,
    /// Most recently applied highlight, cleared on document change
    pub view: Option<HighlightView>,
}

/// Result of one highlight request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightOutcome {
    /// Published to observers and the render surface
    Applied(HighlightView),
    /// Superseded by a newer request or a document change; cached only
    Discarded(HighlightView),
    /// Excerpt too short; nothing requested
    Skipped,
}

impl HighlightOutcome {
    /// View carried by this outcome
    #[inline]
    #[must_use]
    pub fn view(&self) -> Option<&HighlightView> {
        match self {
            Self::Applied(view) | Self::Discarded(view) => Some(view),
            Self::Skipped => None,
        }
    }

    /// Check if the result was published
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Coordinates the highlight service, artifact cache, page locator and
/// render surface for one review session
pub struct HighlightOrchestrator {
    service: Arc<dyn HighlightService>,
    surface: Arc<dyn RenderSurface>,
    cache: ArtifactCache,
    locator: PageLocator,
    document: RwLock<Arc<DocumentIndex>>,
    generation: AtomicU64,
    session: SessionId,
    min_excerpt_chars: usize,
    snapshot: watch::Sender<HighlightSnapshot>,
    surface_order: Mutex<()>,
}

impl HighlightOrchestrator {
    /// Create orchestrator with default configuration
    #[must_use]
    pub fn new(service: Arc<dyn HighlightService>, surface: Arc<dyn RenderSurface>) -> Self {
        Self::with_config(service, surface, &MarginConfig::default())
    }

    /// Create orchestrator from configuration
    #[must_use]
    pub fn with_config(
        service: Arc<dyn HighlightService>,
        surface: Arc<dyn RenderSurface>,
        config: &MarginConfig,
    ) -> Self {
        let (snapshot, _) = watch::channel(HighlightSnapshot::default());
        Self {
            service,
            surface,
            cache: ArtifactCache::new(),
            locator: PageLocator::with_mode(config.anchor_mode()),
            document: RwLock::new(Arc::new(DocumentIndex::default())),
            generation: AtomicU64::new(0),
            session: SessionId::new(),
            min_excerpt_chars: config.min_excerpt_chars,
            snapshot,
            surface_order: Mutex::new(()),
        }
    }

    /// Use a caller-supplied session id
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    /// Session id forwarded to the highlight service
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Currently loaded document
    #[inline]
    #[must_use]
    pub fn document(&self) -> Arc<DocumentIndex> {
        Arc::clone(&self.document.read())
    }

    /// Version of the currently loaded document
    #[inline]
    #[must_use]
    pub fn document_version(&self) -> DocumentVersion {
        self.document.read().version()
    }

    /// Latest issued generation token
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Current published state
    #[must_use]
    pub fn snapshot(&self) -> HighlightSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Observe published state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HighlightSnapshot> {
        self.snapshot.subscribe()
    }

    /// Artifact cache backing this orchestrator
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Replace the loaded document
    ///
    /// Retires every cached artifact and every in-flight request, clears the
    /// surface's annotations and resets the published state.
    pub fn load_document(&self, index: DocumentIndex) {
        let version = index.version();
        let pages = index.len();
        *self.document.write() = Arc::new(index);
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
        {
            let _order = self.surface_order.lock();
            self.snapshot.send_replace(HighlightSnapshot::default());
            self.surface.clear_annotations();
        }
        tracing::info!(%version, pages, "document loaded");
    }

    /// Load a provider snapshot as the next document version
    ///
    /// # Errors
    /// Returns `HighlightError::Document` if the snapshot has invalid page
    /// numbers; the current document stays loaded.
    pub fn load_snapshot(&self, snapshot: DocumentSnapshot) -> Result<DocumentVersion, HighlightError> {
        let version = self.document_version().next();
        let index = DocumentIndex::from_snapshot(version, snapshot)?;
        self.load_document(index);
        Ok(version)
    }

    /// Unload the document, leaving an empty index at the next version
    pub fn clear_document(&self) {
        let version = self.document_version().next();
        self.load_document(DocumentIndex::empty(version));
    }

    /// Forward an annotation to the render surface
    pub fn attach_annotation(&self, boxes: &[BoundingBox], content: &str) {
        self.surface.attach_annotation(boxes, content);
    }

    /// Highlight `excerpt` and navigate to its page
    ///
    /// # Errors
    /// Returns `HighlightError::Service` if the highlight service failed.
    /// The failure is not cached; reissuing the request tries again.
    pub async fn request_highlight(&self, excerpt: &str) -> Result<HighlightOutcome, HighlightError> {
        if excerpt.trim().chars().count() < self.min_excerpt_chars {
            tracing::debug!(min = self.min_excerpt_chars, "excerpt too short, skipping");
            return Ok(HighlightOutcome::Skipped);
        }

        let fingerprint = Fingerprint::of_text(excerpt);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let document = self.document();
        self.publish_if_latest(generation, |snap| {
            snap.state = HighlightState::Requesting { generation };
        });
        tracing::debug!(fingerprint = %fingerprint.short(), generation, "highlight requested");

        let resolved = self
            .cache
            .resolve(fingerprint, || {
                self.service.generate_highlight(excerpt, &self.session)
            })
            .await;

        let entry = match resolved {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    fingerprint = %fingerprint.short(),
                    generation,
                    error = %err,
                    "highlight service failed"
                );
                self.publish_if_latest(generation, |snap| snap.state = HighlightState::Idle);
                return Err(HighlightError::Service(err));
            }
        };

        let mut page_number = entry.page_number();
        if page_number.is_none() {
            page_number = self.locator.locate(excerpt, &document);
            if let Some(page) = page_number {
                // the read guard keeps a document swap out until the page is written
                let current = self.document.read();
                if current.version() == document.version() {
                    entry.complete_page_number(page);
                }
            }
        }

        let view = HighlightView {
            fingerprint,
            artifact: entry.artifact().clone(),
            page_number,
            generation,
        };

        let applied = {
            let _order = self.surface_order.lock();
            let applied = self.publish_if_latest(generation, |snap| {
                snap.state = HighlightState::Idle;
                snap.view = Some(view.clone());
            });
            if let (true, Some(page)) = (applied, page_number) {
                self.surface.show_page(page);
            }
            applied
        };

        if applied {
            tracing::info!(
                fingerprint = %fingerprint.short(),
                generation,
                page = ?page_number,
                "highlight applied"
            );
            Ok(HighlightOutcome::Applied(view))
        } else {
            tracing::warn!(
                fingerprint = %fingerprint.short(),
                generation,
                latest = self.generation(),
                "discarding stale highlight"
            );
            Ok(HighlightOutcome::Discarded(view))
        }
    }

    /// Apply `update` to the published snapshot if `generation` is still
    /// the latest token; returns whether it was applied
    fn publish_if_latest(
        &self,
        generation: u64,
        update: impl FnOnce(&mut HighlightSnapshot),
    ) -> bool {
        self.snapshot.send_if_modified(|snap| {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            update(snap);
            true
        })
    }
}

impl std::fmt::Debug for HighlightOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightOrchestrator")
            .field("session", &self.session)
            .field("document_version", &self.document_version())
            .field("generation", &self.generation())
            .field("min_excerpt_chars", &self.min_excerpt_chars)
            .finish_non_exhaustive()
    }
}
