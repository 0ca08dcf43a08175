//! Review session: highlight navigation plus segment-level rewrite review
//!
//! At most one rewrite is under review at a time. Requesting a new rewrite
//! or loading a different document drops the current one. A review is tied
//! to the document version it was requested against; once the orchestrator
//! holds another version, by whatever path, the review is gone.

use crate::error::HighlightError;
use crate::orchestrator::{HighlightOrchestrator, HighlightOutcome};
use crate::service::RewriteService;
use margin_diff::{DiffReconciler, SegmentDecision};
use margin_text::{DocumentIndex, DocumentSnapshot, DocumentVersion};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Rewrite under review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveReview {
    /// Excerpt the rewrite was suggested for
    pub excerpt: String,
    /// Document version the excerpt came from
    pub document_version: DocumentVersion,
    /// Segments and decisions
    pub reconciler: DiffReconciler,
}

/// Result of a rewrite request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Now under review
    Ready(ActiveReview),
    /// Superseded by a newer request or a document change
    Discarded,
}

/// One reviewer's session over one document at a time
pub struct ReviewSession {
    highlights: HighlightOrchestrator,
    rewriter: Arc<dyn RewriteService>,
    review: Mutex<Option<ActiveReview>>,
    rewrite_generation: AtomicU64,
}

impl ReviewSession {
    /// Create session around an orchestrator
    #[must_use]
    pub fn new(highlights: HighlightOrchestrator, rewriter: Arc<dyn RewriteService>) -> Self {
        Self {
            highlights,
            rewriter,
            review: Mutex::new(None),
            rewrite_generation: AtomicU64::new(0),
        }
    }

    /// Highlight orchestrator
    #[inline]
    #[must_use]
    pub fn highlights(&self) -> &HighlightOrchestrator {
        &self.highlights
    }

    /// Replace the document, dropping any rewrite under review
    pub fn load_document(&self, index: DocumentIndex) {
        self.discard_review();
        self.highlights.load_document(index);
    }

    /// Load a provider snapshot as the next document version, dropping any
    /// rewrite under review
    ///
    /// # Errors
    /// Returns `HighlightError::Document` if the snapshot has invalid page
    /// numbers; the current document and review stay in place.
    pub fn load_snapshot(&self, snapshot: DocumentSnapshot) -> Result<DocumentVersion, HighlightError> {
        let version = self.highlights.load_snapshot(snapshot)?;
        self.discard_review();
        Ok(version)
    }

    /// Unload the document, dropping any rewrite under review
    pub fn clear_document(&self) {
        self.discard_review();
        self.highlights.clear_document();
    }

    /// Highlight `excerpt`
    ///
    /// # Errors
    /// See [`HighlightOrchestrator::request_highlight`]
    pub async fn highlight(&self, excerpt: &str) -> Result<HighlightOutcome, HighlightError> {
        self.highlights.request_highlight(excerpt).await
    }

    /// Ask for a rewrite of `excerpt` and put it under review
    ///
    /// # Errors
    /// Returns `HighlightError::Service` if the rewrite service failed
    pub async fn request_rewrite(&self, excerpt: &str) -> Result<RewriteOutcome, HighlightError> {
        let generation = self.rewrite_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let document_version = self.highlights.document_version();

        let segments = self
            .rewriter
            .suggest_rewrite(excerpt, &self.highlights.session_id())
            .await
            .map_err(|err| {
                tracing::warn!(generation, error = %err, "rewrite service failed");
                HighlightError::from(err)
            })?;

        let review = ActiveReview {
            excerpt: excerpt.to_owned(),
            document_version,
            reconciler: DiffReconciler::init(segments),
        };

        let mut slot = self.review.lock();
        if self.rewrite_generation.load(Ordering::Acquire) != generation
            || self.highlights.document_version() != document_version
        {
            tracing::warn!(generation, "discarding stale rewrite");
            return Ok(RewriteOutcome::Discarded);
        }
        tracing::info!(
            generation,
            segments = review.reconciler.segments().len(),
            pending = review.reconciler.pending_count(),
            "rewrite ready for review"
        );
        *slot = Some(review.clone());
        Ok(RewriteOutcome::Ready(review))
    }

    /// Rewrite currently under review
    #[must_use]
    pub fn active_review(&self) -> Option<ActiveReview> {
        self.current_review().clone()
    }

    /// Decide one segment; returns the resulting text
    ///
    /// # Errors
    /// - `HighlightError::NoActiveReview` if nothing is under review
    /// - `HighlightError::Decision` for an out-of-range or unchanged segment
    pub fn set_decision(
        &self,
        index: usize,
        decision: SegmentDecision,
    ) -> Result<String, HighlightError> {
        self.with_review(|reconciler| {
            reconciler.set_decision(index, decision)?;
            Ok(reconciler.final_text())
        })
    }

    /// Accept every suggestion; returns the resulting text
    ///
    /// # Errors
    /// Returns `HighlightError::NoActiveReview` if nothing is under review
    pub fn accept_all(&self) -> Result<String, HighlightError> {
        self.with_review(|reconciler| {
            reconciler.accept_all();
            Ok(reconciler.final_text())
        })
    }

    /// Reject every suggestion; returns the resulting text
    ///
    /// # Errors
    /// Returns `HighlightError::NoActiveReview` if nothing is under review
    pub fn reject_all(&self) -> Result<String, HighlightError> {
        self.with_review(|reconciler| {
            reconciler.reject_all();
            Ok(reconciler.final_text())
        })
    }

    /// Text resulting from the current decisions
    #[must_use]
    pub fn final_text(&self) -> Option<String> {
        self.current_review()
            .as_ref()
            .map(|review| review.reconciler.final_text())
    }

    /// Drop the rewrite under review
    pub fn discard_review(&self) {
        self.rewrite_generation.fetch_add(1, Ordering::AcqRel);
        *self.review.lock() = None;
    }

    fn with_review<T>(
        &self,
        f: impl FnOnce(&mut DiffReconciler) -> Result<T, HighlightError>,
    ) -> Result<T, HighlightError> {
        let mut slot = self.current_review();
        let review = slot.as_mut().ok_or(HighlightError::NoActiveReview)?;
        f(&mut review.reconciler)
    }

    /// Lock the review slot, emptying it if the document changed underneath
    fn current_review(&self) -> MutexGuard<'_, Option<ActiveReview>> {
        let mut slot = self.review.lock();
        let version = self.highlights.document_version();
        if let Some(stale) = slot.as_ref().filter(|r| r.document_version != version) {
            tracing::debug!(
                review_version = %stale.document_version,
                %version,
                "dropping review for replaced document"
            );
            *slot = None;
        }
        slot
    }
}

impl std::fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewSession")
            .field("highlights", &self.highlights)
            .field("review", &self.review.lock().is_some())
            .finish_non_exhaustive()
    }
}
