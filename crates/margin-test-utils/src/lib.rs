//! Testing utilities for the Margin workspace
//!
//! Fakes for the remote services and the render surface, plus a small
//! sample document.

#![allow(missing_docs)]

use margin_cache::RenderedArtifact;
use margin_diff::DiffSegment;
use margin_highlight::{
    BoundingBox, HighlightOrchestrator, HighlightService, MarginConfig, RenderSurface,
    RewriteService, ServiceError, SessionId,
};
use margin_text::{DocumentIndex, DocumentVersion, PageRecord};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Excerpt that only page 2 of [`sample_document`] matches
pub const STORAGE_EXCERPT: &str = "Store below 25 degrees in the original package";

/// Excerpt that only page 3 of [`sample_document`] matches
pub const SHELF_LIFE_EXCERPT: &str = "The proposed shelf life of 36 months is acceptable";

pub fn sample_pages() -> Vec<PageRecord> {
    vec![
        PageRecord::new(
            1,
            "Assessment report\nThe applicant submitted a marketing authorisation \
             application for the medicinal product.",
        ),
        PageRecord::new(
            2,
            "Storage conditions: store below 25 degrees. Keep the blister in the \
             original package to protect from light.",
        ),
        PageRecord::new(
            3,
            "Stability data support the proposed shelf life of 36 months when \
             stored as described. This is acceptable.",
        ),
    ]
}

pub fn sample_document(version: u64) -> DocumentIndex {
    DocumentIndex::new(DocumentVersion::new(version), sample_pages())
        .unwrap_or_else(|err| panic!("sample pages are valid: {err}"))
}

pub fn highlight_bytes(excerpt: &str) -> Vec<u8> {
    format!("%PDF-1.7 highlight:{excerpt}").into_bytes()
}

/// Install a test-writer subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Scriptable [`HighlightService`]
///
/// Renders `%PDF-1.7 highlight:<excerpt>`. Calls for a gated excerpt wait
/// until the gate's sender fires or is dropped.
#[derive(Default)]
pub struct FakeHighlightService {
    calls: AtomicUsize,
    calls_by_excerpt: Mutex<HashMap<String, usize>>,
    sessions: Mutex<Vec<SessionId>>,
    page_hints: Mutex<HashMap<String, u32>>,
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
    failures: Mutex<HashMap<String, VecDeque<ServiceError>>>,
}

impl FakeHighlightService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `page` as the page hint for `excerpt`
    pub fn with_page_hint(self, excerpt: &str, page: u32) -> Self {
        self.page_hints.lock().insert(excerpt.to_owned(), page);
        self
    }

    /// Hold the next call for `excerpt` until the returned sender fires
    pub fn gate(&self, excerpt: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .entry(excerpt.to_owned())
            .or_default()
            .push_back(rx);
        tx
    }

    /// Fail the next call for `excerpt` with `err`
    pub fn fail_next(&self, excerpt: &str, err: ServiceError) {
        self.failures
            .lock()
            .entry(excerpt.to_owned())
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, excerpt: &str) -> usize {
        self.calls_by_excerpt.lock().get(excerpt).copied().unwrap_or(0)
    }

    pub fn sessions(&self) -> Vec<SessionId> {
        self.sessions.lock().clone()
    }
}

#[async_trait::async_trait]
impl HighlightService for FakeHighlightService {
    async fn generate_highlight(
        &self,
        raw_excerpt: &str,
        session: &SessionId,
    ) -> Result<RenderedArtifact, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_by_excerpt
            .lock()
            .entry(raw_excerpt.to_owned())
            .or_default() += 1;
        self.sessions.lock().push(*session);

        let gate = self
            .gates
            .lock()
            .get_mut(raw_excerpt)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let failure = self
            .failures
            .lock()
            .get_mut(raw_excerpt)
            .and_then(VecDeque::pop_front);
        if let Some(err) = failure {
            return Err(err);
        }

        let mut artifact = RenderedArtifact::new(highlight_bytes(raw_excerpt))
            .with_metadata("renderer", "fake");
        if let Some(page) = self.page_hints.lock().get(raw_excerpt).copied() {
            artifact = artifact.with_page_hint(page);
        }
        Ok(artifact)
    }
}

/// Scriptable [`RewriteService`]
///
/// Excerpts without a scripted rewrite are rejected.
#[derive(Default)]
pub struct FakeRewriteService {
    calls: AtomicUsize,
    rewrites: Mutex<HashMap<String, Vec<DiffSegment>>>,
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
}

impl FakeRewriteService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rewrite(self, excerpt: &str, segments: Vec<DiffSegment>) -> Self {
        self.rewrites.lock().insert(excerpt.to_owned(), segments);
        self
    }

    /// Hold the next call for `excerpt` until the returned sender fires
    pub fn gate(&self, excerpt: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .entry(excerpt.to_owned())
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RewriteService for FakeRewriteService {
    async fn suggest_rewrite(
        &self,
        excerpt: &str,
        _session: &SessionId,
    ) -> Result<Vec<DiffSegment>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().get_mut(excerpt).and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.rewrites
            .lock()
            .get(excerpt)
            .cloned()
            .ok_or_else(|| ServiceError::Rejected(format!("no rewrite for {excerpt:?}")))
    }
}

/// Call received by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    ShowPage(u32),
    Attach {
        boxes: Vec<BoundingBox>,
        content: String,
    },
    Clear,
}

/// [`RenderSurface`] that records every call in order
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    pub fn shown_pages(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::ShowPage(page) => Some(*page),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, SurfaceCall::Clear))
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    fn show_page(&self, page: u32) {
        self.calls.lock().push(SurfaceCall::ShowPage(page));
    }

    fn attach_annotation(&self, boxes: &[BoundingBox], content: &str) {
        self.calls.lock().push(SurfaceCall::Attach {
            boxes: boxes.to_vec(),
            content: content.to_owned(),
        });
    }

    fn clear_annotations(&self) {
        self.calls.lock().push(SurfaceCall::Clear);
    }
}

/// Orchestrator wired to fakes, with [`sample_document`] v1 loaded
pub struct TestRig {
    pub service: Arc<FakeHighlightService>,
    pub surface: Arc<RecordingSurface>,
    pub orchestrator: HighlightOrchestrator,
}

pub fn test_rig(service: FakeHighlightService) -> TestRig {
    test_rig_with_config(service, &MarginConfig::default())
}

pub fn test_rig_with_config(service: FakeHighlightService, config: &MarginConfig) -> TestRig {
    let service = Arc::new(service);
    let surface = Arc::new(RecordingSurface::new());
    let orchestrator = HighlightOrchestrator::with_config(
        Arc::clone(&service) as Arc<dyn HighlightService>,
        Arc::clone(&surface) as Arc<dyn RenderSurface>,
        config,
    );
    orchestrator.load_document(sample_document(1));
    TestRig {
        service,
        surface,
        orchestrator,
    }
}
