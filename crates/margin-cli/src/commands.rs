//! Subcommand implementations
//!
//! Each command takes already-parsed inputs and returns the text to print,
//! so they can be exercised without a process.

use anyhow::{Context, Result};
use margin_cache::Fingerprint;
use margin_diff::{DiffReconciler, DiffSegment, SegmentDecision};
use margin_highlight::MarginConfig;
use margin_text::{DocumentIndex, DocumentSnapshot, DocumentVersion, PageLocator};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Read a file, or stdin for `-`
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub(crate) fn fingerprint(text: &str) -> String {
    Fingerprint::of_text(text).to_string()
}

pub(crate) fn locate(
    document_json: &str,
    excerpt: &str,
    rank: bool,
    config: &MarginConfig,
) -> Result<String> {
    let snapshot: DocumentSnapshot =
        serde_json::from_str(document_json).context("document is not a valid page snapshot")?;
    let index = DocumentIndex::from_snapshot(DocumentVersion::new(1), snapshot)
        .context("document has invalid page numbers")?;
    let locator = PageLocator::with_mode(config.anchor_mode());

    if rank {
        let ranked = locator.rank(excerpt, &index);
        return serde_json::to_string_pretty(&ranked).context("failed to encode ranking");
    }

    Ok(match locator.locate(excerpt, &index) {
        Some(page) => page.to_string(),
        None => "no match".to_owned(),
    })
}

/// Decisions requested on the command line
#[derive(Debug, Default)]
pub(crate) struct DecisionArgs {
    pub(crate) accept: Vec<usize>,
    pub(crate) reject: Vec<usize>,
    pub(crate) accept_all: bool,
    pub(crate) json: bool,
}

#[derive(Serialize)]
struct ReconcileReport<'a> {
    final_text: String,
    decisions: &'a [SegmentDecision],
    pending: usize,
}

pub(crate) fn reconcile(segments_json: &str, args: &DecisionArgs) -> Result<String> {
    let segments: Vec<DiffSegment> =
        serde_json::from_str(segments_json).context("segments are not a valid diff")?;
    let mut review = DiffReconciler::init(segments);

    if args.accept_all {
        review.accept_all();
    }
    for &index in &args.accept {
        review
            .set_decision(index, SegmentDecision::Accepted)
            .with_context(|| format!("cannot accept segment {index}"))?;
    }
    for &index in &args.reject {
        review
            .set_decision(index, SegmentDecision::Rejected)
            .with_context(|| format!("cannot reject segment {index}"))?;
    }
    tracing::debug!(pending = review.pending_count(), "reconciled segments");

    if args.json {
        let report = ReconcileReport {
            final_text: review.final_text(),
            decisions: review.decisions(),
            pending: review.pending_count(),
        };
        return serde_json::to_string_pretty(&report).context("failed to encode report");
    }
    Ok(review.final_text())
}
