//! Accept/reject reconciliation
//!
//! [`DiffReconciler`] holds one set of suggested-edit segments and the
//! reviewer's decision for each. The resulting text is always recomputed
//! from `(segments, decisions)` by [`compute_final_text`]; nothing else
//! feeds into it.
//!
//! # Reconstruction rule
//!
//! | op      | accepted  | pending / rejected |
//! |---------|-----------|--------------------|
//! | equal   | original  | original           |
//! | delete  | (nothing) | original           |
//! | replace | suggested | original           |
//! | insert  | suggested | (nothing)          |
//! | unknown | original  | original           |

use crate::segment::{DiffOp, DiffSegment};
use serde::{Deserialize, Serialize};

/// Reviewer decision for one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentDecision {
    /// Apply the suggestion
    Accepted,
    /// Keep the original
    Rejected,
    /// Not decided yet; treated like rejected
    #[default]
    Pending,
}

impl SegmentDecision {
    /// Initial decision for a segment with `op`
    #[inline]
    #[must_use]
    pub fn initial_for(op: DiffOp) -> Self {
        if op.is_reviewable() {
            Self::Pending
        } else {
            Self::Accepted
        }
    }
}

/// Errors setting decisions
///
/// Both variants indicate a caller bug, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// Index past the end of the segment list
    #[error("segment index {index} out of range ({len} segments)")]
    OutOfRange { index: usize, len: usize },

    /// Equal segments are always accepted
    #[error("segment {index} is unchanged text and cannot be decided")]
    EqualSegment { index: usize },
}

/// Text for one segment under one decision
#[must_use]
pub fn segment_text(segment: &DiffSegment, decision: SegmentDecision) -> &str {
    let accepted = decision == SegmentDecision::Accepted;
    match segment.op {
        DiffOp::Equal | DiffOp::Unknown => &segment.original_span,
        DiffOp::Delete if accepted => "",
        DiffOp::Replace | DiffOp::Insert if accepted => &segment.suggested_span,
        DiffOp::Delete | DiffOp::Replace => &segment.original_span,
        DiffOp::Insert => "",
    }
}

/// Resulting text for `segments` under `decisions`
///
/// Pure: identical inputs always give identical output. A missing decision
/// (shorter `decisions` slice) counts as pending.
#[must_use]
pub fn compute_final_text(segments: &[DiffSegment], decisions: &[SegmentDecision]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| segment_text(segment, decisions.get(i).copied().unwrap_or_default()))
        .collect()
}

/// Decision tracker for one rewrite
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffReconciler {
    segments: Vec<DiffSegment>,
    decisions: Vec<SegmentDecision>,
}

impl DiffReconciler {
    /// Start reviewing `segments`
    ///
    /// Equal segments start accepted, everything else pending.
    #[must_use]
    pub fn init(segments: Vec<DiffSegment>) -> Self {
        let decisions = segments
            .iter()
            .map(|s| SegmentDecision::initial_for(s.op))
            .collect();
        Self {
            segments,
            decisions,
        }
    }

    /// Segments under review
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[DiffSegment] {
        &self.segments
    }

    /// Current decisions, one per segment
    #[inline]
    #[must_use]
    pub fn decisions(&self) -> &[SegmentDecision] {
        &self.decisions
    }

    /// Decide one segment
    ///
    /// Setting [`SegmentDecision::Pending`] withdraws an earlier decision.
    ///
    /// # Errors
    /// - `DecisionError::OutOfRange` if `index` is past the end
    /// - `DecisionError::EqualSegment` if the segment is unchanged text
    pub fn set_decision(
        &mut self,
        index: usize,
        decision: SegmentDecision,
    ) -> Result<(), DecisionError> {
        let segment = self.segments.get(index).ok_or(DecisionError::OutOfRange {
            index,
            len: self.segments.len(),
        })?;
        if !segment.op.is_reviewable() {
            return Err(DecisionError::EqualSegment { index });
        }
        tracing::trace!(index, ?decision, "segment decision");
        self.decisions[index] = decision;
        Ok(())
    }

    /// Accept every reviewable segment
    pub fn accept_all(&mut self) {
        self.set_all(SegmentDecision::Accepted);
    }

    /// Reject every reviewable segment
    pub fn reject_all(&mut self) {
        self.set_all(SegmentDecision::Rejected);
    }

    /// Number of segments still pending
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| **d == SegmentDecision::Pending)
            .count()
    }

    /// True once every reviewable segment is decided
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.pending_count() == 0
    }

    /// Text resulting from the current decisions
    #[inline]
    #[must_use]
    pub fn final_text(&self) -> String {
        compute_final_text(&self.segments, &self.decisions)
    }

    fn set_all(&mut self, decision: SegmentDecision) {
        for (segment, slot) in self.segments.iter().zip(self.decisions.iter_mut()) {
            if segment.op.is_reviewable() {
                *slot = decision;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use SegmentDecision::{Accepted, Pending, Rejected};

    fn example() -> Vec<DiffSegment> {
        vec![
            DiffSegment::equal("A "),
            DiffSegment::replace("B", "C"),
            DiffSegment::insert(" D"),
        ]
    }

    #[test]
    fn init_presets_equal_segments() {
        let reconciler = DiffReconciler::init(example());
        assert_eq!(reconciler.decisions(), &[Accepted, Pending, Pending]);
        assert_eq!(reconciler.pending_count(), 2);
    }

    #[test]
    fn worked_example() {
        let text = compute_final_text(&example(), &[Accepted, Accepted, Rejected]);
        assert_eq!(text, "A C");
    }

    #[test]
    fn pending_keeps_original() {
        let reconciler = DiffReconciler::init(example());
        assert_eq!(reconciler.final_text(), "A B");
    }

    #[test]
    fn delete_segment_both_ways() {
        let segments = vec![DiffSegment::delete("X")];
        assert_eq!(compute_final_text(&segments, &[Pending]), "X");
        assert_eq!(compute_final_text(&segments, &[Rejected]), "X");
        assert_eq!(compute_final_text(&segments, &[Accepted]), "");
    }

    #[test]
    fn unknown_op_never_loses_original() {
        let segments = vec![DiffSegment::new(DiffOp::Unknown, "keep", "drop")];
        assert_eq!(compute_final_text(&segments, &[Accepted]), "keep");
        assert_eq!(compute_final_text(&segments, &[Rejected]), "keep");
    }

    #[test]
    fn missing_decisions_count_as_pending() {
        assert_eq!(compute_final_text(&example(), &[]), "A B");
    }

    #[test]
    fn set_decision_rejects_equal_segment() {
        let mut reconciler = DiffReconciler::init(example());
        assert_eq!(
            reconciler.set_decision(0, Rejected),
            Err(DecisionError::EqualSegment { index: 0 })
        );
        assert_eq!(reconciler.decisions()[0], Accepted);
    }

    #[test]
    fn set_decision_rejects_out_of_range() {
        let mut reconciler = DiffReconciler::init(example());
        assert_eq!(
            reconciler.set_decision(3, Accepted),
            Err(DecisionError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn decisions_drive_final_text() {
        let mut reconciler = DiffReconciler::init(example());
        reconciler.set_decision(1, Accepted).unwrap();
        reconciler.set_decision(2, Accepted).unwrap();
        assert_eq!(reconciler.final_text(), "A C D");
        assert!(reconciler.is_resolved());

        reconciler.set_decision(2, Pending).unwrap();
        assert_eq!(reconciler.final_text(), "A C");
        assert!(!reconciler.is_resolved());
    }

    #[test]
    fn bulk_decisions_skip_equal_segments() {
        let mut reconciler = DiffReconciler::init(example());
        reconciler.accept_all();
        assert_eq!(reconciler.decisions(), &[Accepted, Accepted, Accepted]);
        reconciler.reject_all();
        assert_eq!(reconciler.decisions(), &[Accepted, Rejected, Rejected]);
        assert_eq!(reconciler.final_text(), "A B");
    }
}
