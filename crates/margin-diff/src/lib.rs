//! Margin Diff
//!
//! Per-segment review of a suggested rewrite. A rewrite is a list of
//! [`DiffSegment`]s; the reviewer accepts or rejects each non-equal
//! segment and [`compute_final_text`] rebuilds the text from those
//! decisions.
//!
//! # Example
//!
//! ```rust
//! use margin_diff::{DiffReconciler, DiffSegment, SegmentDecision};
//!
//! let mut review = DiffReconciler::init(vec![
//!     DiffSegment::equal("A "),
//!     DiffSegment::replace("B", "C"),
//!     DiffSegment::insert(" D"),
//! ]);
//! review.set_decision(1, SegmentDecision::Accepted).unwrap();
//! review.set_decision(2, SegmentDecision::Rejected).unwrap();
//! assert_eq!(review.final_text(), "A C");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod reconciler;
mod segment;

pub use reconciler::{
    compute_final_text, segment_text, DecisionError, DiffReconciler, SegmentDecision,
};
pub use segment::{original_text, DiffOp, DiffSegment};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
