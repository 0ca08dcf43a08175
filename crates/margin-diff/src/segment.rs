//! Suggested-edit segments
//!
//! A rewrite arrives as an ordered, contiguous list of [`DiffSegment`]s:
//! concatenating every `original_span` reconstructs the original text.

use serde::{Deserialize, Serialize};

/// Edit operation of one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    /// Unchanged text
    Equal,
    /// Original text proposed for removal
    Delete,
    /// New text proposed at this position
    Insert,
    /// Original text proposed to be swapped for new text
    Replace,
    /// Any op this version does not know; always keeps the original
    #[serde(other)]
    Unknown,
}

impl DiffOp {
    /// True if the reviewer can accept or reject this op
    #[inline]
    #[must_use]
    pub fn is_reviewable(self) -> bool {
        !matches!(self, Self::Equal)
    }
}

/// One unit of a proposed edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    /// Operation
    pub op: DiffOp,

    /// Span of the original text covered by this segment
    #[serde(rename = "orig", alias = "originalSpan", alias = "original_span", default)]
    pub original_span: String,

    /// Proposed replacement span
    #[serde(rename = "suggested", alias = "suggestedSpan", alias = "suggested_span", default)]
    pub suggested_span: String,
}

impl DiffSegment {
    /// Create segment
    #[inline]
    #[must_use]
    pub fn new(op: DiffOp, original: impl Into<String>, suggested: impl Into<String>) -> Self {
        Self {
            op,
            original_span: original.into(),
            suggested_span: suggested.into(),
        }
    }

    /// Unchanged span
    #[inline]
    #[must_use]
    pub fn equal(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(DiffOp::Equal, text.clone(), text)
    }

    /// Proposed removal
    #[inline]
    #[must_use]
    pub fn delete(original: impl Into<String>) -> Self {
        Self::new(DiffOp::Delete, original, String::new())
    }

    /// Proposed insertion
    #[inline]
    #[must_use]
    pub fn insert(suggested: impl Into<String>) -> Self {
        Self::new(DiffOp::Insert, String::new(), suggested)
    }

    /// Proposed replacement
    #[inline]
    #[must_use]
    pub fn replace(original: impl Into<String>, suggested: impl Into<String>) -> Self {
        Self::new(DiffOp::Replace, original, suggested)
    }
}

/// Original text the segments were computed against
#[must_use]
pub fn original_text(segments: &[DiffSegment]) -> String {
    segments.iter().map(|s| s.original_span.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_names() {
        let json = r#"[
            {"op": "equal", "orig": "A ", "suggested": "A "},
            {"op": "replace", "orig": "B", "suggested": "C"},
            {"op": "insert", "orig": "", "suggested": " D"}
        ]"#;
        let segments: Vec<DiffSegment> = serde_json::from_str(json).unwrap();
        assert_eq!(segments[1], DiffSegment::replace("B", "C"));
        assert_eq!(segments[2].op, DiffOp::Insert);
    }

    #[test]
    fn unknown_op_deserializes() {
        let json = r#"{"op": "move", "orig": "X", "suggested": "Y"}"#;
        let segment: DiffSegment = serde_json::from_str(json).unwrap();
        assert_eq!(segment.op, DiffOp::Unknown);
    }

    #[test]
    fn camel_case_aliases_accepted() {
        let json = r#"{"op": "delete", "originalSpan": "X"}"#;
        let segment: DiffSegment = serde_json::from_str(json).unwrap();
        assert_eq!(segment, DiffSegment::delete("X"));
    }

    #[test]
    fn original_text_concatenates_spans() {
        let segments = vec![
            DiffSegment::equal("A "),
            DiffSegment::replace("B", "C"),
            DiffSegment::insert(" D"),
        ];
        assert_eq!(original_text(&segments), "A B");
    }

    #[test]
    fn only_equal_is_not_reviewable() {
        assert!(!DiffOp::Equal.is_reviewable());
        assert!(DiffOp::Delete.is_reviewable());
        assert!(DiffOp::Unknown.is_reviewable());
    }
}
