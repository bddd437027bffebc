//! Core types for the penmark OT engine.
//!
//! Operations are immutable value objects describing one edit against a
//! known document version. They are produced by editing commands, flow
//! through transform/compose, and are finally handed to the document tree
//! store's apply step. Nothing in this crate ever mutates an operation in
//! place.

use serde_json::{Map, Value};
use thiserror::Error;

pub use penmark_path::Path;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// The two operations interact structurally but no transform rule
    /// exists for the pair. Raised instead of silently returning the
    /// operation unchanged, which would let histories diverge.
    #[error("UNSUPPORTED_PAIR: {op1} / {op2}")]
    UnsupportedPair {
        op1: &'static str,
        op2: &'static str,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
}

// ── Marks ─────────────────────────────────────────────────────────────────

/// A named character-level style (bold, color, ...) with optional payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub kind: String,
    pub value: Option<String>,
}

impl Mark {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
        }
    }

    pub fn with_value(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value.into()),
        }
    }
}

/// An interval of character offsets within a single text node,
/// serialized as a two-element `[start, end]` array. The wire contract
/// states the range as closed; this engine and the tree store treat
/// `end` as exclusive throughout, so a range with `start == end` is
/// empty (the degenerate result of a collapse).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkRange {
    pub start: usize,
    pub end: usize,
}

impl MarkRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

// ── Operation enum ────────────────────────────────────────────────────────

/// An atomic, typed description of one edit to the document tree.
///
/// `path` addresses the target node (for node-level operations, the
/// parent node; `index` is the child slot). Offsets and indices are
/// valid against the document version the operation was generated from,
/// not necessarily after rebasing — tolerating that is the transform
/// engine's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    DeleteText {
        path: Path,
        offset: usize,
        count: usize,
        /// The deleted content, carried for invertibility when known.
        text: Option<String>,
    },
    ApplyMark {
        path: Path,
        mark: Mark,
        range: MarkRange,
    },
    RemoveMark {
        path: Path,
        mark: Mark,
        range: MarkRange,
    },
    InsertNode {
        path: Path,
        index: usize,
        node: Value,
    },
    RemoveNode {
        path: Path,
        index: usize,
        /// The removed node, carried for invertibility when known.
        node: Option<Value>,
    },
    SetNode {
        path: Path,
        properties: Map<String, Value>,
        /// Previous values of the touched keys, for undo fidelity.
        old_properties: Option<Map<String, Value>>,
    },
    MergeNodes {
        path: Path,
        position: usize,
    },
    SplitNode {
        path: Path,
        position: usize,
    },
    MoveNode {
        path: Path,
        index: usize,
        new_path: Path,
        new_index: usize,
    },
}

impl Operation {
    /// Returns the operation name string (the wire `type` discriminator).
    pub fn op_name(&self) -> &'static str {
        match self {
            Operation::InsertText { .. } => "insert_text",
            Operation::DeleteText { .. } => "delete_text",
            Operation::ApplyMark { .. } => "apply_mark",
            Operation::RemoveMark { .. } => "remove_mark",
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::SetNode { .. } => "set_node",
            Operation::MergeNodes { .. } => "merge_nodes",
            Operation::SplitNode { .. } => "split_node",
            Operation::MoveNode { .. } => "move_node",
        }
    }

    /// Returns the path of the operation.
    pub fn path(&self) -> &Path {
        match self {
            Operation::InsertText { path, .. } => path,
            Operation::DeleteText { path, .. } => path,
            Operation::ApplyMark { path, .. } => path,
            Operation::RemoveMark { path, .. } => path,
            Operation::InsertNode { path, .. } => path,
            Operation::RemoveNode { path, .. } => path,
            Operation::SetNode { path, .. } => path,
            Operation::MergeNodes { path, .. } => path,
            Operation::SplitNode { path, .. } => path,
            Operation::MoveNode { path, .. } => path,
        }
    }

    /// Rebuild the operation with a different `path`, keeping all other
    /// fields intact.
    pub fn with_path(&self, new_path: Path) -> Operation {
        match self.clone() {
            Operation::InsertText { offset, text, .. } => Operation::InsertText {
                path: new_path,
                offset,
                text,
            },
            Operation::DeleteText {
                offset,
                count,
                text,
                ..
            } => Operation::DeleteText {
                path: new_path,
                offset,
                count,
                text,
            },
            Operation::ApplyMark { mark, range, .. } => Operation::ApplyMark {
                path: new_path,
                mark,
                range,
            },
            Operation::RemoveMark { mark, range, .. } => Operation::RemoveMark {
                path: new_path,
                mark,
                range,
            },
            Operation::InsertNode { index, node, .. } => Operation::InsertNode {
                path: new_path,
                index,
                node,
            },
            Operation::RemoveNode { index, node, .. } => Operation::RemoveNode {
                path: new_path,
                index,
                node,
            },
            Operation::SetNode {
                properties,
                old_properties,
                ..
            } => Operation::SetNode {
                path: new_path,
                properties,
                old_properties,
            },
            Operation::MergeNodes { position, .. } => Operation::MergeNodes {
                path: new_path,
                position,
            },
            Operation::SplitNode { position, .. } => Operation::SplitNode {
                path: new_path,
                position,
            },
            Operation::MoveNode {
                index,
                new_path: dest,
                new_index,
                ..
            } => Operation::MoveNode {
                path: new_path,
                index,
                new_path: dest,
                new_index,
            },
        }
    }

    /// Returns true if this is a node-structural split or merge, the two
    /// operation kinds without a transform matrix.
    pub fn is_split_or_merge(&self) -> bool {
        matches!(
            self,
            Operation::SplitNode { .. } | Operation::MergeNodes { .. }
        )
    }
}
