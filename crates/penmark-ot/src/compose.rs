//! Compose sequential operations into fewer equivalent ones.
//!
//! `compose_operations(op1, op2)` attempts to merge two operations that
//! the same actor applied in sequence. Unlike transform, compose is
//! allowed to give up: most pairs simply cannot be represented as one
//! operation and both history entries must be kept.
//!
//! The outcome distinguishes "cannot merge" from "merges to nothing":
//! a delete followed by re-typing the identical text nets out to no
//! operation at all, which is not the same thing as two operations that
//! refuse to combine.

use penmark_path::paths_equal;
use serde_json::Map;

use crate::types::{MarkRange, Operation};

/// Outcome of composing two sequential operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Composed {
    /// One operation represents the combined effect.
    Merged(Operation),
    /// The operations cancel exactly; the net effect is nothing.
    Cancelled,
    /// No single operation represents the combined effect; keep both.
    Unmergeable,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Remove the char span `[at, at + count)` from `s`.
fn cut_span(s: &str, at: usize, count: usize) -> String {
    s.chars()
        .enumerate()
        .filter(|(i, _)| *i < at || *i >= at + count)
        .map(|(_, c)| c)
        .collect()
}

// ── Pairwise compose rules ────────────────────────────────────────────────

fn compose_insert_insert(
    path: &[usize],
    offset1: usize,
    text1: &str,
    offset2: usize,
    text2: &str,
) -> Composed {
    // Only an exactly adjacent continuation merges; anything else would
    // need offset bookkeeping the caller is better placed to do.
    if offset2 == offset1 + char_len(text1) {
        Composed::Merged(Operation::InsertText {
            path: path.to_vec(),
            offset: offset1,
            text: format!("{text1}{text2}"),
        })
    } else {
        Composed::Unmergeable
    }
}

fn compose_insert_delete(
    path: &[usize],
    offset1: usize,
    text1: &str,
    offset2: usize,
    count2: usize,
) -> Composed {
    let len1 = char_len(text1);
    // The delete must fall entirely within the just-inserted text.
    if offset2 < offset1 || offset2 + count2 > offset1 + len1 {
        return Composed::Unmergeable;
    }
    let remaining = cut_span(text1, offset2 - offset1, count2);
    if remaining.is_empty() {
        Composed::Cancelled
    } else {
        Composed::Merged(Operation::InsertText {
            path: path.to_vec(),
            offset: offset1,
            text: remaining,
        })
    }
}

fn compose_delete_delete(
    path: &[usize],
    offset1: usize,
    count1: usize,
    text1: &Option<String>,
    offset2: usize,
    count2: usize,
    text2: &Option<String>,
) -> Composed {
    if offset2 == offset1 {
        // Forward deletion at the same point eats what followed the
        // first deletion.
        let text = match (text1, text2) {
            (Some(a), Some(b)) => Some(format!("{a}{b}")),
            _ => None,
        };
        Composed::Merged(Operation::DeleteText {
            path: path.to_vec(),
            offset: offset1,
            count: count1 + count2,
            text,
        })
    } else if offset2 + count2 == offset1 {
        // Backspace run: the second delete ends exactly where the first
        // one started.
        let text = match (text1, text2) {
            (Some(a), Some(b)) => Some(format!("{b}{a}")),
            _ => None,
        };
        Composed::Merged(Operation::DeleteText {
            path: path.to_vec(),
            offset: offset2,
            count: count1 + count2,
            text,
        })
    } else {
        Composed::Unmergeable
    }
}

fn compose_delete_insert(
    path: &[usize],
    offset1: usize,
    count1: usize,
    text1: &Option<String>,
    offset2: usize,
    text2: &str,
) -> Composed {
    if offset2 != offset1 {
        return Composed::Unmergeable;
    }
    // Without the deleted text recorded there is nothing to compare
    // against; keep both.
    let Some(deleted) = text1 else {
        return Composed::Unmergeable;
    };
    let ins_len = char_len(text2);
    if text2 == deleted {
        return Composed::Cancelled;
    }
    if ins_len < count1 && deleted.chars().take(ins_len).eq(text2.chars()) {
        // Re-typed a prefix of what was deleted: the residual is a
        // smaller delete past the restored prefix.
        return Composed::Merged(Operation::DeleteText {
            path: path.to_vec(),
            offset: offset1 + ins_len,
            count: count1 - ins_len,
            text: Some(deleted.chars().skip(ins_len).collect()),
        });
    }
    if ins_len > count1 && text2.chars().take(count1).eq(deleted.chars()) {
        // Restored everything and typed more: the residual is an insert
        // of the extra suffix.
        return Composed::Merged(Operation::InsertText {
            path: path.to_vec(),
            offset: offset1 + count1,
            text: text2.chars().skip(count1).collect(),
        });
    }
    Composed::Unmergeable
}

fn ranges_touch_or_overlap(a: MarkRange, b: MarkRange) -> bool {
    b.start <= a.end && a.start <= b.end
}

fn compose_apply_apply(op1: &Operation, op2: &Operation) -> Composed {
    let (Operation::ApplyMark {
        path,
        mark: mark1,
        range: r1,
    }, Operation::ApplyMark {
        mark: mark2,
        range: r2,
        ..
    }) = (op1, op2)
    else {
        return Composed::Unmergeable;
    };
    if mark1.kind != mark2.kind {
        return Composed::Unmergeable;
    }
    if mark1.value == mark2.value {
        if !ranges_touch_or_overlap(*r1, *r2) {
            return Composed::Unmergeable;
        }
        return Composed::Merged(Operation::ApplyMark {
            path: path.clone(),
            mark: mark2.clone(),
            range: MarkRange::new(r1.start.min(r2.start), r1.end.max(r2.end)),
        });
    }
    // Differing values: the later mark overrides only where it actually
    // painted, so one operation can stand in only when it covers the
    // earlier range entirely.
    if r2.start <= r1.start && r2.end >= r1.end {
        return Composed::Merged(Operation::ApplyMark {
            path: path.clone(),
            mark: mark2.clone(),
            range: *r2,
        });
    }
    Composed::Unmergeable
}

/// Shrink `kept` by the part `removed` takes away. Shared by
/// apply-then-remove and remove-then-apply: in both directions the later
/// operation wins over the overlap, so the earlier one survives only
/// where the two do not intersect.
fn shrink_by(kept: MarkRange, removed: MarkRange) -> ShrinkOutcome {
    if removed.start <= kept.start && removed.end >= kept.end {
        ShrinkOutcome::Gone
    } else if removed.end <= kept.start || removed.start >= kept.end {
        ShrinkOutcome::Disjoint
    } else if removed.start <= kept.start {
        ShrinkOutcome::Shrunk(MarkRange::new(removed.end, kept.end))
    } else if removed.end >= kept.end {
        ShrinkOutcome::Shrunk(MarkRange::new(kept.start, removed.start))
    } else {
        // A cutout from the middle leaves two pieces; one operation
        // cannot carry both.
        ShrinkOutcome::Split
    }
}

enum ShrinkOutcome {
    Gone,
    Disjoint,
    Shrunk(MarkRange),
    Split,
}

fn compose_apply_remove(op1: &Operation, op2: &Operation) -> Composed {
    let (Operation::ApplyMark {
        path,
        mark: mark1,
        range: r1,
    }, Operation::RemoveMark {
        mark: mark2,
        range: r2,
        ..
    }) = (op1, op2)
    else {
        return Composed::Unmergeable;
    };
    if mark1.kind != mark2.kind {
        return Composed::Unmergeable;
    }
    match shrink_by(*r1, *r2) {
        ShrinkOutcome::Gone => Composed::Cancelled,
        ShrinkOutcome::Shrunk(range) => Composed::Merged(Operation::ApplyMark {
            path: path.clone(),
            mark: mark1.clone(),
            range,
        }),
        ShrinkOutcome::Disjoint | ShrinkOutcome::Split => Composed::Unmergeable,
    }
}

fn compose_remove_apply(op1: &Operation, op2: &Operation) -> Composed {
    let (Operation::RemoveMark {
        path,
        mark: mark1,
        range: r1,
    }, Operation::ApplyMark {
        mark: mark2,
        range: r2,
        ..
    }) = (op1, op2)
    else {
        return Composed::Unmergeable;
    };
    if mark1.kind != mark2.kind {
        return Composed::Unmergeable;
    }
    match shrink_by(*r1, *r2) {
        ShrinkOutcome::Gone => Composed::Cancelled,
        ShrinkOutcome::Shrunk(range) => Composed::Merged(Operation::RemoveMark {
            path: path.clone(),
            mark: mark1.clone(),
            range,
        }),
        ShrinkOutcome::Disjoint | ShrinkOutcome::Split => Composed::Unmergeable,
    }
}

fn compose_set_set(
    path: &[usize],
    props1: &Map<String, serde_json::Value>,
    old1: &Option<Map<String, serde_json::Value>>,
    props2: &Map<String, serde_json::Value>,
) -> Composed {
    let mut merged = props1.clone();
    for (k, v) in props2 {
        merged.insert(k.clone(), v.clone());
    }
    // op1's old_properties describe the state before either set ran,
    // which is what an undo of the merged operation must restore.
    Composed::Merged(Operation::SetNode {
        path: path.to_vec(),
        properties: merged,
        old_properties: old1.clone(),
    })
}

// ── Main compose ──────────────────────────────────────────────────────────

/// Attempt to merge two operations applied in sequence by the same actor.
pub fn compose_operations(op1: &Operation, op2: &Operation) -> Composed {
    if !paths_equal(op1.path(), op2.path()) {
        return Composed::Unmergeable;
    }
    match (op1, op2) {
        (
            Operation::InsertText {
                path,
                offset: o1,
                text: t1,
            },
            Operation::InsertText {
                offset: o2,
                text: t2,
                ..
            },
        ) => compose_insert_insert(path, *o1, t1, *o2, t2),
        (
            Operation::InsertText {
                path,
                offset: o1,
                text: t1,
            },
            Operation::DeleteText {
                offset: o2,
                count: c2,
                ..
            },
        ) => compose_insert_delete(path, *o1, t1, *o2, *c2),
        (
            Operation::DeleteText {
                path,
                offset: o1,
                count: c1,
                text: t1,
            },
            Operation::DeleteText {
                offset: o2,
                count: c2,
                text: t2,
                ..
            },
        ) => compose_delete_delete(path, *o1, *c1, t1, *o2, *c2, t2),
        (
            Operation::DeleteText {
                path,
                offset: o1,
                count: c1,
                text: t1,
            },
            Operation::InsertText {
                offset: o2,
                text: t2,
                ..
            },
        ) => compose_delete_insert(path, *o1, *c1, t1, *o2, t2),
        (Operation::ApplyMark { .. }, Operation::ApplyMark { .. }) => {
            compose_apply_apply(op1, op2)
        }
        (Operation::ApplyMark { .. }, Operation::RemoveMark { .. }) => {
            compose_apply_remove(op1, op2)
        }
        (Operation::RemoveMark { .. }, Operation::ApplyMark { .. }) => {
            compose_remove_apply(op1, op2)
        }
        (
            Operation::SetNode {
                path,
                properties: p1,
                old_properties: old1,
            },
            Operation::SetNode { properties: p2, .. },
        ) => compose_set_set(path, p1, old1, p2),
        _ => Composed::Unmergeable,
    }
}

/// Greedy left-to-right history compaction.
///
/// Keeps a running operation and folds each subsequent one into it; an
/// unmergeable pair flushes the run, a cancelling pair clears it. The
/// result depends on association order: the same set of operations
/// grouped differently can compact to a different (still correct) length.
pub fn compose_operation_array(ops: &[Operation]) -> Vec<Operation> {
    let mut result: Vec<Operation> = Vec::new();
    let mut current: Option<Operation> = None;
    for op in ops {
        current = match current.take() {
            None => Some(op.clone()),
            Some(run) => match compose_operations(&run, op) {
                Composed::Merged(merged) => Some(merged),
                Composed::Cancelled => None,
                Composed::Unmergeable => {
                    result.push(run);
                    Some(op.clone())
                }
            },
        };
    }
    if let Some(run) = current {
        result.push(run);
    }
    result
}
