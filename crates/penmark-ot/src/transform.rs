//! Pairwise operational transform for document operations.
//!
//! `transform_operation(op1, op2)` rebases `op1` so that, for two
//! operations generated concurrently from the same base document,
//! applying `op2` then the transformed `op1` meets applying `op1` then
//! the transformed `op2` at the same document.
//!
//! Operations that address unrelated subtrees never interact: the
//! transform is the identity. The same identity fallback covers every
//! type pair without a positional effect (a `set_node` cannot move
//! anything, a mark cannot shift an offset). The one exception is
//! `split_node`/`merge_nodes`: those restructure the tree in ways this
//! engine has no rules for, so a related-path pair involving either is
//! rejected with [`TransformError::UnsupportedPair`] rather than passed
//! through unchanged.

use penmark_path::{paths_equal, paths_related, Path, PathStep};

use crate::types::{MarkRange, Operation, TransformError};

// ── Helpers ───────────────────────────────────────────────────────────────

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Full path of the child slot a node-level operation addresses.
fn child_path(parent: &[PathStep], index: usize) -> Path {
    let mut p = parent.to_vec();
    p.push(index);
    p
}

/// True if any path touched by `a` is related to any path touched by `b`
/// (equal, ancestor or descendant). Moves touch their destination too.
fn operations_related(a: &Operation, b: &Operation) -> bool {
    let a_paths: [Option<&Path>; 2] = [Some(a.path()), move_destination(a)];
    let b_paths: [Option<&Path>; 2] = [Some(b.path()), move_destination(b)];
    for ap in a_paths.into_iter().flatten() {
        for bp in b_paths.into_iter().flatten() {
            if paths_related(ap, bp) {
                return true;
            }
        }
    }
    false
}

fn move_destination(op: &Operation) -> Option<&Path> {
    match op {
        Operation::MoveNode { new_path, .. } => Some(new_path),
        _ => None,
    }
}

/// New coordinates of a mark range after `len` characters were inserted
/// at `pos` in the same node. Insertion at the range start shifts the
/// whole range; insertion strictly inside grows the end.
fn range_after_insert(r: MarkRange, pos: usize, len: usize) -> MarkRange {
    if pos <= r.start {
        MarkRange::new(r.start + len, r.end + len)
    } else if pos < r.end {
        MarkRange::new(r.start, r.end + len)
    } else {
        r
    }
}

/// New coordinates of a mark range after `count` characters were deleted
/// at `pos` in the same node. A delete covering the whole range collapses
/// it to an empty range at the delete point.
fn range_after_delete(r: MarkRange, pos: usize, count: usize) -> MarkRange {
    let del_end = pos + count;
    if del_end <= r.start {
        MarkRange::new(r.start - count, r.end - count)
    } else if pos >= r.end {
        r
    } else if pos <= r.start && del_end >= r.end {
        MarkRange::new(pos, pos)
    } else if pos <= r.start {
        MarkRange::new(pos, r.end - count)
    } else if del_end >= r.end {
        MarkRange::new(r.start, pos)
    } else {
        MarkRange::new(r.start, r.end - count)
    }
}

fn chars_skip(s: &str, n: usize) -> String {
    s.chars().skip(n).collect()
}

fn chars_take(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Remove `count` chars starting at `at` from a recorded deletion text.
fn chars_cut(s: &str, at: usize, count: usize) -> String {
    s.chars()
        .enumerate()
        .filter(|(i, _)| *i < at || *i >= at + count)
        .map(|(_, c)| c)
        .collect()
}

// ── Individual transforms ─────────────────────────────────────────────────

/// Transform `op` against a concurrent `insert_text` at `ins_offset`.
fn x_insert_text(op: &Operation, ins_path: &Path, ins_offset: usize, ins_len: usize) -> Operation {
    match op {
        Operation::InsertText { path, offset, text } if paths_equal(path, ins_path) => {
            // Tie-break: an equal-offset concurrent insert landed first.
            if *offset >= ins_offset {
                Operation::InsertText {
                    path: path.clone(),
                    offset: offset + ins_len,
                    text: text.clone(),
                }
            } else {
                op.clone()
            }
        }
        Operation::DeleteText {
            path,
            offset,
            count,
            text,
        } if paths_equal(path, ins_path) => {
            if ins_offset <= *offset {
                Operation::DeleteText {
                    path: path.clone(),
                    offset: offset + ins_len,
                    count: *count,
                    text: text.clone(),
                }
            } else if ins_offset < offset + count {
                // Text landed inside the pending delete range: the delete
                // absorbs it. The recorded text no longer matches, drop it.
                Operation::DeleteText {
                    path: path.clone(),
                    offset: *offset,
                    count: count + ins_len,
                    text: None,
                }
            } else {
                op.clone()
            }
        }
        Operation::ApplyMark { path, mark, range } if paths_equal(path, ins_path) => {
            Operation::ApplyMark {
                path: path.clone(),
                mark: mark.clone(),
                range: range_after_insert(*range, ins_offset, ins_len),
            }
        }
        Operation::RemoveMark { path, mark, range } if paths_equal(path, ins_path) => {
            Operation::RemoveMark {
                path: path.clone(),
                mark: mark.clone(),
                range: range_after_insert(*range, ins_offset, ins_len),
            }
        }
        _ => op.clone(),
    }
}

/// Transform `op` against a concurrent `delete_text` of `del_count`
/// characters at `del_offset`.
fn x_delete_text(op: &Operation, del_path: &Path, del_offset: usize, del_count: usize) -> Operation {
    let del_end = del_offset + del_count;
    match op {
        Operation::InsertText { path, offset, text } if paths_equal(path, del_path) => {
            if *offset <= del_offset {
                op.clone()
            } else if *offset >= del_end {
                Operation::InsertText {
                    path: path.clone(),
                    offset: offset - del_count,
                    text: text.clone(),
                }
            } else {
                // Insertion point vanished with the deleted range; it
                // collapses to the delete's start.
                Operation::InsertText {
                    path: path.clone(),
                    offset: del_offset,
                    text: text.clone(),
                }
            }
        }
        Operation::DeleteText {
            path,
            offset,
            count,
            text,
        } if paths_equal(path, del_path) => {
            let end = offset + count;
            if del_end <= *offset {
                // Disjoint, before: shift left.
                Operation::DeleteText {
                    path: path.clone(),
                    offset: offset - del_count,
                    count: *count,
                    text: text.clone(),
                }
            } else if del_offset >= end {
                // Disjoint, after.
                op.clone()
            } else if del_offset <= *offset && del_end >= end {
                // Fully inside the concurrent delete: nothing left to
                // remove, degenerate to a zero-count delete.
                Operation::DeleteText {
                    path: path.clone(),
                    offset: del_offset,
                    count: 0,
                    text: text.as_ref().map(|_| String::new()),
                }
            } else if del_offset <= *offset {
                // Concurrent delete consumed our head.
                let overlap = del_end - offset;
                Operation::DeleteText {
                    path: path.clone(),
                    offset: del_offset,
                    count: count - overlap,
                    text: text.as_ref().map(|s| chars_skip(s, overlap)),
                }
            } else if del_end <= end {
                // Concurrent delete carved out our middle.
                Operation::DeleteText {
                    path: path.clone(),
                    offset: *offset,
                    count: count - del_count,
                    text: text.as_ref().map(|s| chars_cut(s, del_offset - offset, del_count)),
                }
            } else {
                // Concurrent delete consumed our tail.
                let keep = del_offset - offset;
                Operation::DeleteText {
                    path: path.clone(),
                    offset: *offset,
                    count: keep,
                    text: text.as_ref().map(|s| chars_take(s, keep)),
                }
            }
        }
        Operation::ApplyMark { path, mark, range } if paths_equal(path, del_path) => {
            Operation::ApplyMark {
                path: path.clone(),
                mark: mark.clone(),
                range: range_after_delete(*range, del_offset, del_count),
            }
        }
        Operation::RemoveMark { path, mark, range } if paths_equal(path, del_path) => {
            Operation::RemoveMark {
                path: path.clone(),
                mark: mark.clone(),
                range: range_after_delete(*range, del_offset, del_count),
            }
        }
        _ => op.clone(),
    }
}

/// Transform `op` against a concurrent `insert_node` at slot `ins_index`
/// of the parent `ins_path`.
fn x_insert_node(op: &Operation, ins_path: &Path, ins_index: usize) -> Operation {
    match op {
        Operation::InsertNode { path, index, node } if paths_equal(path, ins_path) => {
            if *index >= ins_index {
                Operation::InsertNode {
                    path: path.clone(),
                    index: index + 1,
                    node: node.clone(),
                }
            } else {
                op.clone()
            }
        }
        Operation::RemoveNode { path, index, node } if paths_equal(path, ins_path) => {
            if *index >= ins_index {
                Operation::RemoveNode {
                    path: path.clone(),
                    index: index + 1,
                    node: node.clone(),
                }
            } else {
                op.clone()
            }
        }
        _ => op.clone(),
    }
}

/// Transform `op` against a concurrent `remove_node` at slot `rem_index`
/// of the parent `rem_path`.
fn x_remove_node(op: &Operation, rem_path: &Path, rem_index: usize) -> Operation {
    match op {
        Operation::InsertNode { path, index, node } if paths_equal(path, rem_path) => {
            if *index > rem_index {
                Operation::InsertNode {
                    path: path.clone(),
                    index: index - 1,
                    node: node.clone(),
                }
            } else {
                op.clone()
            }
        }
        _ => op.clone(),
    }
}

/// Transform `op` against a concurrent `move_node`.
fn x_move_node(
    op: &Operation,
    src_parent: &Path,
    src_index: usize,
    dst_parent: &Path,
    dst_index: usize,
) -> Operation {
    let Operation::MoveNode {
        path,
        index,
        new_path,
        new_index,
    } = op
    else {
        return op.clone();
    };

    // (a) Both moves target the identical node: follow it to where the
    // concurrent move put it.
    if paths_equal(path, src_parent) && *index == src_index {
        return Operation::MoveNode {
            path: dst_parent.clone(),
            index: dst_index,
            new_path: new_path.clone(),
            new_index: *new_index,
        };
    }

    let moved = child_path(src_parent, src_index);
    let dest = child_path(dst_parent, dst_index);

    let mut path = path.clone();
    let mut index = *index;
    let mut new_path = new_path.clone();
    let mut new_index = *new_index;

    // (b) The concurrent move carried an ancestor of our source away:
    // rewrite the matching prefix to its destination.
    if path.starts_with(&moved) {
        let mut rewritten = dest.clone();
        rewritten.extend_from_slice(&path[moved.len()..]);
        path = rewritten;
    }
    // (c) Same for our destination.
    if new_path.starts_with(&moved) {
        let mut rewritten = dest.clone();
        rewritten.extend_from_slice(&new_path[moved.len()..]);
        new_path = rewritten;
    }
    // (d) The concurrent move pulled a sibling out from before our source.
    if paths_equal(src_parent, &path) && src_index < index {
        index -= 1;
    }
    // (e) The concurrent move dropped a sibling at or before our
    // destination slot.
    if paths_equal(dst_parent, &new_path) && dst_index <= new_index {
        new_index += 1;
    }

    Operation::MoveNode {
        path,
        index,
        new_path,
        new_index,
    }
}

// ── Main transform ────────────────────────────────────────────────────────

/// Rebase `op1` against a concurrently applied `op2`.
///
/// Both operands must describe edits drawn from the same base document
/// version; version bookkeeping is the caller's responsibility.
pub fn transform_operation(op1: &Operation, op2: &Operation) -> Result<Operation, TransformError> {
    if (op1.is_split_or_merge() || op2.is_split_or_merge()) && operations_related(op1, op2) {
        return Err(TransformError::UnsupportedPair {
            op1: op1.op_name(),
            op2: op2.op_name(),
        });
    }
    Ok(match op2 {
        Operation::InsertText { path, offset, text } => {
            x_insert_text(op1, path, *offset, char_len(text))
        }
        Operation::DeleteText {
            path,
            offset,
            count,
            ..
        } => x_delete_text(op1, path, *offset, *count),
        Operation::InsertNode { path, index, .. } => x_insert_node(op1, path, *index),
        Operation::RemoveNode { path, index, .. } => x_remove_node(op1, path, *index),
        Operation::MoveNode {
            path,
            index,
            new_path,
            new_index,
        } => x_move_node(op1, path, *index, new_path, *new_index),
        // set_node and mark operations have no positional effect.
        _ => op1.clone(),
    })
}

/// Rebase every operation in `ops` against every operation in
/// `other_ops`, in the given order.
///
/// This is a sequential fold against the raw `other_ops` list: it does
/// not incrementally rebase `other_ops` against the `ops` already
/// processed. Adequate for rebasing one actor's pending list against a
/// foreign list; not a general multi-party merge.
pub fn transform_operations(
    ops: &[Operation],
    other_ops: &[Operation],
) -> Result<Vec<Operation>, TransformError> {
    let mut result = Vec::with_capacity(ops.len());
    for op in ops {
        let mut current = op.clone();
        for other in other_ops {
            current = transform_operation(&current, other)?;
        }
        result.push(current);
    }
    Ok(result)
}
