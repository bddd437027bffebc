//! Node path utilities for the penmark document tree.
//!
//! A path is a sequence of child indices walked from the document root.
//! This crate implements the comparison and prefix helpers the rest of
//! the editor builds on: lexicographic ordering, ancestor/descendant
//! tests and common-ancestor computation.
//!
//! All functions here are total over any two paths; there are no failure
//! modes at this layer. Whether a path still resolves to a node in the
//! live tree is the tree store's concern, not this crate's.
//!
//! # Example
//!
//! ```
//! use penmark_path::{compare_paths, common_ancestor, is_ancestor};
//! use std::cmp::Ordering;
//!
//! let a = vec![0, 1];
//! let b = vec![0, 1, 3];
//!
//! assert!(is_ancestor(&a, &b));
//! assert_eq!(compare_paths(&a, &b), Ordering::Less);
//! assert_eq!(common_ancestor(&a, &b), vec![0, 1]);
//! ```

use std::cmp::Ordering;

pub mod types;
pub use types::{Path, PathStep};

/// Element-wise path equality. Paths of different lengths are never equal.
///
/// # Example
///
/// ```
/// use penmark_path::paths_equal;
///
/// assert!(paths_equal(&[0, 2], &[0, 2]));
/// assert!(!paths_equal(&[0, 2], &[0, 2, 0]));
/// ```
pub fn paths_equal(a: &[PathStep], b: &[PathStep]) -> bool {
    a == b
}

/// Lexicographic comparison over the shared prefix; if the prefix ties,
/// the shorter path orders first.
///
/// This matches document order for sibling subtrees: a parent sorts
/// before any of its descendants.
///
/// # Example
///
/// ```
/// use penmark_path::compare_paths;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_paths(&[0, 1], &[0, 2]), Ordering::Less);
/// assert_eq!(compare_paths(&[0, 1], &[0, 1]), Ordering::Equal);
/// assert_eq!(compare_paths(&[0, 1, 5], &[0, 1]), Ordering::Greater);
/// ```
pub fn compare_paths(a: &[PathStep], b: &[PathStep]) -> Ordering {
    let shared = a.len().min(b.len());
    for i in 0..shared {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Returns true iff `a` is a strict, equal-valued prefix of `b`.
///
/// A path is never its own ancestor.
///
/// # Example
///
/// ```
/// use penmark_path::is_ancestor;
///
/// assert!(is_ancestor(&[1], &[1, 0, 2]));
/// assert!(!is_ancestor(&[1], &[1]));
/// assert!(!is_ancestor(&[1, 0, 2], &[1]));
/// ```
pub fn is_ancestor(a: &[PathStep], b: &[PathStep]) -> bool {
    b.len() > a.len() && b.starts_with(a)
}

/// Returns true iff `a` is strictly below `b`.
pub fn is_descendant(a: &[PathStep], b: &[PathStep]) -> bool {
    is_ancestor(b, a)
}

/// Longest shared prefix of two paths.
///
/// # Example
///
/// ```
/// use penmark_path::common_ancestor;
///
/// assert_eq!(common_ancestor(&[0, 1, 2], &[0, 1, 4]), vec![0, 1]);
/// assert_eq!(common_ancestor(&[0], &[3]), Vec::<usize>::new());
/// ```
pub fn common_ancestor(a: &[PathStep], b: &[PathStep]) -> Path {
    let shared = a.len().min(b.len());
    let mut prefix = Vec::with_capacity(shared);
    for i in 0..shared {
        if a[i] != b[i] {
            break;
        }
        prefix.push(a[i]);
    }
    prefix
}

/// Returns true iff the two paths address the same node or one contains
/// the other. Operations on unrelated paths never interact.
pub fn paths_related(a: &[PathStep], b: &[PathStep]) -> bool {
    let shared = a.len().min(b.len());
    a[..shared] == b[..shared]
}
