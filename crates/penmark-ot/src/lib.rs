//! penmark-ot — operational-transform engine for the penmark rich-text
//! editor.
//!
//! The pure algebra behind collaborative editing: `transform` rebases one
//! operation against a concurrently produced one so split edit histories
//! converge, and `compose` merges two sequential operations into one
//! equivalent operation for history compaction.
//!
//! This crate never touches presentation, performs no I/O, and does not
//! own the document tree; applying an operation to actual content is the
//! tree store's job. Everything here is synchronous, stateless and total:
//! "cannot act" is a structural result (identity, [`Composed::Unmergeable`])
//! or an explicit [`TransformError`], never a panic.

pub mod codec;
pub mod compose;
pub mod transform;
pub mod types;

pub use compose::{compose_operation_array, compose_operations, Composed};
pub use transform::{transform_operation, transform_operations};
pub use types::{CodecError, Mark, MarkRange, Operation, Path, TransformError};
