//! Type definitions for document node paths.

/// A step in a node path: the index of a child within its parent.
pub type PathStep = usize;

/// A node path.
///
/// Locates a node by walking child indices from the document root. The
/// empty path addresses the root itself.
pub type Path = Vec<PathStep>;
