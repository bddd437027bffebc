//! Wire codecs for document operations.

pub mod json;
