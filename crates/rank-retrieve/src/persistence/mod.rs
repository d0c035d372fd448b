//! Disk persistence for rank-retrieve indexes.
//!
//! Both the BM25 inverted index and the dense flat index are built once from a
//! frozen corpus and never mutated afterward, so the on-disk format is a single
//! postcard-encoded artifact rather than a segment/WAL/checkpoint store: one
//! header plus one payload, written atomically, read back whole.

pub mod directory;
pub mod format;
pub mod error;

pub use error::PersistenceError;
pub use format::{IndexHeader, ARTIFACT_MAGIC, FORMAT_VERSION};
