//! Binary format for persisted indexes.
//!
//! Both `InvertedIndex` and `DenseIndex` are built once from a frozen corpus and
//! reopened read-only afterward, so there is one artifact per index: a small
//! fixed header (magic, format version, kind, corpus size, and the index's own
//! parameters) followed by the postcard-encoded body. No WAL, no segments, no
//! tombstones — rebuilding the corpus means rebuilding the artifact.

use crate::persistence::error::{PersistenceError, PersistenceResult};

/// Magic bytes identifying a rank-retrieve index artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"RIDX";

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Which retriever an artifact holds. Guards against loading a BM25 artifact
/// as a dense index or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexKind {
    Bm25,
    Dense,
}

/// Fixed header written before the postcard-encoded index body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexHeader {
    pub format_version: u32,
    pub kind: IndexKind,
    /// Number of documents the index was built from.
    pub corpus_size: u32,
    /// CRC32 of the body bytes that follow the header.
    pub checksum: u32,
}

impl IndexHeader {
    pub fn new(kind: IndexKind, corpus_size: u32, checksum: u32) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            kind,
            corpus_size,
            checksum,
        }
    }

    pub fn validate(&self, expected_kind: IndexKind) -> PersistenceResult<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(PersistenceError::Format {
                message: "index format version mismatch".to_string(),
                expected: Some(FORMAT_VERSION.to_string()),
                actual: Some(self.format_version.to_string()),
            });
        }
        if self.kind != expected_kind {
            return Err(PersistenceError::Format {
                message: "index kind mismatch".to_string(),
                expected: Some(format!("{:?}", expected_kind)),
                actual: Some(format!("{:?}", self.kind)),
            });
        }
        Ok(())
    }
}

/// Full artifact: magic + header + postcard body, all written in one `atomic_write`.
#[cfg(feature = "persistence")]
pub fn encode_artifact(header: &IndexHeader, body: &[u8]) -> PersistenceResult<Vec<u8>> {
    let header_bytes = postcard::to_allocvec(header)
        .map_err(|e| PersistenceError::Serialization(format!("header: {}", e)))?;
    let mut out = Vec::with_capacity(4 + 4 + header_bytes.len() + body.len());
    out.extend_from_slice(&ARTIFACT_MAGIC);
    out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(body);
    Ok(out)
}

/// Split a raw artifact back into its header and body bytes, validating the
/// magic and the header's checksum against the body.
#[cfg(feature = "persistence")]
pub fn decode_artifact(bytes: &[u8]) -> PersistenceResult<(IndexHeader, &[u8])> {
    if bytes.len() < 8 || bytes[0..4] != ARTIFACT_MAGIC {
        return Err(PersistenceError::Format {
            message: "not a rank-retrieve index artifact".to_string(),
            expected: Some(format!("{:?}", ARTIFACT_MAGIC)),
            actual: Some(format!("{:?}", bytes.get(0..4))),
        });
    }
    let header_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let header_start = 8;
    let header_end = header_start + header_len;
    if bytes.len() < header_end {
        return Err(PersistenceError::Format {
            message: "truncated index artifact header".to_string(),
            expected: None,
            actual: None,
        });
    }
    let header: IndexHeader = postcard::from_bytes(&bytes[header_start..header_end])
        .map_err(|e| PersistenceError::Deserialization(format!("header: {}", e)))?;
    let body = &bytes[header_end..];

    let actual_checksum = crc32fast::hash(body);
    if actual_checksum != header.checksum {
        return Err(PersistenceError::ChecksumMismatch {
            expected: header.checksum,
            actual: actual_checksum,
        });
    }

    Ok((header, body))
}
