//! Serializer adapter: structured document -> transport bytes.
//!
//! Pure transformation, no I/O. One-shot serialization for the fast path,
//! and a lazy chunk sequence for the fallback stream.

use crate::error::EncodeError;
use bytes::Bytes;
use serde::Serialize;

/// Serialize a document to an owned binary payload in one shot.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Bytes, EncodeError> {
    let buf = serde_json::to_vec(value)?;
    Ok(Bytes::from(buf))
}

/// Serialize a document and wrap the result in a lazy chunk sequence.
pub fn to_chunks<T: Serialize>(
    value: &T,
    chunk_size: usize,
) -> Result<ChunkSequence, EncodeError> {
    Ok(ChunkSequence::new(to_bytes(value)?, chunk_size))
}

/// A finite, non-restartable sequence of byte chunks over a payload.
///
/// Chunks are produced lazily in offset order; each `next()` hands out a
/// zero-copy slice of the underlying payload. Once exhausted the sequence
/// cannot be re-iterated - a second pass must re-serialize the source.
#[derive(Debug)]
pub struct ChunkSequence {
    payload: Bytes,
    chunk_size: usize,
    offset: usize,
}

impl ChunkSequence {
    /// Panics if `chunk_size` is zero.
    pub fn new(payload: Bytes, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            payload,
            chunk_size,
            offset: 0,
        }
    }

    /// Total payload length, independent of how much has been consumed.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

impl Iterator for ChunkSequence {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.offset >= self.payload.len() {
            return None;
        }
        let end = (self.offset + self.chunk_size).min(self.payload.len());
        let chunk = self.payload.slice(self.offset..end);
        self.offset = end;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Doc {
        title: String,
        body: String,
    }

    #[test]
    fn test_to_bytes_round_trips_through_json() {
        let doc = Doc {
            title: "capture".into(),
            body: "<html></html>".into(),
        };
        let bytes = to_bytes(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["title"], "capture");
        assert_eq!(value["body"], "<html></html>");
    }

    #[test]
    fn test_chunk_sequence_reassembles_payload() {
        let payload = Bytes::from(vec![7u8; 1000]);
        let chunks: Vec<Bytes> = ChunkSequence::new(payload.clone(), 300).collect();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].len(), 100);

        let mut rebuilt = Vec::new();
        for c in &chunks {
            rebuilt.extend_from_slice(c);
        }
        assert_eq!(Bytes::from(rebuilt), payload);
    }

    #[test]
    fn test_chunk_sequence_empty_payload_yields_nothing() {
        let mut seq = ChunkSequence::new(Bytes::new(), 64);
        assert!(seq.next().is_none());
    }

    #[test]
    fn test_chunk_sequence_is_not_restartable() {
        let mut seq = ChunkSequence::new(Bytes::from_static(b"abcdef"), 4);
        assert_eq!(seq.next().unwrap(), Bytes::from_static(b"abcd"));
        assert_eq!(seq.next().unwrap(), Bytes::from_static(b"ef"));
        assert!(seq.next().is_none());
        // Exhausted for good.
        assert!(seq.next().is_none());
    }
}
