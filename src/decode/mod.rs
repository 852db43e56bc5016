//! Frame Decoder: attempt decompression of a candidate offset, retaining
//! only output that parses as a JSON object.
//!
//! `compressed_len` is read off `zstd_safe`'s `InBuffer::pos()` after
//! streaming decompression — the number of input bytes the decoder actually
//! consumed to produce one complete frame — rather than assumed from the
//! frame header, since the decoder is the only source of truth for how
//! many bytes a frame actually occupies.

use serde_json::Value;
use zstd_safe::{DCtx, InBuffer, OutBuffer};

use crate::cli::constants::{DECODE_SAFETY_CAP, STANDARD_MAGIC};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeReason {
    NotZstd,
    Truncated,
    DecodeError,
    NotUtf8,
    NotJson,
    TooLarge,
}

#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub offset: usize,
    pub compressed_len: usize,
    pub json: Value,
}

const CHUNK: usize = 64 * 1024;

/// Decompress the standard frame starting at `offset` within `data`,
/// enforcing `safety_cap` on the decoded size (the configurable cap,
/// default [`DECODE_SAFETY_CAP`]), and parse the result as JSON.
///
/// Side-effect-free: only reads `data`, never mutates the source and may be
/// called concurrently on disjoint candidates.
pub fn decode_candidate(
    data: &[u8],
    offset: usize,
    safety_cap: usize,
) -> Result<DecodedFrame, DecodeReason> {
    if data.len() < offset + 4 || data[offset..offset + 4] != STANDARD_MAGIC {
        return Err(DecodeReason::NotZstd);
    }

    let mut dctx = DCtx::create();
    let mut decoded = Vec::new();
    let mut in_buf = InBuffer::around(&data[offset..]);
    let mut scratch = vec![0u8; CHUNK];

    loop {
        let mut out_buf = OutBuffer::around(&mut scratch);
        let hint = dctx
            .decompress_stream(&mut out_buf, &mut in_buf)
            .map_err(|_| DecodeReason::DecodeError)?;

        decoded.extend_from_slice(out_buf.as_slice());
        if decoded.len() > safety_cap {
            return Err(DecodeReason::TooLarge);
        }

        if hint == 0 {
            break; // frame complete
        }
        if in_buf.pos() >= in_buf.as_slice().len() {
            // All available input consumed but the frame reports more is
            // needed: the source was cut short mid-frame.
            return Err(DecodeReason::Truncated);
        }
    }

    let compressed_len = in_buf.pos();

    let text = std::str::from_utf8(&decoded).map_err(|_| DecodeReason::NotUtf8)?;
    let json: Value = serde_json::from_str(text).map_err(|_| DecodeReason::NotJson)?;
    if !json.is_object() {
        return Err(DecodeReason::NotJson);
    }

    Ok(DecodedFrame { offset, compressed_len, json })
}

/// Convenience wrapper using the default safety cap.
pub fn decode_candidate_default(data: &[u8], offset: usize) -> Result<DecodedFrame, DecodeReason> {
    decode_candidate(data, offset, DECODE_SAFETY_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zstd_compress(bytes: &[u8]) -> Vec<u8> {
        zstd::bulk::compress(bytes, 19).expect("compress fixture")
    }

    #[test]
    fn rejects_non_zstd_prefix() {
        let data = vec![0u8; 16];
        assert_eq!(decode_candidate_default(&data, 0), Err(DecodeReason::NotZstd));
    }

    #[test]
    fn decodes_a_valid_json_object_frame() {
        let payload = br#"{"alphabetic": [], "special": []}"#;
        let frame = zstd_compress(payload);
        let decoded = decode_candidate_default(&frame, 0).expect("decode should succeed");
        assert_eq!(decoded.compressed_len, frame.len());
        assert!(decoded.json.is_object());
    }

    #[test]
    fn rejects_non_json_payload() {
        let frame = zstd_compress(b"not json at all");
        assert_eq!(decode_candidate_default(&frame, 0), Err(DecodeReason::NotJson));
    }

    #[test]
    fn rejects_json_array_payload() {
        let frame = zstd_compress(b"[1, 2, 3]");
        assert_eq!(decode_candidate_default(&frame, 0), Err(DecodeReason::NotJson));
    }

    #[test]
    fn rejects_payload_exceeding_safety_cap() {
        let payload = vec![b'a'; 1024];
        let wrapped = format!("\"{}\"", "a".repeat(1024));
        let frame = zstd_compress(wrapped.as_bytes());
        let _ = payload;
        assert_eq!(decode_candidate(&frame, 0, 8), Err(DecodeReason::TooLarge));
    }

    #[test]
    fn compressed_len_matches_exactly_when_trailing_bytes_follow() {
        let payload = br#"{"alphabetic": [], "special": []}"#;
        let mut frame = zstd_compress(payload);
        let real_len = frame.len();
        frame.extend_from_slice(&[0xAA; 32]); // unrelated trailing bytes
        let decoded = decode_candidate_default(&frame, 0).expect("decode should succeed");
        assert_eq!(decoded.compressed_len, real_len);
    }
}
