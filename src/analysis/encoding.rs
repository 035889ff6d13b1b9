//! Printable fingerprint encoding
//!
//! # Format
//!
//! ```text
//! <version: 2 hex><duration_frames: 8 hex><payload: URL-safe base64, no padding>
//! ```
//!
//! The payload packs each entry as:
//!
//! 1. time delta from the previous entry (the first from 0), unsigned LEB128
//! 2. hash, 3 bytes big-endian
//!
//! Entries are strictly increasing in `(time_offset, hash)`, so deltas are
//! never negative. An empty landmark stream has an empty payload.
//!
//! Encoding is canonical: decoding a code and encoding it again reproduces
//! the same string, and every non-canonical input is rejected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::result::{CodeEntry, FingerprintCode};
use crate::error::FingerprintError;

/// Bytes used for each hash in the payload
pub const HASH_BYTES: usize = 3;

/// Largest hash the payload can carry
pub const MAX_ENCODED_HASH: u32 = (1 << (8 * HASH_BYTES)) - 1;

/// Header length in characters
pub const HEADER_LEN: usize = 10;

/// Longest LEB128 encoding of a `u32`
const MAX_VARINT_BYTES: usize = 5;

/// Render a code as `<version><duration><payload>`
pub fn encode(code: &FingerprintCode) -> String {
    let payload = pack_entries(code.entries());
    let mut out = String::with_capacity(HEADER_LEN + payload.len() * 4 / 3 + 4);
    out.push_str(&format!("{:02x}{:08x}", code.version(), code.duration_frames()));
    URL_SAFE_NO_PAD.encode_string(&payload, &mut out);
    out
}

/// Parse a string produced by [`encode`]
pub fn decode(text: &str) -> Result<FingerprintCode, FingerprintError> {
    let malformed = |msg: String| FingerprintError::MalformedCode(msg);

    let header = text
        .get(..HEADER_LEN)
        .ok_or_else(|| malformed(format!("Code shorter than {}-character header", HEADER_LEN)))?;

    if !header
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(malformed(format!("Header {:?} is not lowercase hex", header)));
    }

    let version = u8::from_str_radix(&header[..2], 16)
        .map_err(|e| malformed(format!("Bad version field: {}", e)))?;
    let duration_frames = u32::from_str_radix(&header[2..], 16)
        .map_err(|e| malformed(format!("Bad duration field: {}", e)))?;

    let payload = URL_SAFE_NO_PAD
        .decode(&text[HEADER_LEN..])
        .map_err(|e| malformed(format!("Bad payload alphabet: {}", e)))?;

    let entries = unpack_entries(&payload)?;

    FingerprintCode::from_sorted_entries(version, duration_frames, entries)
        .map_err(|e| malformed(e.to_string()))
}

/// Pack sorted entries into the binary payload
///
/// `entries` must be strictly increasing, as every [`FingerprintCode`] is.
pub fn pack_entries(entries: &[CodeEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * (HASH_BYTES + 1));
    let mut previous = 0u32;

    for entry in entries {
        write_varint(&mut out, entry.time_offset - previous);
        out.extend_from_slice(&entry.hash.to_be_bytes()[4 - HASH_BYTES..]);
        previous = entry.time_offset;
    }

    out
}

/// Unpack a binary payload into entries
///
/// # Errors
///
/// Returns `MalformedCode` on truncation, non-minimal varints, time overflow,
/// or entries that are not strictly increasing.
pub fn unpack_entries(payload: &[u8]) -> Result<Vec<CodeEntry>, FingerprintError> {
    let mut entries: Vec<CodeEntry> = Vec::new();
    let mut pos = 0;
    let mut time_offset = 0u32;

    while pos < payload.len() {
        let (delta, used) = read_varint(&payload[pos..])?;
        pos += used;

        let hash_bytes = payload.get(pos..pos + HASH_BYTES).ok_or_else(|| {
            FingerprintError::MalformedCode(format!("Truncated hash at byte {}", pos))
        })?;
        pos += HASH_BYTES;

        let hash = hash_bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);

        time_offset = time_offset.checked_add(delta).ok_or_else(|| {
            FingerprintError::MalformedCode("Time offset overflows 32 bits".to_string())
        })?;

        let entry = CodeEntry { time_offset, hash };
        if let Some(last) = entries.last() {
            if *last >= entry {
                return Err(FingerprintError::MalformedCode(format!(
                    "Entry {:?} does not follow {:?}",
                    entry, last
                )));
            }
        }
        entries.push(entry);
    }

    Ok(entries)
}

fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn read_varint(bytes: &[u8]) -> Result<(u32, usize), FingerprintError> {
    let mut value = 0u64;

    for (i, &byte) in bytes.iter().enumerate().take(MAX_VARINT_BYTES) {
        value |= ((byte & 0x7f) as u64) << (7 * i);

        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(FingerprintError::MalformedCode(
                    "Non-minimal varint".to_string(),
                ));
            }
            let value = u32::try_from(value).map_err(|_| {
                FingerprintError::MalformedCode("Varint overflows 32 bits".to_string())
            })?;
            return Ok((value, i + 1));
        }
    }

    Err(FingerprintError::MalformedCode(
        "Truncated or oversized varint".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time_offset: u32, hash: u32) -> CodeEntry {
        CodeEntry { time_offset, hash }
    }

    fn code(entries: Vec<CodeEntry>) -> FingerprintCode {
        FingerprintCode::from_sorted_entries(1, 300, entries).unwrap()
    }

    #[test]
    fn test_empty_code_is_header_only() {
        let text = encode(&code(vec![]));
        assert_eq!(text, "010000012c");
        assert_eq!(decode(&text).unwrap(), code(vec![]));
    }

    #[test]
    fn test_payload_layout() {
        let payload = pack_entries(&[entry(2, 0x0a0b0c), entry(200, 0x000001)]);
        // delta 2 | hash | delta 198 as two-byte varint | hash
        assert_eq!(
            payload,
            vec![0x02, 0x0a, 0x0b, 0x0c, 0xc6, 0x01, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn test_reencoding_is_identical() {
        let original = code(vec![
            entry(0, 17),
            entry(0, 0xfffff),
            entry(5, 3),
            entry(130, 99),
            entry(70_000, 12),
        ]);
        let text = encode(&original);
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(encode(&decoded), text);
    }

    #[test]
    fn test_output_is_printable() {
        let text = encode(&code(vec![entry(1, 0xfffff), entry(9, 0x12345)]));
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(matches!(decode("01"), Err(FingerprintError::MalformedCode(_))));
        assert!(matches!(
            decode("0G0000012c"),
            Err(FingerprintError::MalformedCode(_))
        ));
        assert!(matches!(
            decode("01+000012c"),
            Err(FingerprintError::MalformedCode(_))
        ));
        // Uppercase hex would not re-encode identically
        assert!(matches!(
            decode("010000012C"),
            Err(FingerprintError::MalformedCode(_))
        ));
    }

    #[test]
    fn test_rejects_bad_payload() {
        // Padding and foreign alphabet
        assert!(decode("010000012cAA==").is_err());
        assert!(decode("010000012c+/").is_err());

        // Truncated hash
        let truncated = URL_SAFE_NO_PAD.encode([0x01u8, 0x02]);
        assert!(decode(&format!("010000012c{}", truncated)).is_err());

        // Non-minimal varint
        let padded = URL_SAFE_NO_PAD.encode([0x81u8, 0x00, 0x00, 0x00, 0x01]);
        assert!(decode(&format!("010000012c{}", padded)).is_err());

        // Duplicate entry (delta 0, same hash)
        let dup = URL_SAFE_NO_PAD.encode([0x01u8, 0, 0, 5, 0x00, 0, 0, 5]);
        assert!(decode(&format!("010000012c{}", dup)).is_err());
    }

    #[test]
    fn test_varint_round_trip_boundaries() {
        for value in [0u32, 1, 127, 128, 16_383, 16_384, u32::MAX] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            let (decoded, used) = read_varint(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(used, buf.len());
        }
    }
}
