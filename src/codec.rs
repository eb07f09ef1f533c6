//! Hex rendering of tag memory, and trimming of zero-filled reads.

use crate::error::TagError;

/// Renders bytes as `0x` followed by two lowercase hex digits per byte.
///
/// Returns `None` when there is nothing to render, so an absent read and an
/// empty one look the same to the report builders.
pub fn bytes_to_hex(bytes: Option<&[u8]>) -> Option<String> {
    match bytes {
        Some(bytes) if !bytes.is_empty() => Some(format!("0x{}", hex::encode(bytes))),
        _ => None,
    }
}

/// Parses a hex string, with or without a `0x` prefix.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, TagError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|err| TagError::InvalidKey(format!("{digits:?}: {err}")))
}

/// Drops the zero bytes at the end of a fixed-width read.
pub fn trim_trailing_zeros(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_prefixed_and_lowercase() {
        assert_eq!(bytes_to_hex(Some(&[0x0A, 0xFF][..])).as_deref(), Some("0x0aff"));
        assert_eq!(bytes_to_hex(Some(&[0x00][..])).as_deref(), Some("0x00"));
    }

    #[test]
    fn empty_or_missing_input_has_no_hex() {
        assert_eq!(bytes_to_hex(Some(&[][..])), None);
        assert_eq!(bytes_to_hex(None), None);
    }

    #[test]
    fn hex_parses_with_or_without_prefix() {
        assert_eq!(hex_to_bytes("0x0aff").unwrap(), vec![0x0A, 0xFF]);
        assert_eq!(hex_to_bytes("A0a1").unwrap(), vec![0xA0, 0xA1]);
        assert!(matches!(hex_to_bytes("0xzz"), Err(TagError::InvalidKey(_))));
    }

    #[test]
    fn trailing_zeros_are_removed() {
        let data = b"hi";
        for padding in 0..6 {
            let mut padded = data.to_vec();
            padded.extend(std::iter::repeat(0).take(padding));
            assert_eq!(trim_trailing_zeros(&padded), data);
        }
    }

    #[test]
    fn inner_zeros_survive_trimming() {
        assert_eq!(trim_trailing_zeros(&[1, 0, 2, 0, 0]), &[1, 0, 2]);
        assert_eq!(trim_trailing_zeros(&[0, 0, 0, 0]), &[] as &[u8]);
        assert_eq!(trim_trailing_zeros(&[]), &[] as &[u8]);
    }
}
