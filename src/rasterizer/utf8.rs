//! UTF-8 to Unicode scalar value decoding with an all-or-nothing byte fallback.

use log::warn;

/// Replacement for bytes that cannot be shown in the fallback path.
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Decodes `bytes` as UTF-8.
///
/// If any part of the input is not valid UTF-8 the whole input is re-read one
/// byte at a time instead: printable ASCII bytes (`0x20..=0x7e`) stand for
/// themselves and every other byte becomes U+FFFD, so the result has exactly
/// one scalar per input byte.
pub fn decode_text(bytes: &[u8]) -> Vec<char> {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.chars().collect(),
        Err(error) => {
            warn!(
                "Text {:?} is not valid UTF-8 ({}); falling back to ASCII",
                String::from_utf8_lossy(bytes),
                error
            );
            bytes.iter().map(|&b| decode_fallback_byte(b)).collect()
        }
    }
}

fn decode_fallback_byte(byte: u8) -> char {
    if (0x20..=0x7e).contains(&byte) {
        byte as char
    } else {
        REPLACEMENT_CHARACTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn valid_utf8_decodes_to_its_scalars() {
        let text = "Crash: naïve 日本 🚀\t";
        assert_eq!(decode_text(text.as_bytes()), text.chars().collect::<Vec<_>>());
        assert!(decode_text(b"").is_empty());
    }

    #[test]
    fn decoded_scalars_reencode_to_the_original() {
        for text in ["OK", "ÅÄÖ", "\u{0}\u{7f}\u{10ffff}", "mixed ascii and ∑"] {
            let reencoded: String = decode_text(text.as_bytes()).into_iter().collect();
            assert_eq!(reencoded, text);
        }
    }

    #[test]
    fn invalid_utf8_falls_back_per_byte_for_the_whole_string() {
        // The valid "é" is not decoded once any byte is invalid.
        let bytes = b"A\xc3\xa9\xff\tz";
        let decoded = decode_text(bytes);
        assert_eq!(decoded.len(), bytes.len());
        assert_eq!(
            decoded,
            vec!['A', REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER, 'z']
        );
    }

    #[test]
    fn fallback_only_yields_printable_ascii_or_replacement() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let decoded = decode_text(&bytes);
        assert_eq!(decoded.len(), 256);
        for (byte, ch) in bytes.iter().zip(&decoded) {
            let printable = (0x20..=0x7e).contains(byte);
            assert!(
                (printable && *ch as u32 == *byte as u32) || (!printable && *ch == REPLACEMENT_CHARACTER),
                "byte {:#x} decoded to {:?}",
                byte,
                ch
            );
        }
    }

    #[test]
    fn truncated_sequence_triggers_fallback() {
        assert_eq!(decode_text(b"ab\xe2\x82"), vec!['a', 'b', REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER]);
    }
}
