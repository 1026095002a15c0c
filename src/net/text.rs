//! Response body to text.
//!
//! The declared `Content-Type` charset wins when `encoding_rs` knows it and the
//! bytes decode cleanly. Otherwise the body goes through a descending fallback
//! chain: UTF-8, UTF-16, Latin-1, Latin-2, UTF-32.
//!
//! UTF-16 and UTF-32 are only attempted when the body starts with their
//! byte-order mark; without one almost any even-length byte string would "decode".

use encoding_rs::{Encoding, ISO_8859_2, UTF_16BE, UTF_16LE};
use http::header::CONTENT_TYPE;
use http::HeaderMap;

use crate::errors::NetError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16,
    Latin1,
    Latin2,
    Utf32,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16 => "UTF-16",
            TextEncoding::Latin1 => "ISO-8859-1",
            TextEncoding::Latin2 => "ISO-8859-2",
            TextEncoding::Utf32 => "UTF-32",
        }
    }

    /// Strict decode, `None` when the bytes are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextEncoding::Utf16 => decode_utf16(bytes),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Latin2 => ISO_8859_2
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            TextEncoding::Utf32 => decode_utf32(bytes),
        }
    }
}

pub const DEFAULT_FALLBACK: [TextEncoding; 5] = [
    TextEncoding::Utf8,
    TextEncoding::Utf16,
    TextEncoding::Latin1,
    TextEncoding::Latin2,
    TextEncoding::Utf32,
];

/// Decodes with the default fallback chain.
pub fn decode_text(bytes: &[u8]) -> Result<String, NetError> {
    decode_text_with(bytes, &DEFAULT_FALLBACK)
}

/// Decodes with the first encoding in `chain` that accepts the bytes.
pub fn decode_text_with(bytes: &[u8], chain: &[TextEncoding]) -> Result<String, NetError> {
    chain
        .iter()
        .find_map(|enc| enc.decode(bytes))
        .ok_or_else(|| {
            let tried = chain.iter().map(TextEncoding::name).collect::<Vec<_>>().join(", ");
            NetError::Decode(format!("body is not valid text in any of: {tried}"))
        })
}

/// Decodes a response body, honoring the declared charset first.
pub fn decode_response_body(headers: &HeaderMap, body: &[u8]) -> Result<String, NetError> {
    let declared = charset(headers).and_then(|label| Encoding::for_label(label.as_bytes()));

    if let Some(encoding) = declared {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            return Ok(text.into_owned());
        }
        log::debug!("body does not match declared charset {}, falling back", encoding.name());
    }

    decode_text(body)
}

/// Small, permissive `charset=` lookup in `Content-Type`.
fn charset(headers: &HeaderMap) -> Option<String> {
    let ct = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let idx = ct.to_ascii_lowercase().find("charset=")?;
    let after = &ct[idx + "charset=".len()..];
    let end = after.find([';', ' ', '\t']).unwrap_or(after.len());
    let value = after[..end].trim_matches('"');
    (!value.is_empty()).then(|| value.to_string())
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    // FF FE 00 00 is the UTF-32LE mark, leave it to that stage
    if bytes.starts_with(&[0xff, 0xfe, 0x00, 0x00]) || bytes.len() % 2 != 0 {
        return None;
    }
    let encoding = match bytes {
        [0xfe, 0xff, ..] => UTF_16BE,
        [0xff, 0xfe, ..] => UTF_16LE,
        _ => return None,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[2..])
        .map(|s| s.into_owned())
}

fn decode_utf32(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    let (big_endian, payload) = match bytes {
        [0x00, 0x00, 0xfe, 0xff, rest @ ..] => (true, rest),
        [0xff, 0xfe, 0x00, 0x00, rest @ ..] => (false, rest),
        _ => return None,
    };
    payload
        .chunks_exact(4)
        .map(|c| {
            let raw = [c[0], c[1], c[2], c[3]];
            let code = if big_endian { u32::from_be_bytes(raw) } else { u32::from_le_bytes(raw) };
            char::from_u32(code)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_comes_first() {
        assert_eq!(decode_text("caf\u{e9}".as_bytes()).unwrap(), "caf\u{e9}");
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // 0xE9 alone is not UTF-8, but is "é" in Latin-1
        assert_eq!(decode_text(b"caf\xe9").unwrap(), "caf\u{e9}");
    }

    #[test]
    fn utf16_needs_a_byte_order_mark() {
        let le = [0xff, 0xfe, b'h', 0x00, b'i', 0x00];
        assert_eq!(decode_text(&le).unwrap(), "hi");

        let be = [0xfe, 0xff, 0x00, b'h', 0x00, b'i'];
        assert_eq!(decode_text(&be).unwrap(), "hi");

        assert_eq!(TextEncoding::Utf16.decode(b"hi"), None);
    }

    #[test]
    fn utf32_with_byte_order_mark() {
        let le = [0xff, 0xfe, 0x00, 0x00, b'A', 0x00, 0x00, 0x00];
        assert_eq!(TextEncoding::Utf32.decode(&le).as_deref(), Some("A"));
        assert_eq!(TextEncoding::Utf16.decode(&le), None);

        let be = [0x00, 0x00, 0xfe, 0xff, 0x00, 0x00, 0x00, b'B'];
        assert_eq!(TextEncoding::Utf32.decode(&be).as_deref(), Some("B"));
    }

    #[test]
    fn latin2_decodes_its_own_letters() {
        // 0xB9 is "š" in ISO-8859-2
        assert_eq!(TextEncoding::Latin2.decode(&[0xb9]).as_deref(), Some("\u{161}"));
    }

    #[test]
    fn restricted_chain_reports_decode_error() {
        let err = decode_text_with(b"caf\xe9", &[TextEncoding::Utf8, TextEncoding::Utf16]).unwrap_err();
        match err {
            NetError::Decode(msg) => assert!(msg.contains("UTF-8, UTF-16"), "{msg}"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn declared_charset_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/html; charset=windows-1251".parse().unwrap());
        // 0xCF 0xF0 0xE8 is "При" in windows-1251
        assert_eq!(decode_response_body(&headers, &[0xcf, 0xf0, 0xe8]).unwrap(), "\u{41f}\u{440}\u{438}");
    }

    #[test]
    fn declared_utf8_mismatch_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/plain; charset=\"UTF-8\"".parse().unwrap());
        assert_eq!(decode_response_body(&headers, b"caf\xe9").unwrap(), "caf\u{e9}");
    }

    #[test]
    fn unknown_charset_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/plain; charset=klingon".parse().unwrap());
        assert_eq!(decode_response_body(&headers, b"plain").unwrap(), "plain");
    }
}
