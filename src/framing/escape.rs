//! Percent-encoding of message payloads.
//!
//! Only the RFC 3986 unreserved characters (`A-Z a-z 0-9 - . _ ~`) are left
//! as-is, everything else is written as `%XX` of its UTF-8 bytes with
//! upper-case hex digits. Consumers of the sink decode payloads with this exact
//! alphabet, so it must not change.

use std::str::Utf8Error;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

const DATA: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `text`.
pub fn escape(text: &str) -> String {
    utf8_percent_encode(text, DATA).to_string()
}

/// Undo [`escape`].
pub fn unescape(text: &str) -> Result<String, Utf8Error> {
    percent_decode_str(text)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
}
