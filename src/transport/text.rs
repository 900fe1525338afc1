//! Streaming UTF-8 decoding of serial reads.

/// Turns arbitrarily split byte chunks into text.
///
/// A multi-byte sequence cut by a read boundary is held back until the rest of
/// it arrives. Bytes that can never form valid UTF-8 become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Stream {
    pending: Vec<u8>,
}

impl Utf8Stream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, prefixed by whatever was held back last time.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut text = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        text.push_str(valid);
                    }
                    match err.error_len() {
                        Some(bad) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        // Incomplete sequence at the end, wait for more.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let consumed = self.pending.len() - rest.len();
        self.pending.drain(..consumed);
        text
    }

    /// Number of bytes held back.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let mut stream = Utf8Stream::new();
        assert_eq!(stream.decode(b"MSG_END"), "MSG_END");
        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn split_sequence_is_held_back() {
        let mut stream = Utf8Stream::new();
        let bytes = "a°b".as_bytes();
        assert_eq!(stream.decode(&bytes[..2]), "a");
        assert_eq!(stream.pending(), 1);
        assert_eq!(stream.decode(&bytes[2..]), "°b");
        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut stream = Utf8Stream::new();
        assert_eq!(stream.decode(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn reset_drops_pending_bytes() {
        let mut stream = Utf8Stream::new();
        stream.decode(&"é".as_bytes()[..1]);
        stream.reset();
        assert_eq!(stream.decode(b"x"), "x");
    }
}
