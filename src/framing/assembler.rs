use log::{debug, trace};

use super::{escape, DecodedMessage, MessageKind};
use crate::{error::LinkError, link::LinkId};

/// Reassembles delimited frames out of the text chunks read on one link.
///
/// Two buffers are kept in lock-step: `raw` holds the text received since the
/// last flush, `escaped` holds the concatenation of the percent-encoded
/// chunks. The search for a delimiter always runs over the whole `raw` buffer
/// so tokens split across reads are found once their last piece arrives.
///
/// At most one message is produced per chunk. When both tokens are present,
/// `MSG_END` wins.
#[derive(Debug)]
pub struct FrameAssembler {
    link: LinkId,
    raw: String,
    escaped: String,
    max_frame_len: usize,
    /// Encoded length of `FTP_END` as it appears at the tail of `escaped`.
    ftp_trim: usize,
}

impl FrameAssembler {
    pub fn new(link: LinkId, max_frame_len: usize) -> Self {
        FrameAssembler {
            link,
            raw: String::new(),
            escaped: String::new(),
            max_frame_len,
            ftp_trim: escape(MessageKind::FtpEnd.token()).len(),
        }
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    /// Text received since the last flush.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Escaped counterpart of [`raw`](Self::raw).
    pub fn escaped(&self) -> &str {
        &self.escaped
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.escaped.is_empty()
    }

    /// Discard any partially accumulated frame.
    pub fn clear(&mut self) {
        self.raw.clear();
        self.escaped.clear();
    }

    /// Feed one chunk of received text.
    ///
    /// Returns the completed message, if this chunk closed one. When no
    /// delimiter is present and the buffered frame outgrows the configured
    /// maximum, the partial frame is dropped and `FrameTooLarge` is returned.
    pub fn push(&mut self, chunk: &str) -> Result<Option<DecodedMessage>, LinkError> {
        if chunk.is_empty() {
            return Ok(None);
        }
        self.raw.push_str(chunk);
        self.escaped.push_str(&escape(chunk));
        trace!(
            "[{}] +{} bytes, {} buffered",
            self.link,
            chunk.len(),
            self.raw.len()
        );

        let msg_end = MessageKind::MsgEnd.token();
        let ftp_end = MessageKind::FtpEnd.token();

        let message = if self.raw.contains(msg_end) {
            let payload = escape(&self.raw.replace(msg_end, ""));
            Some(self.flush(MessageKind::MsgEnd, payload))
        } else if self.raw.contains(ftp_end) {
            let keep = self.escaped.len().saturating_sub(self.ftp_trim);
            // `escaped` only holds ASCII, any byte offset is a char boundary.
            let payload = self.escaped[..keep].to_owned();
            Some(self.flush(MessageKind::FtpEnd, payload))
        } else {
            None
        };

        if message.is_none() && self.raw.len() > self.max_frame_len {
            let len = self.raw.len();
            self.clear();
            return Err(LinkError::FrameTooLarge {
                link: self.link,
                len,
                max: self.max_frame_len,
            });
        }
        Ok(message)
    }

    fn flush(&mut self, kind: MessageKind, payload: String) -> DecodedMessage {
        debug!("[{}] {} frame, {} bytes", self.link, kind, payload.len());
        self.clear();
        DecodedMessage {
            link: self.link,
            kind,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::unescape;

    fn feed(assembler: &mut FrameAssembler, chunks: &[&str]) -> Vec<DecodedMessage> {
        chunks
            .iter()
            .filter_map(|chunk| assembler.push(chunk).unwrap())
            .collect()
    }

    fn assembler() -> FrameAssembler {
        FrameAssembler::new(LinkId::Command, 1024)
    }

    #[test]
    fn msg_end_over_three_chunks() {
        let mut asm = assembler();
        let messages = feed(&mut asm, &["AB", "C", "MSG_END"]);
        assert_eq!(
            messages,
            vec![DecodedMessage {
                link: LinkId::Command,
                kind: MessageKind::MsgEnd,
                payload: "ABC".into(),
            }]
        );
        assert!(asm.is_empty());
    }

    #[test]
    fn ftp_end_trims_the_encoded_token() {
        let mut asm = FrameAssembler::new(LinkId::Telemetry, 1024);
        let messages = feed(&mut asm, &["X=1&Y=2FTP_END"]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].link, LinkId::Telemetry);
        assert_eq!(messages[0].kind, MessageKind::FtpEnd);
        assert_eq!(messages[0].payload, "X%3D1%26Y%3D2");
        assert!(asm.is_empty());
    }

    #[test]
    fn split_token_matches_single_chunk() {
        let split = feed(&mut assembler(), &["hello world MSG_E", "ND"]);
        let whole = feed(&mut assembler(), &["hello world MSG_END"]);
        assert_eq!(split, whole);
        assert_eq!(split[0].payload, "hello%20world%20");
    }

    #[test]
    fn split_ftp_token_matches_single_chunk() {
        let split = feed(&mut assembler(), &["a&b", "FT", "P_E", "ND"]);
        let whole = feed(&mut assembler(), &["a&bFTP_END"]);
        assert_eq!(split, whole);
        assert_eq!(split[0].payload, "a%26b");
    }

    #[test]
    fn no_delimiter_keeps_buffering() {
        let mut asm = assembler();
        let messages = feed(&mut asm, &["MSG", "_EN", " FTP_", "EN", "msg_end"]);
        assert!(messages.is_empty());
        assert_eq!(asm.raw(), "MSG_EN FTP_ENmsg_end");
        assert!(!asm.is_empty());
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut asm = assembler();
        assert_eq!(asm.push("").unwrap(), None);
        assert!(asm.is_empty());
        asm.push("abc").unwrap();
        assert_eq!(asm.push("").unwrap(), None);
        assert_eq!(asm.raw(), "abc");
    }

    #[test]
    fn escaped_tracks_raw() {
        let mut asm = assembler();
        feed(&mut asm, &["a b", "&c"]);
        assert_eq!(asm.escaped(), escape(asm.raw()));
    }

    #[test]
    fn msg_end_payload_round_trips() {
        let text = "temp=21.5°C; status=\"ok\" / 100%";
        let mut asm = assembler();
        let (a, b) = text.split_at(9);
        let messages = feed(&mut asm, &[a, b, "MSG_END"]);
        assert_eq!(unescape(&messages[0].payload).unwrap(), text);
    }

    #[test]
    fn msg_end_strips_every_occurrence() {
        let messages = feed(&mut assembler(), &["aMSG_ENDbMSG_END"]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload, "ab");
    }

    #[test]
    fn msg_end_wins_over_ftp_end() {
        let messages = feed(&mut assembler(), &["aFTP_ENDbMSG_END"]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::MsgEnd);
        assert_eq!(messages[0].payload, "aFTP_ENDb");
    }

    #[test]
    fn buffers_reset_between_frames() {
        let mut asm = assembler();
        let messages = feed(&mut asm, &["one MSG_END", "x=2", "FTP_END"]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].payload, "one%20");
        assert_eq!(messages[1].kind, MessageKind::FtpEnd);
        assert_eq!(messages[1].payload, "x%3D2");
    }

    #[test]
    fn oversized_frame_is_dropped() {
        let mut asm = FrameAssembler::new(LinkId::Telemetry, 8);
        assert_eq!(asm.push("12345").unwrap(), None);
        match asm.push("6789") {
            Err(LinkError::FrameTooLarge { link, len, max }) => {
                assert_eq!(link, LinkId::Telemetry);
                assert_eq!(len, 9);
                assert_eq!(max, 8);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(asm.is_empty());

        // The next frame starts clean.
        assert_eq!(asm.push("okMSG_END").unwrap().unwrap().payload, "ok");
    }

    #[test]
    fn delimited_frame_above_cap_still_flushes() {
        let mut asm = FrameAssembler::new(LinkId::Command, 4);
        let message = asm.push("abcdefMSG_END").unwrap().unwrap();
        assert_eq!(message.payload, "abcdef");
    }

    #[test]
    fn clear_discards_partial_frame() {
        let mut asm = assembler();
        asm.push("partial").unwrap();
        asm.clear();
        assert!(asm.is_empty());
        assert_eq!(asm.push("MSG_END").unwrap().unwrap().payload, "");
    }
}
