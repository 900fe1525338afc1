use std::fmt;

use crate::link::LinkId;

/// Which delimiter closed a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Closed by `MSG_END`.
    MsgEnd,
    /// Closed by `FTP_END`.
    FtpEnd,
}
impl MessageKind {
    /// The literal token terminating a frame of this kind.
    pub fn token(self) -> &'static str {
        match self {
            MessageKind::MsgEnd => "MSG_END",
            MessageKind::FtpEnd => "FTP_END",
        }
    }
}
impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A complete frame, ready for the message sink.
///
/// `payload` is percent-encoded; for `FtpEnd` frames it is the escaped buffer
/// with the encoded delimiter trimmed off its tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub link: LinkId,
    pub kind: MessageKind,
    pub payload: String,
}
