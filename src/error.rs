//! Errors raised while opening, configuring and reading the serial links.

use std::io;

use thiserror::Error;

use crate::link::LinkId;

/// Everything that can go wrong on a link.
///
/// `Cancelled` is not really a failure: it is how a read observes that the
/// session is shutting down. The [`LinkReader`](crate::LinkReader) turns it
/// into a normal exit.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Bad port settings, a missing device path, or a channel that was
    /// already closed when configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A read or write exceeded its configured deadline.
    #[error("operation timed out")]
    Timeout,

    /// The session cancellation token was set.
    #[error("operation was cancelled")]
    Cancelled,

    /// Hardware or driver failure on the link.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// No delimiter arrived before the accumulated frame outgrew its cap.
    #[error("frame on {link} link exceeded {max} bytes ({len} buffered)")]
    FrameTooLarge { link: LinkId, len: usize, max: usize },

    /// Operation on a link that is not part of the session, or whose
    /// transport was closed.
    #[error("{0} link is not connected")]
    NotConnected(LinkId),
}

impl LinkError {
    /// `true` for the expected shutdown path.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LinkError::Cancelled)
    }
}

impl From<io::Error> for LinkError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => LinkError::Timeout,
            io::ErrorKind::InvalidInput => LinkError::Configuration(err.to_string()),
            _ => LinkError::Transport(err),
        }
    }
}

impl From<serialport::Error> for LinkError {
    fn from(err: serialport::Error) -> Self {
        match err.kind {
            serialport::ErrorKind::InvalidInput => LinkError::Configuration(err.description),
            serialport::ErrorKind::NoDevice => LinkError::Transport(io::Error::new(
                io::ErrorKind::NotFound,
                err.description,
            )),
            serialport::ErrorKind::Io(io::ErrorKind::TimedOut) => LinkError::Timeout,
            serialport::ErrorKind::Io(kind) => {
                LinkError::Transport(io::Error::new(kind, err.description))
            }
            serialport::ErrorKind::Unknown => {
                LinkError::Transport(io::Error::new(io::ErrorKind::Other, err.description))
            }
        }
    }
}
