use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use log::{debug, info, warn};

use super::LinkId;
use crate::{
    cancel::CancellationToken, error::LinkError, framing::FrameAssembler,
    settings::LinkSettings, sink::MessageSink, transport::Transport,
};

/// How a read loop ended.
#[derive(Debug)]
pub enum ReaderExit {
    /// The session was cancelled. This is the normal way to stop reading.
    Cancelled,
    /// The transport timed out or failed. Reading is not retried.
    Failed(LinkError),
}
impl ReaderExit {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReaderExit::Failed(_))
    }
}
impl fmt::Display for ReaderExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderExit::Cancelled => {
                f.write_str("reading was cancelled, closing device and cleaning up")
            }
            ReaderExit::Failed(err) => write!(f, "reading stopped: {}", err),
        }
    }
}

/// Drives one link: reads from its transport, feeds the frame assembler and
/// hands completed messages to the sink.
///
/// The loop has no natural end. It stops when the session is cancelled or
/// when the transport fails, see [`ReaderExit`].
pub struct LinkReader {
    link: LinkId,
    transport: Box<dyn Transport>,
    assembler: FrameAssembler,
    sink: Arc<dyn MessageSink>,
    cancel: CancellationToken,
    chunk_size: usize,
}

impl LinkReader {
    pub fn new(
        link: LinkId,
        transport: Box<dyn Transport>,
        settings: &LinkSettings,
        sink: Arc<dyn MessageSink>,
        cancel: CancellationToken,
    ) -> Self {
        LinkReader {
            link,
            transport,
            assembler: FrameAssembler::new(link, settings.max_frame_len),
            sink,
            cancel,
            chunk_size: settings.chunk_size,
        }
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    /// Partially accumulated frame, if any.
    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    /// Read until cancelled or until the transport fails.
    ///
    /// Whatever the outcome, the transport's decode state is detached before
    /// this returns.
    pub fn run(&mut self) -> ReaderExit {
        let LinkReader {
            link,
            transport,
            assembler,
            sink,
            cancel,
            chunk_size,
        } = self;
        let link = *link;
        let mut port = Attached::new(&mut **transport);

        info!("[{}] listening", link);
        loop {
            if cancel.is_cancelled() {
                return ReaderExit::Cancelled;
            }

            let chunk = match port.read(*chunk_size, cancel) {
                Ok(chunk) => chunk,
                Err(LinkError::Cancelled) => {
                    debug!("[{}] read cancelled", link);
                    return ReaderExit::Cancelled;
                }
                Err(err) => {
                    warn!("[{}] read failed: {}", link, err);
                    return ReaderExit::Failed(err);
                }
            };
            if chunk.is_empty() {
                continue;
            }

            match assembler.push(&chunk) {
                Ok(Some(message)) => sink.deliver(message),
                Ok(None) => {}
                Err(err) => warn!("[{}] {}, partial frame dropped", link, err),
            }
        }
    }

    /// Release the transport.
    pub fn close(&mut self) {
        self.transport.close();
    }
}

impl fmt::Debug for LinkReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkReader")
            .field("link", &self.link)
            .field("transport", &self.transport)
            .field("buffered", &self.assembler.raw().len())
            .finish()
    }
}

/// Keeps the transport's decoder attached for the duration of a read loop.
struct Attached<'t> {
    transport: &'t mut dyn Transport,
}
impl<'t> Attached<'t> {
    fn new(transport: &'t mut dyn Transport) -> Self {
        Attached { transport }
    }
}
impl<'t> Deref for Attached<'t> {
    type Target = dyn Transport + 't;
    fn deref(&self) -> &Self::Target {
        &*self.transport
    }
}
impl<'t> DerefMut for Attached<'t> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.transport
    }
}
impl Drop for Attached<'_> {
    fn drop(&mut self) {
        self.transport.detach();
    }
}
