//! Linkcom reassembles application messages that arrive over one or two serial
//! links, a **command** link and a **telemetry** link, and forwards them to a
//! message sink.
//!
//! Bytes arrive in chunks of arbitrary size. Each link has its own
//! [`FrameAssembler`] that accumulates the received text until one of the two
//! delimiter tokens shows up:
//!
//! * `MSG_END` closes a message whose payload is the percent-encoded text
//!   received since the previous frame, token removed,
//! * `FTP_END` closes a message whose payload is the percent-encoded text
//!   received since the previous frame, with the encoded token trimmed off its
//!   tail.
//!
//! Each link is read on its own thread by a [`LinkReader`], all readers of a
//! [`Session`] sharing a single cancellation controller. The read loops have
//! no natural end: they stop when the session is cancelled (a normal
//! shutdown) or when their transport times out or fails (reported, never
//! retried).
//!
//! The [`Station`] wraps a session into a small state machine used by the
//! command line tool. As for all state machines in this crate, transitions
//! between states are triggered by typed events and implemented with the
//! `From`/`Into` pattern, so only explicitly defined transitions compile.

mod cancel;
mod error;
mod framing;
mod link;
mod session;
mod settings;
mod sink;
mod station;
mod transport;

pub use cancel::{CancellationController, CancellationToken, CANCEL_POLL_MS};
pub use error::LinkError;
pub use framing::{escape, unescape, DecodedMessage, FrameAssembler, MessageKind};
pub use link::{LinkId, LinkReader, ReaderExit};
pub use session::{LinkReport, Session};
pub use settings::{DataBits, FlowControl, LinkSettings, Parity, SettingsBuilder, StopBits};
pub use sink::{ChannelSink, MessageSink};
pub use station::{Outgoing, Station};
pub use transport::{Connector, SerialConnector, SerialTransport, Transport, Utf8Stream};
