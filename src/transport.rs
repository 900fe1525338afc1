//! The device side of a link.
//!
//! The framing core only relies on the [`Transport`] trait: partial,
//! cancellable reads of already decoded text, blocking writes and an
//! idempotent close. [`SerialConnector`] opens real serial ports through the
//! `serialport` crate; tests plug in scripted transports.

#[macro_use]
mod macros;

mod serial;
mod text;

use std::fmt;

pub use serial::{SerialConnector, SerialTransport};
pub use text::Utf8Stream;

use crate::{cancel::CancellationToken, error::LinkError, settings::LinkSettings};

/// One open channel.
pub trait Transport: Send + fmt::Debug {
    /// Apply port parameters and timeouts.
    ///
    /// Fails with [`LinkError::Configuration`] if the channel is closed or the
    /// driver rejects a value.
    fn configure(&mut self, settings: &LinkSettings) -> Result<(), LinkError>;

    /// Wait for data and return whatever is available, at most `max_bytes`.
    ///
    /// Returns as soon as any text is available. Fails with
    /// [`LinkError::Cancelled`] once `cancel` is set, including while already
    /// waiting, and with [`LinkError::Timeout`] when the configured read
    /// timeout elapses first.
    fn read(&mut self, max_bytes: usize, cancel: &CancellationToken) -> Result<String, LinkError>;

    /// Queue `text` for sending, returning the number of bytes written.
    fn write(&mut self, text: &str) -> Result<usize, LinkError>;

    /// Release the channel. Calling it again does nothing.
    fn close(&mut self);

    /// Drop any streaming decode state held for the current reader.
    fn detach(&mut self) {}

    /// Another handle on the same channel, used for writing while a reader
    /// owns this one.
    fn try_clone(&self) -> Result<Box<dyn Transport>, LinkError>;
}

/// Opens channels from their settings.
pub trait Connector: Send + Sync {
    /// Open the device at `settings.path` and configure it.
    fn open(&self, settings: &LinkSettings) -> Result<Box<dyn Transport>, LinkError>;
}
