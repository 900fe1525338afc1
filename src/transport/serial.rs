//! Serial port transport.

use std::{
    fmt,
    io::{self, Read, Write},
    time::{Duration, Instant},
};

use log::{debug, info, log_enabled, trace, Level::Trace};
use serialport::SerialPort;

use super::{Connector, Transport, Utf8Stream};
use crate::{
    cancel::{CancellationToken, CANCEL_POLL_MS},
    error::LinkError,
    settings::LinkSettings,
};

//==============================================================================
// Public Interface
//==============================================================================

/// Opens serial devices with `serialport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(&self, settings: &LinkSettings) -> Result<Box<dyn Transport>, LinkError> {
        let mut transport = SerialTransport::open(settings)?;
        transport.configure(settings)?;
        Ok(Box::new(transport))
    }
}

/// A serial port carrying UTF-8 text.
///
/// Reads wait in slices of [`CANCEL_POLL_MS`] so that a pending read notices
/// cancellation quickly, while the configured read timeout still bounds the
/// total wait.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    decoder: Utf8Stream,
    read_timeout: Option<Duration>,
    write_timeout: Duration,
}

impl SerialTransport {
    /// Open the port named in `settings`, retrying with a fixed one second
    /// delay up to `settings.open_attempts` times.
    pub fn open(settings: &LinkSettings) -> Result<Self, LinkError> {
        use retry::{delay, retry_with_index};

        let path = settings
            .path
            .clone()
            .ok_or_else(|| LinkError::Configuration("no device path given".into()))?;

        let result = retry_with_index(
            delay::Fixed::from_millis(1000).take(settings.open_attempts.saturating_sub(1)),
            |index| -> Result<Box<dyn SerialPort>, serialport::Error> {
                debug!("Trying to open {} ({})", path, index);
                serialport::new(&path, settings.baud_rate)
                    .data_bits(settings.data_bits)
                    .stop_bits(settings.stop_bits)
                    .parity(settings.parity)
                    .flow_control(settings.flow_control)
                    .timeout(poll_slice(settings.read_timeout))
                    .open()
            },
        );

        match result {
            Ok(port) => {
                info!("Opened {} at {} baud", path, settings.baud_rate);
                Ok(SerialTransport::from_port(port, settings))
            }
            Err(retry::Error::Operation {
                error,
                total_delay,
                tries,
            }) => {
                info!(
                    "Failed to open {} after {:?} and {} tries: {}",
                    path, total_delay, tries, error,
                );
                Err(error.into())
            }
            Err(retry::Error::Internal(reason)) => {
                info!("Internal retry error while opening {}: {}", path, reason);
                Err(LinkError::Transport(io::Error::new(
                    io::ErrorKind::Other,
                    "internal error while retrying to open the port",
                )))
            }
        }
    }

    /// Wrap an already open port.
    pub fn from_port(port: Box<dyn SerialPort>, settings: &LinkSettings) -> Self {
        SerialTransport {
            port: Some(port),
            decoder: Utf8Stream::new(),
            read_timeout: settings.read_timeout,
            write_timeout: settings.write_timeout,
        }
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, LinkError> {
        self.port.as_mut().ok_or_else(|| {
            LinkError::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial port is closed",
            ))
        })
    }
}

impl Transport for SerialTransport {
    fn configure(&mut self, settings: &LinkSettings) -> Result<(), LinkError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| LinkError::Configuration("serial port is closed".into()))?;

        // `serialport` does not always apply the builder values on `open`.
        port.set_baud_rate(settings.baud_rate)?;
        port.set_data_bits(settings.data_bits)?;
        port.set_stop_bits(settings.stop_bits)?;
        port.set_parity(settings.parity)?;
        port.set_flow_control(settings.flow_control)?;
        port.set_timeout(poll_slice(settings.read_timeout))?;

        let applied = port.baud_rate()?;
        if applied != settings.baud_rate {
            return Err(LinkError::Configuration(format!(
                "baud rate {} was not accepted (port runs at {})",
                settings.baud_rate, applied
            )));
        }

        debug!("data_bits    : {:#?}", port.data_bits()?);
        debug!("stop_bits    : {:#?}", port.stop_bits()?);
        debug!("parity       : {:#?}", port.parity()?);
        debug!("flow control : {:#?}", port.flow_control()?);

        self.read_timeout = settings.read_timeout;
        self.write_timeout = settings.write_timeout;
        Ok(())
    }

    fn read(&mut self, max_bytes: usize, cancel: &CancellationToken) -> Result<String, LinkError> {
        let deadline = self.read_timeout.map(|timeout| Instant::now() + timeout);
        let slice = poll_slice(self.read_timeout);
        let mut buf = vec![0u8; max_bytes.max(1)];

        self.port()?.set_timeout(slice)?;
        loop {
            cancel.check()?;

            let received = self.port()?.read(buf.as_mut_slice());
            match received {
                Ok(0) => {}
                Ok(n) => {
                    // Dump the received data in a hex table for debugging
                    if log_enabled!(Trace) {
                        let view = hexplay::HexViewBuilder::new(&buf[..n])
                            .address_offset(0)
                            .row_width(16)
                            .finish();
                        trace!("read {} bytes\n{}", n, view);
                    }
                    let text = self.decoder.decode(&buf[..n]);
                    if !text.is_empty() {
                        return Ok(text);
                    }
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(err) => return Err(LinkError::Transport(err)),
            }

            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                return Err(LinkError::Timeout);
            }
        }
    }

    fn write(&mut self, text: &str) -> Result<usize, LinkError> {
        let timeout = self.write_timeout;
        let port = self.port()?;
        port.set_timeout(timeout)?;
        port.write_all(text.as_bytes())?;
        port.flush()?;
        trace!("{} bytes written", text.len());
        Ok(text.len())
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            debug!("Closing {}", port.name().unwrap_or_default());
        }
        self.decoder.reset();
    }

    fn detach(&mut self) {
        self.decoder.reset();
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>, LinkError> {
        let port = self
            .port
            .as_ref()
            .ok_or_else(|| LinkError::Configuration("serial port is closed".into()))?
            .try_clone()?;
        Ok(Box::new(SerialTransport {
            port: Some(port),
            decoder: Utf8Stream::new(),
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }))
    }
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) => debug_fmt_serialport!(port, f).finish(),
            None => f.debug_tuple("SerialTransport").field(&"closed").finish(),
        }
    }
}

//==============================================================================
// Private stuff
//==============================================================================

/// Port timeout used for each blocking read while waiting for data.
fn poll_slice(read_timeout: Option<Duration>) -> Duration {
    let poll = Duration::from_millis(CANCEL_POLL_MS);
    match read_timeout {
        Some(timeout) if timeout < poll && timeout > Duration::from_millis(0) => timeout,
        _ => poll,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsBuilder;

    #[test]
    fn poll_slice_is_bounded_by_read_timeout() {
        assert_eq!(poll_slice(None), Duration::from_millis(CANCEL_POLL_MS));
        assert_eq!(
            poll_slice(Some(Duration::from_millis(1000))),
            Duration::from_millis(CANCEL_POLL_MS)
        );
        assert_eq!(
            poll_slice(Some(Duration::from_millis(10))),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn opening_without_path_is_a_configuration_error() {
        let settings = SettingsBuilder::new().finalize();
        match SerialConnector.open(&settings) {
            Err(LinkError::Configuration(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
