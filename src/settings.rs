//! Settings of one serial link: port parameters plus the limits applied by the
//! link reader.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values.

use std::{fmt, time::Duration};

pub use serialport::{DataBits, FlowControl, Parity, StopBits};

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings of a link and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LinkSettings {
    /// The port name, usually the device path.
    pub path: Option<String>,
    /// The baud rate in symbols-per-second.
    pub baud_rate: u32,
    /// Number of bits used to represent a character sent on the line.
    pub data_bits: DataBits,
    /// The handshake used for controlling data transfer.
    pub flow_control: FlowControl,
    /// The type of parity to use for error checking.
    pub parity: Parity,
    /// Number of bits to use to signal the end of a character.
    pub stop_bits: StopBits,

    /// How long a read may wait for the first byte. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// How long a write may block before giving up.
    pub write_timeout: Duration,
    /// Upper bound of bytes requested by a single read.
    pub chunk_size: usize,
    /// Largest frame accumulated while waiting for a delimiter.
    pub max_frame_len: usize,
    /// How many times opening the device is tried before giving up.
    pub open_attempts: usize,

    /// Restrict creation of `LinkSettings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}

/// Compact `baud-data-parity-stop` summary, e.g. `57600-8-None-One`.
impl fmt::Display for LinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:?}-{:?}",
            self.baud_rate,
            match self.data_bits {
                DataBits::Five => 5,
                DataBits::Six => 6,
                DataBits::Seven => 7,
                DataBits::Eight => 8,
            },
            self.parity,
            self.stop_bits
        )
    }
}

/// The builder for `LinkSettings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// use linkcom::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
/// assert_eq!(settings.to_string(), "57600-8-None-One");
/// ```
pub struct SettingsBuilder {
    settings: LinkSettings,
}
impl SettingsBuilder {
    /// Start building the settings using default values and no path for the
    /// port.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: LinkSettings {
                path: None,
                baud_rate: 57_600,
                data_bits: DataBits::Eight,
                flow_control: FlowControl::None,
                parity: Parity::None,
                stop_bits: StopBits::One,
                read_timeout: Some(Duration::from_millis(1000)),
                write_timeout: Duration::from_millis(1000),
                chunk_size: 1024,
                max_frame_len: 64 * 1024,
                open_attempts: 4,
                _private_use_builder: (),
            },
        }
    }

    /// Set the path to the serial port
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = Some(path.into().as_ref().to_owned());
        self
    }

    /// Set the baud rate in symbols-per-second
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.settings.baud_rate = baud_rate;
        self
    }

    /// Set the number of bits used to represent a character sent on the line
    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.settings.data_bits = data_bits;
        self
    }

    /// Set the handshake used for controlling data transfer
    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.settings.flow_control = flow_control;
        self
    }

    /// Set the type of parity to use for error checking
    pub fn parity(mut self, parity: Parity) -> Self {
        self.settings.parity = parity;
        self
    }

    /// Set the number of bits to use to signal the end of a character
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.settings.stop_bits = stop_bits;
        self
    }

    /// Set the read timeout; `None` lets a read wait for data indefinitely
    pub fn read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.settings.read_timeout = read_timeout;
        self
    }

    pub fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.settings.write_timeout = write_timeout;
        self
    }

    /// Set the maximum number of bytes requested per read. Zero is bumped to
    /// one so reads always make progress.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.settings.chunk_size = chunk_size.max(1);
        self
    }

    pub fn max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.settings.max_frame_len = max_frame_len;
        self
    }

    /// Set how many times opening the port is attempted (at least once)
    pub fn open_attempts(mut self, open_attempts: usize) -> Self {
        self.settings.open_attempts = open_attempts.max(1);
        self
    }

    pub fn finalize(self) -> LinkSettings {
        self.settings
    }
}
impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        LinkSettings {
            path: None,
            baud_rate: 57_600,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout: Some(Duration::from_millis(1000)),
            write_timeout: Duration::from_millis(1000),
            chunk_size: 1024,
            max_frame_len: 65_536,
            open_attempts: 4,
            _private_use_builder: (),
        }
    )
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
    assert_eq!(settings.path.unwrap(), "/dev/ttyUSB0");
}

#[test]
fn baud_rate() {
    let baud_rate = 9_600;
    let settings = SettingsBuilder::new().baud_rate(baud_rate).finalize();
    assert_eq!(settings.baud_rate, baud_rate);
}

#[test]
fn data_bits() {
    let data_bits = DataBits::Seven;
    let settings = SettingsBuilder::new().data_bits(data_bits).finalize();
    assert_eq!(settings.data_bits, data_bits);
}

#[test]
fn flow_control() {
    let flow_control = FlowControl::Hardware;
    let settings = SettingsBuilder::new().flow_control(flow_control).finalize();
    assert_eq!(settings.flow_control, flow_control);
}

#[test]
fn parity() {
    let parity = Parity::Even;
    let settings = SettingsBuilder::new().parity(parity).finalize();
    assert_eq!(settings.parity, parity);
}

#[test]
fn timeouts() {
    let settings = SettingsBuilder::new()
        .read_timeout(None)
        .write_timeout(Duration::from_millis(250))
        .finalize();
    assert_eq!(settings.read_timeout, None);
    assert_eq!(settings.write_timeout, Duration::from_millis(250));
}

#[test]
fn zero_sizes_are_clamped() {
    let settings = SettingsBuilder::new()
        .chunk_size(0)
        .open_attempts(0)
        .finalize();
    assert_eq!(settings.chunk_size, 1);
    assert_eq!(settings.open_attempts, 1);
}

#[test]
fn summary() {
    let settings = SettingsBuilder::new()
        .baud_rate(9_600)
        .stop_bits(StopBits::Two)
        .finalize();
    assert_eq!(settings.to_string(), "9600-8-None-Two");
}
