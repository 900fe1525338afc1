//! Link identity and the per-link read loop.

mod reader;

use std::fmt;

pub use reader::{LinkReader, ReaderExit};

/// The physical channels a session can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkId {
    /// The command channel, also used for writing.
    Command,
    /// The telemetry channel.
    Telemetry,
}
impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkId::Command => f.write_str("command"),
            LinkId::Telemetry => f.write_str("telemetry"),
        }
    }
}
