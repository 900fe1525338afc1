//! Consumers of completed messages.

use std::sync::{mpsc, Mutex};

use log::debug;

use crate::framing::DecodedMessage;

/// Receives every message completed on any link of a session.
///
/// A single sink is shared by all link readers, each calling it from its own
/// thread.
pub trait MessageSink: Send + Sync {
    fn deliver(&self, message: DecodedMessage);
}

impl<F> MessageSink for F
where
    F: Fn(DecodedMessage) + Send + Sync,
{
    fn deliver(&self, message: DecodedMessage) {
        self(message)
    }
}

/// Forwards messages into an `mpsc` channel.
///
/// Messages delivered after the receiving end was dropped are discarded.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Mutex<mpsc::Sender<DecodedMessage>>,
}
impl ChannelSink {
    pub fn new() -> (Self, mpsc::Receiver<DecodedMessage>) {
        let (tx, rx) = mpsc::channel();
        (ChannelSink { tx: Mutex::new(tx) }, rx)
    }
}
impl MessageSink for ChannelSink {
    fn deliver(&self, message: DecodedMessage) {
        let sent = match self.tx.lock() {
            Ok(tx) => tx.send(message).is_ok(),
            Err(_) => false,
        };
        if !sent {
            debug!("message dropped, nobody is listening");
        }
    }
}
