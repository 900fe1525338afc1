//! Scripted in-memory transports shared by the integration tests.
#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use linkcom::{CancellationToken, Connector, LinkError, LinkSettings, SettingsBuilder, Transport};

/// One scripted outcome of a `read` call.
#[derive(Debug, Clone)]
pub enum Step {
    Data(String),
    Timeout,
    Fail,
}

pub fn data(text: &str) -> Step {
    Step::Data(text.to_string())
}

/// Counters shared between a scripted transport and the test observing it.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    pub written: Arc<Mutex<Vec<String>>>,
    pub reads: Arc<AtomicUsize>,
    pub detached: Arc<AtomicUsize>,
    pub reader_closed: Arc<AtomicUsize>,
    pub writer_closed: Arc<AtomicUsize>,
}
impl Probe {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
    pub fn detached(&self) -> usize {
        self.detached.load(Ordering::SeqCst)
    }
    pub fn reader_closed(&self) -> usize {
        self.reader_closed.load(Ordering::SeqCst)
    }
    pub fn writer_closed(&self) -> usize {
        self.writer_closed.load(Ordering::SeqCst)
    }
    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

/// Plays back a list of steps, then behaves like an idle line: it waits until
/// the read is cancelled.
#[derive(Debug)]
pub struct ScriptedTransport {
    steps: VecDeque<Step>,
    probe: Probe,
    writer: bool,
    closed: bool,
}
impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> (Self, Probe) {
        let probe = Probe::default();
        (
            ScriptedTransport {
                steps: steps.into(),
                probe: probe.clone(),
                writer: false,
                closed: false,
            },
            probe,
        )
    }
}
impl Transport for ScriptedTransport {
    fn configure(&mut self, _settings: &LinkSettings) -> Result<(), LinkError> {
        if self.closed {
            return Err(LinkError::Configuration("closed".into()));
        }
        Ok(())
    }

    fn read(&mut self, _max_bytes: usize, cancel: &CancellationToken) -> Result<String, LinkError> {
        loop {
            cancel.check()?;
            match self.steps.pop_front() {
                Some(Step::Data(text)) => {
                    self.probe.reads.fetch_add(1, Ordering::SeqCst);
                    return Ok(text);
                }
                Some(Step::Timeout) => return Err(LinkError::Timeout),
                Some(Step::Fail) => {
                    return Err(LinkError::Transport(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "device unplugged",
                    )))
                }
                None => thread::sleep(Duration::from_millis(5)),
            }
        }
    }

    fn write(&mut self, text: &str) -> Result<usize, LinkError> {
        if self.closed {
            return Err(LinkError::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "closed",
            )));
        }
        self.probe.written.lock().unwrap().push(text.to_string());
        Ok(text.len())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let counter = if self.writer {
                &self.probe.writer_closed
            } else {
                &self.probe.reader_closed
            };
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn detach(&mut self) {
        self.probe.detached.fetch_add(1, Ordering::SeqCst);
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>, LinkError> {
        Ok(Box::new(ScriptedTransport {
            steps: VecDeque::new(),
            probe: self.probe.clone(),
            writer: true,
            closed: self.closed,
        }))
    }
}

/// Hands out scripted transports by device path.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    devices: Mutex<HashMap<String, ScriptedTransport>>,
}
impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device and return the probe observing it.
    pub fn device(&self, path: &str, steps: Vec<Step>) -> Probe {
        let (transport, probe) = ScriptedTransport::new(steps);
        self.devices
            .lock()
            .unwrap()
            .insert(path.to_string(), transport);
        probe
    }
}
impl Connector for ScriptedConnector {
    fn open(&self, settings: &LinkSettings) -> Result<Box<dyn Transport>, LinkError> {
        let path = settings
            .path
            .clone()
            .ok_or_else(|| LinkError::Configuration("no device path given".into()))?;
        let mut transport = self
            .devices
            .lock()
            .unwrap()
            .remove(&path)
            .ok_or_else(|| LinkError::Configuration(format!("no such device: {}", path)))?;
        transport.configure(settings)?;
        Ok(Box::new(transport))
    }
}

pub fn settings(path: &str) -> LinkSettings {
    SettingsBuilder::new().path(path).finalize()
}

/// Poll `condition` until it holds or two seconds went by.
pub fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
