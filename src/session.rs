//! A connected set of links sharing one cancellation controller.
//!
//! **Example** - Reading the command and telemetry links until Ctrl+C:
//! ```no_run
//! use std::sync::Arc;
//! use linkcom::{ChannelSink, LinkId, SerialConnector, Session, SettingsBuilder};
//!
//! let links = vec![
//!     (LinkId::Command, SettingsBuilder::new().path("/dev/ttyUSB0").finalize()),
//!     (LinkId::Telemetry, SettingsBuilder::new().path("/dev/ttyUSB1").baud_rate(9_600).finalize()),
//! ];
//! let (sink, messages) = ChannelSink::new();
//! let mut session = Session::connect(&SerialConnector, &links, Arc::new(sink)).unwrap();
//! session.send(LinkId::Command, "PING").unwrap();
//! for message in messages.iter().take(1) {
//!     println!("{:?}", message);
//! }
//! for report in session.disconnect() {
//!     println!("{}: {}", report.link, report.exit);
//! }
//! ```

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};

use crate::{
    cancel::{CancellationController, CancellationToken},
    error::LinkError,
    link::{LinkId, LinkReader, ReaderExit},
    settings::LinkSettings,
    sink::MessageSink,
    transport::{Connector, Transport},
};

/// Final outcome of one link of a session.
#[derive(Debug)]
pub struct LinkReport {
    pub link: LinkId,
    pub exit: ReaderExit,
}

/// The links opened by one connect, each read on its own thread.
///
/// Every reader observes the same cancellation token. A session cannot be
/// restarted once cancelled: connect again to get a fresh token.
#[derive(Debug)]
pub struct Session {
    controller: CancellationController,
    links: Vec<LinkHandle>,
}

#[derive(Debug)]
struct LinkHandle {
    link: LinkId,
    writer: Box<dyn Transport>,
    worker: JoinHandle<ReaderExit>,
}

impl Session {
    /// Open every link and start reading.
    ///
    /// Opening is all or nothing: if one link fails to open, the links opened
    /// so far are closed again and the error is returned.
    pub fn connect(
        connector: &dyn Connector,
        links: &[(LinkId, LinkSettings)],
        sink: Arc<dyn MessageSink>,
    ) -> Result<Session, LinkError> {
        if links.is_empty() {
            return Err(LinkError::Configuration("no link to connect".into()));
        }
        for (index, (link, _)) in links.iter().enumerate() {
            if links[..index].iter().any(|(other, _)| other == link) {
                return Err(LinkError::Configuration(format!(
                    "{} link configured twice",
                    link
                )));
            }
        }

        let mut opened: Vec<(LinkId, &LinkSettings, Box<dyn Transport>, Box<dyn Transport>)> =
            Vec::with_capacity(links.len());
        for (link, settings) in links {
            match open_link(connector, settings) {
                Ok((reader, writer)) => {
                    info!(
                        "[{}] {} configured: {}",
                        link,
                        settings.path.as_deref().unwrap_or("?"),
                        settings
                    );
                    opened.push((*link, settings, reader, writer));
                }
                Err(err) => {
                    warn!("[{}] could not be opened: {}", link, err);
                    for (_, _, mut reader, mut writer) in opened {
                        reader.close();
                        writer.close();
                    }
                    return Err(err);
                }
            }
        }

        let controller = CancellationController::new();
        let mut session = Session {
            controller,
            links: Vec::with_capacity(opened.len()),
        };
        for (link, settings, transport, mut writer) in opened {
            let reader = LinkReader::new(
                link,
                transport,
                settings,
                sink.clone(),
                session.controller.token(),
            );
            match spawn_reader(reader) {
                Ok(worker) => session.links.push(LinkHandle {
                    link,
                    writer,
                    worker,
                }),
                Err(err) => {
                    writer.close();
                    // Readers already running unwind through the token.
                    session.disconnect();
                    return Err(LinkError::Transport(err));
                }
            }
        }
        Ok(session)
    }

    /// Links of this session, in connect order.
    pub fn links(&self) -> Vec<LinkId> {
        self.links.iter().map(|handle| handle.link).collect()
    }

    /// A token observing this session's cancellation.
    pub fn token(&self) -> CancellationToken {
        self.controller.token()
    }

    /// Stop every reader of the session. Idempotent.
    pub fn cancel(&self) -> bool {
        self.controller.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.controller.is_cancelled()
    }

    /// Write `text` on `link`, returning the number of bytes written.
    pub fn send(&mut self, link: LinkId, text: &str) -> Result<usize, LinkError> {
        if self.controller.is_cancelled() {
            return Err(LinkError::Cancelled);
        }
        let handle = self
            .links
            .iter_mut()
            .find(|handle| handle.link == link)
            .ok_or(LinkError::NotConnected(link))?;
        let written = handle.writer.write(text)?;
        debug!("[{}] {} bytes written", link, written);
        Ok(written)
    }

    /// `true` once every reader has stopped.
    pub fn is_finished(&self) -> bool {
        self.links.iter().all(|handle| handle.worker.is_finished())
    }

    /// Wait for every reader to stop, then close the write handles.
    pub fn wait(self) -> Vec<LinkReport> {
        self.links
            .into_iter()
            .map(|mut handle| {
                let exit = handle.worker.join().unwrap_or_else(|_| {
                    ReaderExit::Failed(LinkError::Transport(io::Error::new(
                        io::ErrorKind::Other,
                        "reader thread panicked",
                    )))
                });
                handle.writer.close();
                info!("[{}] {}", handle.link, exit);
                LinkReport {
                    link: handle.link,
                    exit,
                }
            })
            .collect()
    }

    /// Cancel all reads, close the devices and collect the reports.
    pub fn disconnect(self) -> Vec<LinkReport> {
        self.cancel();
        self.wait()
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// Open a link and clone a handle for writing.
fn open_link(
    connector: &dyn Connector,
    settings: &LinkSettings,
) -> Result<(Box<dyn Transport>, Box<dyn Transport>), LinkError> {
    let mut reader = connector.open(settings)?;
    match reader.try_clone() {
        Ok(writer) => Ok((reader, writer)),
        Err(err) => {
            reader.close();
            Err(err)
        }
    }
}

fn spawn_reader(mut reader: LinkReader) -> io::Result<JoinHandle<ReaderExit>> {
    thread::Builder::new()
        .name(format!("{}-reader", reader.link()))
        .spawn(move || {
            let exit = reader.run();
            reader.close();
            exit
        })
}
