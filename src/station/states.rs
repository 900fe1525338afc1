//! States for the `linkcom` station state machine.
//!
//! This modules is private and restricted to the [`station`](crate::station)
//! scope. The public interface of the state machine is provided by
//! [`station`](crate::station).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::{sync::mpsc::RecvTimeoutError, thread, time::Duration};

use console::style;
use log::{debug, info, warn};

use super::events::*;
use super::state_machine::Context;
use crate::session::Session;

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be `run` after a transition into it.
pub(crate) trait Runnable {
    /// A state implements this method so it can be `run` after the state
    /// machine transitions into it.
    ///
    /// During this call, the state can do any work that needs to be done and
    /// when finished, requests a transition to a `new state` by returning the
    /// appropriate `event`. The `event` is then consumed to create the `new
    /// state` using the corresponding [`From`] trait implementation.
    fn run(&mut self, ctx: &mut Context) -> Event;
}

// Init State ==================================================================

/// The initial state of the station.
///
///  * **[`ConnectEvent`] => [`ConnectState`]** when there is something to
///    connect,
///  * **[`DoneEvent`] => [`DoneState`]** when no link was configured or the
///    station was stopped before connecting.
#[derive(Debug)]
pub(crate) struct InitState {}
impl Runnable for InitState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        info!("=> Init");
        if ctx.links.is_empty() {
            println!("{}", style("[LC] 🙁 no link to connect").yellow());
            return Event::Done(DoneEvent { with_errors: true });
        }
        if ctx.stop.is_cancelled() {
            return Event::Done(DoneEvent { with_errors: false });
        }
        for (link, settings) in &ctx.links {
            debug!("{} link: {:?}", link, settings);
        }
        Event::Connect(ConnectEvent {})
    }
}

// Connect State ===============================================================

/// Opens and configures every link, then starts their readers.
///
///  * **[`ConnectedEvent`] => [`ServiceState`]** once all links are open,
///  * **[`DoneEvent`] => [`DoneState`]** when a link could not be opened. This
///    is fatal for the connect attempt; the user has to try again with other
///    settings or another device.
#[derive(Debug)]
pub(crate) struct ConnectState {}
impl Runnable for ConnectState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        info!("=> Connect");
        match Session::connect(&*ctx.connector, &ctx.links, ctx.sink.clone()) {
            Ok(session) => {
                for (link, settings) in &ctx.links {
                    println!(
                        "[LC] 👍 {} link configured successfully: {}",
                        style(link).cyan(),
                        settings
                    );
                }
                Event::Connected(ConnectedEvent { session })
            }
            Err(err) => {
                println!("{}", style(format!("[LC] 💥 {}", err)).red());
                Event::Done(DoneEvent { with_errors: true })
            }
        }
    }
}

// Service State ===============================================================

/// Forwards outgoing text to the links while their readers run, and waits for
/// all of them to stop.
///
/// A stop request cancels the session; a failing link stops on its own while
/// the others keep running.
///
///  * **[`DoneEvent`] => [`DoneState`]** once every reader stopped.
#[derive(Debug)]
pub(crate) struct ServiceState {
    /// The running session, consumed when the state completes.
    pub session: Option<Session>,
}
impl Runnable for ServiceState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        info!("=> Service");

        if let Some(mut session) = self.session.take() {
            loop {
                if ctx.stop.is_cancelled() && session.cancel() {
                    info!("stop requested, cancelling reads");
                }
                if session.is_finished() {
                    break;
                }

                match ctx.outbox.recv_timeout(Duration::from_millis(100)) {
                    Ok(outgoing) => match session.send(outgoing.link, &outgoing.text) {
                        Ok(written) => {
                            println!("[LC] {}, {} bytes written successfully!", outgoing.text, written)
                        }
                        Err(err) => {
                            warn!("[{}] write failed: {}", outgoing.link, err);
                            println!("{}", style(format!("[LC] 💥 {}", err)).red());
                        }
                    },
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        // Nobody will send anything anymore, just keep waiting
                        // on the readers.
                        thread::sleep(Duration::from_millis(100));
                    }
                }
            }

            let reports = session.wait();
            for report in &reports {
                if report.exit.is_failure() {
                    println!(
                        "{}",
                        style(format!("[LC] 💥 {} link: {}", report.link, report.exit)).red()
                    );
                } else {
                    println!("[LC] 🔌 {} link: {}", style(report.link).cyan(), report.exit);
                }
            }
            return Event::Done(DoneEvent {
                with_errors: reports.iter().any(|report| report.exit.is_failure()),
            });
        }

        // We should never reach here!
        unreachable!()
    }
}

// Done State ==================================================================

/// Reached when the station completes its execution and is about to terminate
/// (normally or abnormally).
///
/// This state goes into a 2-phase execution. During the initial phase, it runs
/// like any other state to report the outcome. It then triggers the
/// [`ExitEvent`] to cause the station event loop to exit.
#[derive(Debug, Copy, Clone)]
pub(crate) struct DoneState {
    /// When `true`, indicates an abnormal completion caused by an error.
    pub with_error: bool,
    /// When `true` instructs the station to exit its event loop.
    pub should_exit: bool,
}
impl Runnable for DoneState {
    fn run(&mut self, _ctx: &mut Context) -> Event {
        info!(
            "=> Done with{}errors",
            if self.with_error { " " } else { " no " }
        );
        if self.with_error && !self.should_exit {
            println!("[LC] 🔌 Check the devices and connect again!");
        }
        Event::Exit(ExitEvent {
            with_error: self.with_error,
        })
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<ConnectEvent> for ConnectState {
    fn from(_event: ConnectEvent) -> ConnectState {
        ConnectState {}
    }
}

impl From<ConnectedEvent> for ServiceState {
    fn from(event: ConnectedEvent) -> ServiceState {
        ServiceState {
            session: Some(event.session),
        }
    }
}

impl From<DoneEvent> for DoneState {
    fn from(event: DoneEvent) -> DoneState {
        DoneState {
            with_error: event.with_errors,
            should_exit: false,
        }
    }
}
impl From<ExitEvent> for DoneState {
    fn from(event: ExitEvent) -> DoneState {
        DoneState {
            with_error: event.with_error,
            should_exit: true,
        }
    }
}
