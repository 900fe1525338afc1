//! Station lifecycle.
//!
//! A station connects the configured links once, services them (forwarding
//! outgoing text and waiting on the readers) and terminates with an exit
//! status. There is no automatic reconnect: a failed link is reported and the
//! station ends once every reader stopped.
//!
//! The following state diagram summarizes the different states and transitions
//! the station goes through:
//!
//! ```text
//!                  START
//!                    |
//!                    v
//!                .-------.
//!                | Init  |---------------.
//!                '-------'               |
//!                    |                   |
//!                    v                   |
//!              .-----------.   open      |
//!              |  Connect  |---error-----+
//!              '-----------'             |
//!                    |                   |
//!                 links up               |
//!                    v                   v
//!              .-----------.         .-------.
//!              |  Service  |-------->| Done  |---> END
//!              '-----------' readers '-------'
//!                            stopped
//! ```

use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

use super::events::*;
use super::states::*;
use crate::{
    cancel::{CancellationController, CancellationToken},
    link::LinkId,
    settings::LinkSettings,
    sink::MessageSink,
    transport::Connector,
};

// =============================================================================
// Public Interface
// =============================================================================

/// Text queued for writing on a link while the station is in service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub link: LinkId,
    pub text: String,
}

/// Encapsulate the state machine creation and event loop to provide a concise
/// and simple public interface to the module users.
pub struct Station {
    sm: StationStates,
    stop: CancellationController,
    outbox: Sender<Outgoing>,
}
impl Station {
    pub fn new(
        links: Vec<(LinkId, LinkSettings)>,
        connector: Box<dyn Connector>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let stop = CancellationController::new();
        let (outbox, inbox) = mpsc::channel();
        Station {
            sm: StationStates::Init(StationSM {
                ctx: Context {
                    links,
                    connector,
                    sink,
                    outbox: inbox,
                    stop: stop.token(),
                },
                state: InitState {},
            }),
            stop,
            outbox,
        }
    }

    /// Cancelling the returned controller stops the station: the current
    /// session, if any, is cancelled and the event loop winds down.
    pub fn stop_handle(&self) -> CancellationController {
        self.stop.clone()
    }

    /// Queue for text to be written on the links.
    pub fn outbox(&self) -> Sender<Outgoing> {
        self.outbox.clone()
    }

    /// The station event loop runs until the `Done` state is reached and its
    /// `should_exit` flag is set. At such point, the event loop terminates and
    /// returns an exit code indicating no errors when equal to **`0`**;
    /// otherwise a termination with error.
    pub fn run(self) -> i8 {
        let mut sm = self.sm;
        loop {
            sm = sm.step();
            if let StationStates::Done(done) = &sm {
                if done.state.should_exit {
                    return if done.state.with_error { 1 } else { 0 };
                }
            }
        }
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// Data shared by all states of the station.
pub(crate) struct Context {
    pub links: Vec<(LinkId, LinkSettings)>,
    pub connector: Box<dyn Connector>,
    pub sink: Arc<dyn MessageSink>,
    pub outbox: Receiver<Outgoing>,
    pub stop: CancellationToken,
}

/// The state machine implementing the station lifecycle.
///
/// Using a generic type that holds the current state allows for also having
/// shared data by all states (the [`Context`]) that is not really part of
/// state data.
struct StationSM<S: Runnable> {
    ctx: Context,
    state: S,
}
impl<S: Runnable> StationSM<S> {
    fn run(&mut self) -> Event {
        self.state.run(&mut self.ctx)
    }

    /// Move the shared data into the state targeted by `event`.
    fn into_next<T: Runnable>(self, event: impl Into<T>) -> StationSM<T> {
        StationSM {
            ctx: self.ctx,
            state: event.into(),
        }
    }
}

/// Wraps the state machine and its various states into a simple enum, which can
/// also be used for pattern matching during state transitions.
enum StationStates {
    Init(StationSM<InitState>),
    Connect(StationSM<ConnectState>),
    Service(StationSM<ServiceState>),
    Done(StationSM<DoneState>),
}
impl StationStates {
    /// The unit of work in the state machine event loop. State transitions
    /// from events are implemented using the rust `From`/`Into` pattern, so
    /// most state/event mismatches are caught at compile time.
    fn step(self) -> Self {
        match self {
            StationStates::Init(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Connect(ev) => StationStates::Connect(sm.into_next(ev)),
                    Event::Done(ev) => StationStates::Done(sm.into_next(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm.state),
                }
            }
            StationStates::Connect(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Connected(ev) => StationStates::Service(sm.into_next(ev)),
                    Event::Done(ev) => StationStates::Done(sm.into_next(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm.state),
                }
            }
            StationStates::Service(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Done(ev) => StationStates::Done(sm.into_next(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm.state),
                }
            }
            StationStates::Done(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Exit(ev) => StationStates::Done(sm.into_next(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm.state),
                }
            }
        }
    }
}
