//! Events for the `linkcom` station state machine.
//!
//! This modules is private and restricted to the [`station`](crate::station)
//! scope. The public interface of the state machine is provided by
//! [`station`](crate::station).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use crate::session::Session;

// =============================================================================
// Crate-Public Interface
// =============================================================================

// ConnectEvent ================================================================

/// Event fired from the `Init` state to trigger the transition to the
/// `Connect` state.
#[derive(Debug)]
pub(crate) struct ConnectEvent {}

// ConnectedEvent ==============================================================

/// Event fired when every configured link was opened and its reader started.
/// Carries the running session into the `Service` state.
#[derive(Debug)]
pub(crate) struct ConnectedEvent {
    pub session: Session,
}

// DoneEvent ===================================================================

/// Event fired when the station completes, either because opening the links
/// failed (always with errors), or because every link reader stopped (with
/// errors when at least one of them failed).
#[derive(Debug)]
pub(crate) struct DoneEvent {
    pub with_errors: bool,
}

// ExitEvent ===================================================================

/// The last event of the station. The event loop terminates with an `exit
/// status` that can be used as the exit code of the process.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub with_error: bool,
}

// Events enum ==================================================================

/// Events that can be triggered within the station state machine.
#[derive(Debug)]
pub(crate) enum Event {
    Connect(ConnectEvent),
    Connected(ConnectedEvent),
    Done(DoneEvent),
    Exit(ExitEvent),
}
