//! `linkcom` station: connects the configured links, services them until
//! stopped and reports how each of them ended.
//!
//! **Example** - Executing the state machine event loop:
//! ```no_run
//! use std::sync::Arc;
//! use linkcom::{self as lc, LinkId, SerialConnector};
//!
//! let links = vec![(LinkId::Command, lc::SettingsBuilder::new().path("/dev/ttyUSB0").finalize())];
//! let sink = Arc::new(|message: lc::DecodedMessage| println!("{}", message.payload));
//! let station = lc::Station::new(links, Box::new(SerialConnector), sink);
//! let stop = station.stop_handle();
//! ctrlc::set_handler(move || {
//!     stop.cancel();
//! })
//! .unwrap();
//! let status = station.run(); // status code returned after the `Exit` event
//! std::process::exit(status.into());
//! ```

mod events;
mod state_machine;
mod states;

pub use state_machine::{Outgoing, Station};
