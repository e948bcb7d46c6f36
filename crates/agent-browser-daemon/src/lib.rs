#![deny(clippy::all)]

//! agent-browser daemon: owns the one Chromium instance and serves the
//! unix-socket line protocol, one connection at a time.

pub mod actions;
pub mod downloads;
pub mod error;
pub mod method;
pub mod resolve;
pub mod server;
pub mod session;
pub mod waiter;

pub use error::{DaemonError, SessionError};
pub use server::run;
pub use session::BrowserSession;
