#![deny(clippy::all)]

//! Synchronous Chromium driver for the agent-browser daemon.
//!
//! Wraps chromiumoxide behind a blocking API: one engine, one page, explicit
//! configuration passed in at launch. The daemon never touches async code.

pub mod config;
pub mod engine;
pub mod error;
pub mod stealth;

pub use config::EngineConfig;
pub use engine::{Engine, NodeHandle};
pub use error::{EngineError, Result};
pub use stealth::StealthProfile;
