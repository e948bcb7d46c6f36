#![deny(clippy::all)]

mod client;
mod error;
pub mod paths;
pub mod process;
mod session_record;
mod types;

pub use client::Client;
pub use error::ClientError;
pub use process::{ProcessController, ProcessStatus, Signal, UnixProcessController};
pub use session_record::SessionRecord;
pub use types::Request;
pub use types::Response;

pub type Result<T> = std::result::Result<T, ClientError>;
