#![deny(clippy::all)]

//! Pure data layer: reference tables, target parsing, accessibility
//! extraction and the markdown/snapshot pipeline. Nothing here talks to the
//! browser; the engine feeds this crate plain data.

pub mod ax;
pub mod markdown;
pub mod refs;
pub mod snapshot;
pub mod target;

pub use ax::AxNodeData;
pub use refs::NodeDescriptor;
pub use refs::RefTable;
pub use snapshot::Snapshot;
pub use target::Target;
pub use target::TargetError;
