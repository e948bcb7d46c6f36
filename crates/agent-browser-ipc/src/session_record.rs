//! The persisted session descriptor: `{pid, socket}`.
//!
//! One record exists for the lifetime of one daemon. A record whose pid is no
//! longer alive is stale; callers must discard it (and the socket) before
//! starting a new daemon.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::paths;
use crate::process::{is_alive, ProcessController};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub pid: u32,
    pub socket: PathBuf,
}

impl SessionRecord {
    pub fn new(pid: u32, socket: PathBuf) -> Self {
        Self { pid, socket }
    }

    /// Reads the record from the well-known location. An unreadable or
    /// corrupt file is treated as absent.
    pub fn load() -> Option<Self> {
        Self::load_from(&paths::session_file())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn store(&self) -> std::io::Result<()> {
        self.store_to(&paths::session_file())
    }

    pub fn store_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string(self).map_err(std::io::Error::other)?;
        std::fs::write(path, encoded)
    }

    pub fn is_alive(&self, controller: &dyn ProcessController) -> bool {
        controller
            .check_process(self.pid)
            .map(is_alive)
            .unwrap_or(false)
    }

    /// Removes the descriptor file and the socket file. Missing files are
    /// fine; both deletions are attempted regardless.
    pub fn cleanup() {
        Self::cleanup_at(&paths::session_file(), &paths::socket_path());
    }

    pub fn cleanup_at(session_file: &Path, socket: &Path) {
        let _ = std::fs::remove_file(session_file);
        let _ = std::fs::remove_file(socket);
    }
}
