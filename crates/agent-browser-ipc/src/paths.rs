//! Well-known session state locations.
//!
//! Everything lives under one session directory: the control socket, the
//! session descriptor, and the daemon log. `AGENT_BROWSER_DIR` overrides the
//! default (`~/.agent-browser`), which the tests rely on for isolation.

use std::path::PathBuf;

pub const SESSION_FILE_NAME: &str = "session.json";
pub const SOCKET_FILE_NAME: &str = "agent-browser.sock";
pub const DAEMON_LOG_NAME: &str = "daemon.log";

pub fn session_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AGENT_BROWSER_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home).join(".agent-browser"),
        _ => std::env::temp_dir().join("agent-browser"),
    }
}

pub fn session_file() -> PathBuf {
    session_dir().join(SESSION_FILE_NAME)
}

pub fn socket_path() -> PathBuf {
    session_dir().join(SOCKET_FILE_NAME)
}

pub fn daemon_log_path() -> PathBuf {
    session_dir().join(DAEMON_LOG_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_session_dir() {
        let dir = session_dir();
        assert_eq!(session_file().parent(), Some(dir.as_path()));
        assert_eq!(socket_path().parent(), Some(dir.as_path()));
        assert_eq!(daemon_log_path().parent(), Some(dir.as_path()));
    }

    #[test]
    fn test_file_names() {
        assert!(session_file().ends_with(SESSION_FILE_NAME));
        assert!(socket_path().ends_with(SOCKET_FILE_NAME));
    }
}
