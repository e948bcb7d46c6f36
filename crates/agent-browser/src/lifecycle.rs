//! Session lifecycle: spawn the daemon with a one-shot readiness channel,
//! tear it down, report status. Stale records are cleaned up on sight.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;

use agent_browser_ipc::paths::{daemon_log_path, session_dir, socket_path};
use agent_browser_ipc::{Client, ProcessController, SessionRecord, Signal, UnixProcessController};

use crate::commands::StartOptions;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Browser already running (pid: {0}). Stop it first with: agent-browser stop")]
    AlreadyRunning(u32),

    #[error("{0}")]
    InvalidOptions(String),

    #[error("Failed to spawn daemon: {0}")]
    Spawn(std::io::Error),

    #[error("Browser failed to start: {0}")]
    Startup(String),

    #[error("Browser did not become ready within {0}s. See {1} for details.")]
    ReadyTimeout(u64, String),
}

/// Removes a session record whose daemon is gone. Returns the live record,
/// if any.
fn live_record(controller: &dyn ProcessController) -> Option<SessionRecord> {
    let record = SessionRecord::load()?;
    if record.is_alive(controller) {
        Some(record)
    } else {
        SessionRecord::cleanup();
        None
    }
}

pub fn start(
    options: &StartOptions,
    initial_url: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = UnixProcessController;
    if let Some(record) = live_record(&controller) {
        return Err(LifecycleError::AlreadyRunning(record.pid).into());
    }

    // Validate flags locally before paying for a spawn.
    options
        .engine_config()
        .map_err(LifecycleError::InvalidOptions)?;

    std::fs::create_dir_all(session_dir()).map_err(LifecycleError::Spawn)?;
    let log = File::create(daemon_log_path()).map_err(LifecycleError::Spawn)?;
    let exe = std::env::current_exe().map_err(LifecycleError::Spawn)?;

    let mut child = Command::new(exe)
        .arg("daemon")
        .args(options.to_daemon_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(log)
        .spawn()
        .map_err(LifecycleError::Spawn)?;

    wait_for_readiness(&mut child, Duration::from_secs(options.timeout))?;

    let record = SessionRecord::new(child.id(), socket_path());
    record.store().map_err(LifecycleError::Spawn)?;
    println!("Browser started (pid: {})", child.id());

    if let Some(url) = initial_url {
        let result = Client::new().call("navigate", vec![json!(url)])?;
        if let Some(text) = result.as_str() {
            println!("{}", text);
        }
    }
    Ok(())
}

/// Blocks on the daemon's piped stdout for the single readiness line. On
/// timeout or a reported error the child is killed and no record is left.
fn wait_for_readiness(child: &mut Child, timeout: Duration) -> Result<(), LifecycleError> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| LifecycleError::Startup("daemon stdout unavailable".to_string()))?;

    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = BufReader::new(stdout).read_line(&mut line);
        let _ = sender.send(line);
    });

    match receiver.recv_timeout(timeout) {
        Ok(line) => {
            let line = line.trim();
            if line == "ready" {
                return Ok(());
            }
            let _ = child.kill();
            let _ = child.wait();
            if let Some(message) = line.strip_prefix("error:") {
                Err(LifecycleError::Startup(message.to_string()))
            } else if line.is_empty() {
                Err(LifecycleError::Startup(format!(
                    "daemon exited before signaling readiness. See {} for details.",
                    daemon_log_path().display()
                )))
            } else {
                Err(LifecycleError::Startup(format!(
                    "unexpected readiness message '{}'",
                    line
                )))
            }
        }
        Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(LifecycleError::ReadyTimeout(
                timeout.as_secs(),
                daemon_log_path().display().to_string(),
            ))
        }
    }
}

/// Graceful remote stop first; a daemon that cannot be reached gets SIGTERM
/// by pid. The record and socket are always cleared. Idempotent: stopping
/// when nothing runs succeeds.
pub fn stop() -> Result<(), Box<dyn std::error::Error>> {
    let controller = UnixProcessController;
    let Some(record) = live_record(&controller) else {
        println!("No browser running.");
        return Ok(());
    };

    match Client::new().call("stop", vec![]) {
        Ok(_) => {}
        Err(_) => {
            // Unreachable or misbehaving daemon: terminate it directly.
            let _ = controller.send_signal(record.pid, Signal::Term);
        }
    }

    SessionRecord::cleanup();
    println!("Browser stopped.");
    Ok(())
}

pub fn status() -> Result<(), Box<dyn std::error::Error>> {
    let controller = UnixProcessController;
    let Some(record) = live_record(&controller) else {
        println!("No browser running.");
        return Ok(());
    };

    println!("Browser running (pid: {})", record.pid);
    // Best effort: the process can be alive while the page is busy.
    if let Ok(result) = Client::new().call("url", vec![]) {
        if let Some(url) = result.as_str() {
            println!("Current URL: {}", url);
        }
    }
    Ok(())
}
