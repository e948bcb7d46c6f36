//! The daemon: bind the socket, launch the browser, signal readiness on
//! stdout, then serve one connection at a time.
//!
//! The supervisor that spawned us blocks on our stdout for exactly one line:
//! `ready`, or `error:<message>`. Everything after that line goes through
//! `tracing` on stderr, which the supervisor redirects to the session log.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{debug, info, warn};

use agent_browser_ipc::paths::{session_dir, socket_path};
use agent_browser_ipc::{Request, Response};

use agent_browser_engine::EngineConfig;

use crate::error::{DaemonError, SessionError};
use crate::method::Method;
use crate::session::BrowserSession;

const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const ACCEPT_POLL: Duration = Duration::from_millis(10);

pub fn run(config: EngineConfig) -> Result<(), DaemonError> {
    init_logging();
    let socket = socket_path();

    let (listener, session) = match bind_and_launch(&socket, config) {
        Ok(pair) => pair,
        Err(e) => {
            // The readiness channel carries the failure to the supervisor.
            println!("error:{}", e);
            let _ = io::stdout().flush();
            return Err(e);
        }
    };

    println!("ready");
    let _ = io::stdout().flush();
    info!(
        socket = %socket.display(),
        pid = std::process::id(),
        "daemon ready"
    );

    accept_loop(listener, session, &socket)
}

fn bind_and_launch(
    socket: &Path,
    config: EngineConfig,
) -> Result<(UnixListener, BrowserSession), DaemonError> {
    fs::create_dir_all(session_dir())
        .map_err(|e| DaemonError::SocketBind(format!("session directory: {}", e)))?;

    // The supervisor has already verified no live daemon holds this socket.
    if socket.exists() {
        fs::remove_file(socket)
            .map_err(|e| DaemonError::SocketBind(format!("stale socket: {}", e)))?;
    }
    let listener =
        UnixListener::bind(socket).map_err(|e| DaemonError::SocketBind(e.to_string()))?;
    listener
        .set_nonblocking(true)
        .map_err(|e| DaemonError::SocketBind(e.to_string()))?;

    let session = match BrowserSession::start(config) {
        Ok(session) => session,
        Err(e) => {
            let _ = fs::remove_file(socket);
            return Err(DaemonError::Launch(e.to_string()));
        }
    };

    Ok((listener, session))
}

fn accept_loop(
    listener: UnixListener,
    mut session: BrowserSession,
    socket: &Path,
) -> Result<(), DaemonError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
    }

    let mut stop_requested = false;
    while !shutdown.load(Ordering::Relaxed) && !stop_requested {
        match listener.accept() {
            Ok((stream, _)) => {
                stop_requested = !handle_connection(stream, &mut session);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                if !shutdown.load(Ordering::Relaxed) {
                    warn!(error = %e, "accept failed");
                }
            }
        }
    }

    info!("shutting down");
    if let Err(e) = session.quit() {
        warn!(error = %e, "browser did not close cleanly");
    }
    let _ = fs::remove_file(socket);
    info!("daemon shutdown complete");
    Ok(())
}

/// Handles one connection fully: read a line, dispatch, write a line.
/// Returns false when the client asked the daemon to stop; the response is
/// written and the connection closed before teardown begins.
fn handle_connection(stream: UnixStream, session: &mut BrowserSession) -> bool {
    let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
    let _ = stream.set_write_timeout(Some(WRITE_TIMEOUT));

    let mut reader = BufReader::new(&stream);
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => return true,
        Ok(_) => {}
        Err(e) => {
            warn!(error = %e, "client read failed");
            return true;
        }
    }

    let (response, keep_running) = match decode(&line) {
        Decoded::Stop => (Response::success(Value::String("Stopped".to_string())), false),
        Decoded::Reject(response) => (response, true),
        Decoded::Call(method, request) => {
            debug!(method = method.name(), "dispatch");
            let response = match dispatch(session, method, &request) {
                Ok(result) => Response::success(result),
                Err(e) => Response::failure(e.to_string()),
            };
            (response, true)
        }
    };

    write_line(&stream, &response);
    keep_running
}

enum Decoded {
    Call(Method, Request),
    Stop,
    Reject(Response),
}

fn decode(line: &str) -> Decoded {
    let request: Request = match serde_json::from_str(line.trim()) {
        Ok(request) => request,
        Err(e) => return Decoded::Reject(Response::failure(format!("Parse error: {}", e))),
    };
    match Method::parse(&request.method) {
        Some(Method::Stop) => Decoded::Stop,
        Some(method) => Decoded::Call(method, request),
        None => Decoded::Reject(Response::failure(format!(
            "Unknown method '{}'",
            request.method
        ))),
    }
}

fn dispatch(
    session: &mut BrowserSession,
    method: Method,
    request: &Request,
) -> Result<Value, SessionError> {
    let args = &request.args;
    let text = match method {
        Method::Navigate => session.navigate(str_arg(args, 0, "url")?)?,
        Method::Back => session.back()?,
        Method::Forward => session.forward()?,
        Method::Refresh => session.refresh()?,
        Method::Snapshot => session.snapshot()?,
        Method::Tree => session.tree()?,
        Method::Markdown => session.markdown()?,
        Method::Click => session.click(value_arg(args, 0, "target")?)?,
        Method::Fill => {
            session.fill(value_arg(args, 0, "target")?, str_arg(args, 1, "value")?)?
        }
        Method::Select => {
            session.select(value_arg(args, 0, "target")?, str_arg(args, 1, "value")?)?
        }
        Method::Hover => session.hover(value_arg(args, 0, "target")?)?,
        Method::Type => session.type_text(str_arg(args, 0, "text")?)?,
        Method::Url => session.current_url()?,
        Method::Title => session.title()?,
        Method::Eval => return session.eval(str_arg(args, 0, "expression")?),
        Method::Screenshot => session.screenshot(opt_str_arg(args, 0))?,
        Method::Stealth => session.set_stealth(str_arg(args, 0, "profile")?)?,
        Method::Wait => session.wait(str_arg(args, 0, "selector")?, opt_u64_arg(args, 1))?,
        Method::WaitDownload => {
            session.wait_download(opt_str_arg(args, 0), opt_u64_arg(args, 1))?
        }
        // Intercepted in handle_connection; kept for exhaustiveness.
        Method::Stop => "Stopped".to_string(),
    };
    Ok(Value::String(text))
}

fn str_arg<'a>(
    args: &'a [Value],
    index: usize,
    name: &'static str,
) -> Result<&'a str, SessionError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or(SessionError::MissingArgument(name))
}

fn value_arg<'a>(
    args: &'a [Value],
    index: usize,
    name: &'static str,
) -> Result<&'a Value, SessionError> {
    args.get(index).ok_or(SessionError::MissingArgument(name))
}

fn opt_str_arg(args: &[Value], index: usize) -> Option<&str> {
    args.get(index)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn opt_u64_arg(args: &[Value], index: usize) -> Option<u64> {
    args.get(index).and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    })
}

fn write_line(mut stream: &UnixStream, response: &Response) {
    match serde_json::to_string(response) {
        Ok(encoded) => {
            if let Err(e) = writeln!(stream, "{}", encoded) {
                warn!(error = %e, "client write failed");
            }
        }
        Err(e) => warn!(error = %e, "response serialization failed"),
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_valid_request() {
        match decode(r#"{"method":"navigate","args":["example.com"]}"#) {
            Decoded::Call(method, request) => {
                assert_eq!(method, Method::Navigate);
                assert_eq!(request.arg_str(0), Some("example.com"));
            }
            _ => panic!("expected a call"),
        }
    }

    #[test]
    fn test_decode_stop_is_special_cased() {
        assert!(matches!(decode(r#"{"method":"stop"}"#), Decoded::Stop));
    }

    #[test]
    fn test_decode_unknown_method_names_it() {
        match decode(r#"{"method":"frobnicate"}"#) {
            Decoded::Reject(response) => {
                assert_eq!(
                    response.error.as_deref(),
                    Some("Unknown method 'frobnicate'")
                );
            }
            _ => panic!("expected a rejection"),
        }
    }

    #[test]
    fn test_decode_garbage_is_a_parse_error() {
        match decode("not json at all") {
            Decoded::Reject(response) => {
                assert!(response.error.unwrap().starts_with("Parse error:"));
            }
            _ => panic!("expected a rejection"),
        }
    }

    #[test]
    fn test_str_arg_missing_names_the_argument() {
        let err = str_arg(&[], 0, "url").unwrap_err();
        assert_eq!(err.to_string(), "Missing argument: url");

        let err = str_arg(&[json!(5)], 0, "url").unwrap_err();
        assert_eq!(err.to_string(), "Missing argument: url");
    }

    #[test]
    fn test_opt_str_arg_treats_empty_as_absent() {
        assert_eq!(opt_str_arg(&[json!("")], 0), None);
        assert_eq!(opt_str_arg(&[json!("x.png")], 0), Some("x.png"));
        assert_eq!(opt_str_arg(&[], 0), None);
    }

    #[test]
    fn test_opt_u64_arg_accepts_numbers_and_numeric_strings() {
        assert_eq!(opt_u64_arg(&[json!(30)], 0), Some(30));
        assert_eq!(opt_u64_arg(&[json!("45")], 0), Some(45));
        assert_eq!(opt_u64_arg(&[json!("soon")], 0), None);
        assert_eq!(opt_u64_arg(&[], 0), None);
    }
}
