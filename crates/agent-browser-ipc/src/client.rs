use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::error::ClientError;
use crate::paths::socket_path;
use crate::types::Request;
use crate::types::Response;

/// Read timeout is generous: snapshots and waits run server-side and the
/// protocol has no streaming, so the client simply blocks for the one line.
const READ_TIMEOUT: Duration = Duration::from_secs(120);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking one-shot client: each `call` opens a fresh connection, sends one
/// request line and reads one response line.
pub struct Client {
    socket: PathBuf,
}

impl Client {
    pub fn new() -> Self {
        Self {
            socket: socket_path(),
        }
    }

    pub fn with_socket(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
        }
    }

    pub fn is_reachable(path: &Path) -> bool {
        path.exists() && UnixStream::connect(path).is_ok()
    }

    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, ClientError> {
        if !self.socket.exists() {
            return Err(ClientError::NotRunning);
        }

        let mut stream = match UnixStream::connect(&self.socket) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(ClientError::NotRunning);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClientError::NotRunning);
            }
            Err(e) => return Err(ClientError::Connection(e)),
        };

        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

        let request = Request::new(method, args);
        let encoded = serde_json::to_string(&request)?;
        writeln!(stream, "{}", encoded)?;
        stream.flush()?;

        let mut reader = BufReader::new(&stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.trim().is_empty() {
            return Err(ClientError::EmptyResponse);
        }

        let response: Response = serde_json::from_str(&line)?;
        if let Some(message) = response.error {
            return Err(ClientError::Remote(message));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
