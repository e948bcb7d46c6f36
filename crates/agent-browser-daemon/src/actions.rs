//! Bounded retry for node interactions. A page can reflow between resolving
//! a node and acting on it; those races are transient and worth one more try.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::SessionError;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Runs `op` up to three times. Only transient engine failures (element
/// moved, no coordinates) trigger a retry; everything else propagates on the
/// first miss. The operation should re-resolve its node each attempt.
pub fn with_retry<T, F>(mut op: F) -> Result<T, SessionError>
where
    F: FnMut() -> Result<T, SessionError>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(SessionError::Engine(e)) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                debug!(attempt, error = %e, "transient action failure, retrying");
                thread::sleep(RETRY_BACKOFF);
                attempt += 1;
            }
            Err(other) => return Err(other),
        }
    }
}
