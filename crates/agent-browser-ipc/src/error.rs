use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No browser running. Start one with: agent-browser start")]
    NotRunning,

    #[error("Failed to connect to browser daemon: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Failed to encode request: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No response from daemon")]
    EmptyResponse,

    #[error("{0}")]
    Remote(String),
}

impl ClientError {
    /// True for failures meaning "the daemon is not there", as opposed to a
    /// method-level failure reported by a live daemon.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            ClientError::NotRunning | ClientError::EmptyResponse => true,
            ClientError::Connection(_) => true,
            ClientError::Serialization(_) | ClientError::Remote(_) => false,
        }
    }
}
