use agent_browser_core::target::TargetError;
use agent_browser_engine::EngineError;
use thiserror::Error;

/// Failures raised by session operations. Each message is client-facing:
/// the server forwards it verbatim in the `error` response field.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Element ref '{0}' not found. Take a new snapshot to refresh element refs.")]
    RefNotFound(String),

    #[error("No element matches '{0}'")]
    ElementNotFound(String),

    #[error("No option with value '{value}' in {target}")]
    OptionNotFound { target: String, value: String },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Timed out after {seconds}s waiting for '{target}'")]
    Timeout { target: String, seconds: u64 },

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("No download directory configured. Start with --download-dir to enable downloads.")]
    NoDownloadDir,

    #[error("Download failed: {0}")]
    Download(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<TargetError> for SessionError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::Invalid(message) => SessionError::InvalidTarget(message),
        }
    }
}

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Failed to bind socket: {0}")]
    SocketBind(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to install signal handler: {0}")]
    SignalSetup(String),
}
