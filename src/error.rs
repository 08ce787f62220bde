//! Error types for the verification harness

use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a verification run
///
/// Every variant is terminal for the current run; nothing is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to launch the browser or set up the session
    #[error("Session initialization failed: {0}")]
    Initialization(String),

    /// The page did not reach its initial-load signal in time
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// A named check's condition was not met
    #[error("Assertion '{name}' failed: expected {expected}, got {actual}")]
    Assertion {
        name: String,
        expected: String,
        actual: String,
    },

    /// An expected file-download event did not fire within the window
    #[error("Download did not start within {0}ms")]
    DownloadTimeout(u64),

    /// A captured console/page error matched the disallowed-pattern filter
    #[error("Fatal console error: {0}")]
    FatalConsole(String),

    /// The static server's port is already bound by another process
    #[error("Port {0} is already in use")]
    PortInUse(u16),

    /// In-page JavaScript evaluation failed
    #[error("Script execution failed: {0}")]
    Script(String),

    /// Screenshot capture or write failed
    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    /// Backend protocol error
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Cdp(err.to_string())
    }
}
