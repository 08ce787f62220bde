//! Pagecheck
//!
//! A headless-browser page verification harness: navigate to a URL, run an
//! ordered list of named assertions against the live page, capture console
//! and page errors for the whole session, and fold everything into a single
//! pass/fail verdict with a human-readable log.
//!
//! # Features
//!
//! - **CDP Backend**: drives headless Chrome via the Chrome DevTools Protocol
//! - **Adapter Design**: the [`Session`] trait keeps the verification driver
//!   independent of the browser backend, so the driver logic is testable
//!   without a browser
//! - **Passive Capture**: console errors and uncaught page exceptions are
//!   collected from the moment the session opens, and can retroactively fail
//!   an otherwise green run
//!
//! # Example
//!
//! ```no_run
//! use pagecheck::{Assertion, SessionConfig, run::{substring_filter, verify}};
//! use std::time::Duration;
//!
//! # fn main() -> pagecheck::Result<()> {
//! let session = pagecheck::new_session(SessionConfig::default())?;
//! let assertions = vec![
//!     Assertion::text_equals("header title", "header h1", "2026 Bingo"),
//!     Assertion::element_count("bingo cell count", ".bingo-cell", 25),
//! ];
//!
//! let report = verify(
//!     Box::new(session),
//!     "http://localhost:3000",
//!     &assertions,
//!     &substring_filter(&["html2canvas"]),
//!     Duration::from_secs(30),
//! );
//! for line in &report.lines {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::mpsc;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

// CDP-backed session implementation
pub mod cdp;

// Named checks against live page state
pub mod assert;
pub use assert::Assertion;

// The verification driver: navigate + assert + reclassify + teardown
pub mod run;
pub use run::{Outcome, RunReport};

// Background static file server for pages under test
pub mod server;

/// Configuration for a verification session
///
/// Defaults are conservative: a desktop viewport and a 30 second timeout for
/// page loads, matching what a local static page comfortably fits in.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Default timeout for browser operations in milliseconds
    pub timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Pagecheck/0.1"
                .to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// A pending download expectation
///
/// Returned by [`Session::expect_download`] BEFORE the causal action (the
/// button click) is dispatched, so the trigger and the observation cannot
/// race. [`wait`](DownloadExpectation::wait) blocks on a channel handle with
/// a timeout rather than polling.
pub struct DownloadExpectation {
    rx: mpsc::Receiver<String>,
}

impl DownloadExpectation {
    /// Create an armed expectation; the backend fires it by sending the
    /// suggested filename on the returned sender.
    pub fn arm() -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    /// Block until the download event fires or the window elapses.
    pub fn wait(self, timeout: Duration) -> Result<String> {
        self.rx
            .recv_timeout(timeout)
            .map_err(|_| Error::DownloadTimeout(timeout.as_millis() as u64))
    }
}

/// Core trait for verification-session backends
///
/// Object-safe on purpose: the driver in [`run`] works over `dyn Session`,
/// which is also what lets the scenario tests run against a stub with no
/// browser installed.
pub trait Session {
    /// Navigate to a URL and block until the initial-load signal (DOM parsed,
    /// deferred scripts executed). Fails with [`Error::Navigation`] when the
    /// page does not get there within `timeout`.
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Evaluate a JavaScript expression in the page context and return its
    /// JSON value.
    fn evaluate(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Dispatch a click on the first element matching `selector`.
    fn click(&mut self, selector: &str) -> Result<()>;

    /// Register a download expectation. Must be called before the action that
    /// is supposed to trigger the download.
    fn expect_download(&mut self) -> Result<DownloadExpectation>;

    /// Snapshot of every console error and uncaught page exception captured
    /// since the session opened. The underlying list is append-only and safe
    /// against concurrent writes from the browser's event callbacks.
    fn captured_errors(&self) -> Vec<String>;

    /// Capture the current page as a PNG image.
    fn screenshot_png(&mut self) -> Result<Vec<u8>>;

    /// Tear the session down. Idempotent; `Drop` is the backstop, so the
    /// browser is closed exactly once on every exit path.
    fn close(&mut self) -> Result<()>;
}

/// Create a new session with the default CDP backend
pub fn new_session(config: SessionConfig) -> Result<cdp::CdpSession> {
    cdp::CdpSession::new(config)
}
