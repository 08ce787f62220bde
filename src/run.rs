//! The verification driver: navigate, assert, reclassify, tear down
//!
//! One call to [`verify`] is one Verification Run: a single browser session
//! against a single URL, assertions executed strictly in order, captured
//! errors reclassified at the end, session closed on every path.

use crate::{Assertion, Error, Session};
use std::time::Duration;

/// Final verdict of a verification run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

/// The aggregated result of one verification run
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    /// Human-readable log: load confirmation, per-assertion results, captured
    /// errors, reclassification verdict.
    pub lines: Vec<String>,
    /// The first failure observed, which is the actionable one. Later
    /// failures still appear in `lines`.
    pub first_failure: Option<String>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// Process exit code for this report: 0 on pass, 1 on fail. The exit
    /// code is the sole machine-readable output of the verification bins.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            Outcome::Pass => 0,
            Outcome::Fail => 1,
        }
    }
}

/// Build a fatal-error filter that flags any captured message containing one
/// of the given substrings (e.g. the name of a library that must not fail to
/// load). An empty pattern list classifies every message as ignorable.
pub fn substring_filter(patterns: &[&str]) -> impl Fn(&str) -> bool {
    let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
    move |msg: &str| patterns.iter().any(|p| msg.contains(p.as_str()))
}

/// Run a full verification against `url`.
///
/// Assertions run to completion even after a failure so the log shows every
/// check, but the first failure is recorded distinctly. After the assertion
/// phase, every captured console/page error goes through `fatal_filter`; a
/// fatal match forces the outcome to `Fail` regardless of assertion results.
/// The session is closed before returning, on every path.
pub fn verify(
    mut session: Box<dyn Session>,
    url: &str,
    assertions: &[Assertion],
    fatal_filter: &dyn Fn(&str) -> bool,
    nav_timeout: Duration,
) -> RunReport {
    let mut lines = Vec::new();
    let mut first_failure: Option<String> = None;

    match session.navigate(url, nav_timeout) {
        Ok(()) => {
            lines.push(format!("page loaded: {}", url));
            for assertion in assertions {
                match assertion.check(session.as_mut()) {
                    Ok(()) => lines.push(format!("ok    {}", assertion.name())),
                    Err(e) => {
                        lines.push(format!("FAIL  {}: {}", assertion.name(), e));
                        if first_failure.is_none() {
                            first_failure = Some(format!("{}: {}", assertion.name(), e));
                        }
                    }
                }
            }
        }
        Err(e) => {
            // No assertion runs against a page that never loaded.
            lines.push(format!("FAIL  {}", e));
            first_failure = Some(e.to_string());
        }
    }

    // Reclassification pass over everything the passive listeners captured.
    let captured = session.captured_errors();
    let mut fatal = false;
    for msg in &captured {
        if fatal_filter(msg) {
            fatal = true;
            lines.push(format!("FAIL  {}", Error::FatalConsole(msg.clone())));
        } else {
            lines.push(format!("console error (non-fatal): {}", msg));
        }
    }

    if let Err(e) = session.close() {
        log::warn!("session teardown failed: {}", e);
    }

    let outcome = if first_failure.is_none() && !fatal {
        Outcome::Pass
    } else {
        Outcome::Fail
    };
    lines.push(match outcome {
        Outcome::Pass => "result: PASS".to_string(),
        Outcome::Fail => "result: FAIL".to_string(),
    });

    RunReport {
        outcome,
        lines,
        first_failure,
    }
}
