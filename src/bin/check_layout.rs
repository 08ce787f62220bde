//! Verifies the bingo page renders correctly: title-cased header, a 5x5 grid
//! of square cells, and optionally captures a screenshot of the result.
//!
//! The page is assumed to already be served (e.g. a dev server on port 3000).
//! Exit code 0 means every check passed; 1 means the run failed.

use clap::Parser;
use pagecheck::run::{substring_filter, verify};
use pagecheck::{Assertion, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "check_layout",
    about = "Verify the bingo page layout in a headless browser"
)]
struct Args {
    /// URL of the page under test
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Write a full-page screenshot here after the checks
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
}

fn main() {
    let args = Args::parse();

    let session = match pagecheck::new_session(SessionConfig::default()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut assertions = vec![
        Assertion::text_equals("header title", "header h1", "2026 Bingo"),
        Assertion::computed_style(
            "header keeps title case",
            "header h1",
            "text-transform",
            "none",
        ),
        Assertion::element_count("bingo cell count", ".bingo-cell", 25),
        Assertion::square_boxes("bingo cells are square", ".bingo-cell", 1.0),
    ];
    if let Some(path) = args.screenshot {
        assertions.push(Assertion::screenshot_to("page screenshot", path));
    }

    let report = verify(
        Box::new(session),
        &args.url,
        &assertions,
        &substring_filter(&[]),
        Duration::from_millis(args.timeout_ms),
    );

    for line in &report.lines {
        println!("{}", line);
    }
    std::process::exit(report.exit_code());
}
