//! Verifies the bingo page's export-to-image feature: serves the page from a
//! background static server, checks the html2canvas library loaded, clicks
//! the download button, and requires a file-download event within the window.
//!
//! Any captured console error mentioning html2canvas fails the run even when
//! the explicit checks pass. Exit code 0 on pass, 1 on fail.

use clap::Parser;
use pagecheck::run::{substring_filter, verify};
use pagecheck::server::StaticServer;
use pagecheck::{Assertion, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "check_export",
    about = "Verify the bingo page's export-to-image download"
)]
struct Args {
    /// Port for the background static server
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Directory to serve the page from
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// How long to wait for the download event, in milliseconds
    #[arg(long, default_value_t = 5000)]
    download_timeout_ms: u64,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
}

fn main() {
    let args = Args::parse();

    let server = match StaticServer::spawn(args.port, args.root) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let session = match pagecheck::new_session(SessionConfig::default()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let assertions = vec![
        Assertion::global_defined("html2canvas loaded", "html2canvas"),
        Assertion::download_on_click(
            "export triggers download",
            "#download-btn",
            Duration::from_millis(args.download_timeout_ms),
        ),
    ];

    let report = verify(
        Box::new(session),
        server.url(),
        &assertions,
        &substring_filter(&["html2canvas"]),
        Duration::from_millis(args.timeout_ms),
    );

    for line in &report.lines {
        println!("{}", line);
    }
    std::process::exit(report.exit_code());
}
