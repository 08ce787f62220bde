//! End-to-end tests against a real headless Chrome
//!
//! Each test serves a fixture page from a temp directory via the crate's own
//! static server, then runs a full verification against it.

use pagecheck::run::{substring_filter, verify, Outcome};
use pagecheck::server::StaticServer;
use pagecheck::{Assertion, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;

const BINGO_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>2026 Bingo</title>
<style>
  header h1 { text-transform: none; }
  .bingo-grid { display: grid; grid-template-columns: repeat(5, 80px); }
  .bingo-cell { width: 80px; height: 80px; border: 1px solid #333; box-sizing: border-box; }
</style>
<script>
  /* Stand-in for the real export library so the fixture needs no network. */
  var html2canvas = function (el) {
    var canvas = document.createElement('canvas');
    canvas.width = 10; canvas.height = 10;
    return Promise.resolve(canvas);
  };
</script>
</head>
<body>
<header><h1>2026 Bingo</h1></header>
<div class="bingo-grid"></div>
<button id="download-btn">Download as Image</button>
<script>
  var grid = document.querySelector('.bingo-grid');
  var cells = Number(new URLSearchParams(location.search).get('cells') || 25);
  for (var i = 0; i < cells; i++) {
    var cell = document.createElement('div');
    cell.className = 'bingo-cell';
    grid.appendChild(cell);
  }
  document.getElementById('download-btn').addEventListener('click', function () {
    html2canvas(grid).then(function (canvas) {
      var a = document.createElement('a');
      a.download = 'bingo_card.png';
      a.href = canvas.toDataURL('image/png');
      a.click();
    });
  });
</script>
</body>
</html>
"#;

const BROKEN_EXPORT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>2026 Bingo</title></head>
<body>
<header><h1>2026 Bingo</h1></header>
<button id="download-btn">Download as Image</button>
<script>
  /* The library script tag "failed to load": the symbol never exists. */
  document.getElementById('download-btn').addEventListener('click', function () {
    html2canvas(document.body);
  });
  html2canvas(document.body);
</script>
</body>
</html>
"#;

fn serve_fixture(tag: &str, html: &str) -> StaticServer {
    let dir: PathBuf = std::env::temp_dir().join(format!(
        "pagecheck-e2e-{}-{}",
        tag,
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), html).unwrap();
    StaticServer::spawn(0, dir).unwrap()
}

fn layout_assertions() -> Vec<Assertion> {
    vec![
        Assertion::text_equals("header title", "header h1", "2026 Bingo"),
        Assertion::computed_style(
            "header keeps title case",
            "header h1",
            "text-transform",
            "none",
        ),
        Assertion::element_count("bingo cell count", ".bingo-cell", 25),
        Assertion::square_boxes("bingo cells are square", ".bingo-cell", 1.0),
    ]
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_layout_verification_passes() {
    let server = serve_fixture("layout", BINGO_PAGE);
    let session = pagecheck::new_session(SessionConfig::default()).expect("Failed to create session");

    let report = verify(
        Box::new(session),
        server.url(),
        &layout_assertions(),
        &substring_filter(&["html2canvas"]),
        Duration::from_secs(30),
    );

    assert_eq!(report.outcome, Outcome::Pass, "log: {:#?}", report.lines);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_short_grid_fails_the_count_check() {
    let server = serve_fixture("shortgrid", BINGO_PAGE);
    let session = pagecheck::new_session(SessionConfig::default()).expect("Failed to create session");

    let url = format!("{}/?cells=24", server.url());
    let report = verify(
        Box::new(session),
        &url,
        &layout_assertions(),
        &substring_filter(&[]),
        Duration::from_secs(30),
    );

    assert_eq!(report.outcome, Outcome::Fail);
    let failure = report.first_failure.expect("count failure recorded");
    assert!(failure.contains("bingo cell count"), "failure: {failure}");
    assert!(failure.contains("24"), "failure: {failure}");
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_export_triggers_download() {
    let server = serve_fixture("export", BINGO_PAGE);
    let session = pagecheck::new_session(SessionConfig::default()).expect("Failed to create session");

    let assertions = vec![
        Assertion::global_defined("html2canvas loaded", "html2canvas"),
        Assertion::download_on_click(
            "export triggers download",
            "#download-btn",
            Duration::from_secs(5),
        ),
    ];

    let report = verify(
        Box::new(session),
        server.url(),
        &assertions,
        &substring_filter(&["html2canvas"]),
        Duration::from_secs(30),
    );

    assert_eq!(report.outcome, Outcome::Pass, "log: {:#?}", report.lines);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_missing_library_is_fatal_even_when_checks_pass() {
    let server = serve_fixture("broken", BROKEN_EXPORT_PAGE);
    let session = pagecheck::new_session(SessionConfig::default()).expect("Failed to create session");

    // Only checks that pass on this page; the failure must come from the
    // captured "html2canvas is not defined" reference error.
    let assertions = vec![
        Assertion::text_equals("header title", "header h1", "2026 Bingo"),
        Assertion::element_count("one export button", "#download-btn", 1),
    ];

    let report = verify(
        Box::new(session),
        server.url(),
        &assertions,
        &substring_filter(&["html2canvas"]),
        Duration::from_secs(30),
    );

    assert_eq!(report.outcome, Outcome::Fail, "log: {:#?}", report.lines);
    assert!(report.first_failure.is_none());
    assert!(report
        .lines
        .iter()
        .any(|l| l.contains("Fatal console error")));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_screenshot_is_written() {
    let server = serve_fixture("shot", BINGO_PAGE);
    let session = pagecheck::new_session(SessionConfig::default()).expect("Failed to create session");

    let path = std::env::temp_dir()
        .join(format!("pagecheck-shot-{}", std::process::id()))
        .join("bingo_page.png");
    let assertions = vec![Assertion::screenshot_to("page screenshot", path.clone())];

    let report = verify(
        Box::new(session),
        server.url(),
        &assertions,
        &substring_filter(&[]),
        Duration::from_secs(30),
    );

    assert_eq!(report.outcome, Outcome::Pass, "log: {:#?}", report.lines);
    let png = std::fs::read(&path).expect("screenshot file written");
    assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
}
