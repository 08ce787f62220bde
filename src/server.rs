//! Background static file server for pages under test
//!
//! One request at a time is plenty for a single verification run. The serve
//! thread is started once and never joined; process exit reclaims it.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tiny_http::{Response, Server};

/// A static file server running on a background thread
#[derive(Debug)]
pub struct StaticServer {
    url: String,
}

impl StaticServer {
    /// Bind `127.0.0.1:port` and serve files under `root`.
    ///
    /// Port 0 asks the OS for a free port; [`url`](StaticServer::url) reports
    /// the one actually bound. Fails fast with [`Error::PortInUse`] when the
    /// port is held by another process instead of hanging or silently reusing
    /// a stale server.
    pub fn spawn(port: u16, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let server = Server::http(("127.0.0.1", port)).map_err(|e| {
            let addr_in_use = e
                .downcast_ref::<std::io::Error>()
                .map(|io| io.kind() == std::io::ErrorKind::AddrInUse)
                .unwrap_or(false);
            if addr_in_use {
                Error::PortInUse(port)
            } else {
                Error::Other(format!("Failed to bind 127.0.0.1:{}: {}", port, e))
            }
        })?;

        let url = format!("http://{}", server.server_addr());

        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                respond(&root, request);
            }
        });

        Ok(Self { url })
    }

    /// Base URL of the running server, e.g. `http://127.0.0.1:3001`.
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn respond(root: &Path, request: tiny_http::Request) {
    let raw = request.url();
    let path = raw.split('?').next().unwrap_or(raw).trim_start_matches('/');
    let rel = if path.is_empty() { "index.html" } else { path };

    // Reject traversal out of the served root.
    let rel_path = Path::new(rel);
    if rel_path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        let _ = request.respond(Response::from_string("Forbidden").with_status_code(403));
        return;
    }

    match std::fs::read(root.join(rel_path)) {
        Ok(bytes) => {
            let mut response = Response::from_data(bytes);
            if let Ok(header) =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type(rel).as_bytes())
            {
                response = response.with_header(header);
            }
            let _ = request.respond(response);
        }
        Err(_) => {
            let _ = request.respond(Response::from_string("Not Found").with_status_code(404));
        }
    }
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
