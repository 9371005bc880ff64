// src/server/mod.rs

//! Development server: static files from the dev output root plus live
//! reload over Server-Sent Events.
//!
//! Routes:
//! - `/__assetpipe/reload`: SSE stream, one `reload` message per rebuild;
//! - `/__assetpipe/reload.js`: the client that listens on that stream;
//! - everything else: files below the dev root, `index.html` for
//!   directories, with the client injected into HTML responses.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod reload;

pub use reload::ReloadHub;

pub const RELOAD_SSE_PATH: &str = "/__assetpipe/reload";
pub const RELOAD_SCRIPT_PATH: &str = "/__assetpipe/reload.js";

const RELOAD_SCRIPT: &str = r#"(function () {
  var source = new EventSource("/__assetpipe/reload");
  source.onmessage = function (event) {
    if (event.data === "reload") {
      window.location.reload();
    }
  };
})();
"#;

#[derive(Debug, Clone)]
struct ServerState {
    root: PathBuf,
    hub: ReloadHub,
}

/// Bound dev server, ready to serve.
pub struct DevServer {
    listener: TcpListener,
    router: Router,
}

impl DevServer {
    /// Bind `host:port` (port `0` picks a free one) and serve `root`.
    pub async fn bind(host: &str, port: u16, root: impl Into<PathBuf>, hub: ReloadHub) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("binding dev server to {host}:{port}"))?;
        Ok(Self {
            listener,
            router: router(root.into(), hub),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the task is dropped or the listener fails.
    pub async fn serve(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!(%addr, "dev server listening on http://{addr}");
        axum::serve(self.listener, self.router)
            .await
            .context("dev server terminated")
    }
}

/// Router over `root`. Exposed for tests that drive it without a socket.
pub fn router(root: PathBuf, hub: ReloadHub) -> Router {
    Router::new()
        .route(RELOAD_SSE_PATH, get(handle_sse))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .fallback(handle_static)
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { root, hub })
}

async fn handle_sse(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.hub.subscribe())
        .filter_map(|msg| msg.ok())
        .map(|msg| Ok(Event::default().data(msg)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_reload_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
}

async fn handle_static(State(state): State<ServerState>, uri: Uri) -> Response {
    let Some(rel) = sanitize_request_path(uri.path()) else {
        return (StatusCode::BAD_REQUEST, "invalid path").into_response();
    };

    let mut file = state.root.join(&rel);
    if tokio::fs::metadata(&file).await.is_ok_and(|m| m.is_dir()) {
        file = file.join("index.html");
    }

    match tokio::fs::read(&file).await {
        Ok(content) => {
            let content_type = content_type_for(&file);
            let body = if content_type.starts_with("text/html") {
                inject_reload_script(&content)
            } else {
                content
            };
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                body,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, format!("File not found: {}", uri.path())).into_response()
        }
        Err(e) => {
            warn!(path = %file.display(), error = %e, "failed to read file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Turn a URL path into a relative path below the served root.
///
/// Returns `None` for anything that would escape the root.
pub fn sanitize_request_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let rel = Path::new(trimmed);
    let mut out = PathBuf::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Adds the reload client before the closing `</body>` tag, or at the end.
pub fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    let html = String::from_utf8_lossy(content);
    let script_tag = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);

    match html.rfind("</body>") {
        Some(pos) => {
            let mut result = String::with_capacity(html.len() + script_tag.len() + 1);
            result.push_str(&html[..pos]);
            result.push_str(&script_tag);
            result.push('\n');
            result.push_str(&html[pos..]);
            result.into_bytes()
        }
        None => {
            let mut result = html.into_owned();
            result.push('\n');
            result.push_str(&script_tag);
            result.into_bytes()
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lands_before_closing_body() {
        let out = String::from_utf8(inject_reload_script(b"<html><body><h1>x</h1></body></html>")).unwrap();
        let script = out.find(RELOAD_SCRIPT_PATH).unwrap();
        assert!(script < out.find("</body>").unwrap());
    }

    #[test]
    fn traversal_is_rejected() {
        assert_eq!(sanitize_request_path("/../etc/passwd"), None);
        assert_eq!(sanitize_request_path("/assets/../../x"), None);
        assert_eq!(
            sanitize_request_path("/assets/css/main.css"),
            Some(PathBuf::from("assets/css/main.css"))
        );
        assert_eq!(sanitize_request_path("/"), Some(PathBuf::new()));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a/index.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("a.php")), "application/octet-stream");
    }
}
