// tests/dev_server.rs

mod common;

use std::net::SocketAddr;
use std::path::Path;

use assetpipe::server::{DevServer, ReloadHub, RELOAD_SCRIPT_PATH, RELOAD_SSE_PATH};
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::common::{init_tracing, wait_until, with_timeout, write_file, TestResult};

async fn start(root: &Path, hub: ReloadHub) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let server = DevServer::bind("127.0.0.1", 0, root, hub).await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.serve());
    Ok(addr)
}

async fn get(addr: SocketAddr, path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

#[tokio::test]
async fn html_pages_get_the_reload_client() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    write_file(dir.path(), "index.html", "<html><body><h1>Home</h1></body></html>");
    let addr = start(dir.path(), ReloadHub::new()).await?;

    let response = with_timeout(get(addr, "/")).await?;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("text/html"));
    let script = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);
    let script_at = response.find(&script).expect("reload client injected");
    assert!(script_at < response.find("</body>").unwrap());
    Ok(())
}

#[tokio::test]
async fn assets_are_served_untouched() -> TestResult {
    let dir = tempdir()?;
    write_file(dir.path(), "assets/css/main.css", ".a{color:red}");
    let addr = start(dir.path(), ReloadHub::new()).await?;

    let response = with_timeout(get(addr, "/assets/css/main.css")).await?;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("text/css"));
    assert!(response.ends_with(".a{color:red}"));
    Ok(())
}

#[tokio::test]
async fn missing_files_are_404() -> TestResult {
    let dir = tempdir()?;
    let addr = start(dir.path(), ReloadHub::new()).await?;

    let response = with_timeout(get(addr, "/nope.html")).await?;

    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    Ok(())
}

#[tokio::test]
async fn reload_client_script_is_served() -> TestResult {
    let dir = tempdir()?;
    let addr = start(dir.path(), ReloadHub::new()).await?;

    let response = with_timeout(get(addr, RELOAD_SCRIPT_PATH)).await?;

    assert!(response.contains("application/javascript"));
    assert!(response.contains(RELOAD_SSE_PATH));
    Ok(())
}

#[tokio::test]
async fn connected_browsers_receive_reload_events() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let hub = ReloadHub::new();
    let addr = start(dir.path(), hub.clone()).await?;

    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "GET {RELOAD_SSE_PATH} HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await?;

    wait_until(|| hub.client_count() == 1).await;
    assert_eq!(hub.notify_reloadable(), 1);

    let received = with_timeout(async {
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "stream closed early");
            seen.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&seen).into_owned();
            if text.contains("data: reload") {
                return text;
            }
        }
    })
    .await;

    assert!(received.contains("text/event-stream"));
    Ok(())
}
