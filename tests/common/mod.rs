//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::{Method, Request};
use hostmux::config::{RouteConfig, RouteTarget, ServerConfig, TlsConfig};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const CSS: &str = "body { color: #222; }";
pub const NOT_FOUND_PAGE: &str = "<h1>Nothing here</h1>";
pub const SECRET: &str = "do not serve";

/// Site layout:
///
/// ```text
/// <tmp>/secret.txt
/// <tmp>/public/404.html
/// <tmp>/static/css/site.css
/// <tmp>/static/empty/            (no index.html)
/// <tmp>/docs/index.html
/// <tmp>/docs/guide.txt
/// <tmp>/robots.txt
/// ```
pub fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("static/css")).unwrap();
    fs::create_dir_all(root.join("static/empty")).unwrap();
    fs::create_dir_all(root.join("public")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();

    fs::write(root.join("static/css/site.css"), CSS).unwrap();
    fs::write(root.join("public/404.html"), NOT_FOUND_PAGE).unwrap();
    fs::write(root.join("secret.txt"), SECRET).unwrap();
    fs::write(root.join("docs/index.html"), "<h1>Docs</h1>").unwrap();
    fs::write(root.join("docs/guide.txt"), "read me").unwrap();
    fs::write(root.join("robots.txt"), "User-agent: *").unwrap();

    dir
}

/// Production config over the fixture site. The TLS section is only
/// consulted for the request scheme; nothing here loads it.
pub fn config(site: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();

    config.listener.tls = Some(TlsConfig {
        cert_path: site.join("cert.pem"),
        key_path: site.join("key.pem"),
    });

    config.hosts.allowed.insert("example.com".into(), true);
    config.hosts.allowed.insert("example.com:10443".into(), true);
    config.hosts.allowed.insert("disabled.com".into(), false);
    config.hosts.referrers = vec!["cdn.example.net".into()];

    config.static_files.root = site.join("static");
    config.static_files.not_found_page = site.join("public/404.html");

    config.routes.push(route("docs", "GET", "/docs/*page", RouteTarget::Directory { root: site.join("docs") }));
    config.routes.push(route("robots", "GET", "/robots.txt", RouteTarget::File { path: site.join("robots.txt") }));
    config.routes.push(route(
        "old-blog",
        "*",
        "/old",
        RouteTarget::Redirect { location: "/new".into(), permanent: true },
    ));

    config
}

pub fn route(name: &str, method: &str, path: &str, target: RouteTarget) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        method: method.into(),
        path: path.into(),
        target,
    }
}

pub fn request(method: Method, host: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(HOST, host)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Bind an ephemeral local port and return the listener with its address.
pub async fn local_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a backend that waits `delay`, then answers 200 with the request
/// head it received as the body.
pub async fn start_echo_backend(delay: Duration) -> SocketAddr {
    let (listener, addr) = local_listener().await;

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut read = 0;
                        while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") && read < buf.len() {
                            match socket.read(&mut buf[read..]).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => read += n,
                            }
                        }
                        tokio::time::sleep(delay).await;

                        let head = String::from_utf8_lossy(&buf[..read]).to_string();
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            head.len(),
                            head
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn dead_address() -> SocketAddr {
    let (listener, addr) = local_listener().await;
    drop(listener);
    addr
}

/// Write a self-signed certificate for `localhost` into `dir`, returning
/// the certificate and key paths.
pub fn self_signed(dir: &Path) -> (PathBuf, PathBuf) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    fs::write(&cert_path, cert.pem()).unwrap();
    fs::write(&key_path, key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}

/// Test builds link more than one rustls backend, so pick one explicitly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
