//! Secure listener serving the muxer while the plain listener redirects.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use hostmux::config::TlsConfig;
use hostmux::http::HttpServer;
use hostmux::lifecycle::Shutdown;
use hostmux::net::listener::BoundListeners;
use hostmux::net::tls::load_tls_config;
use hostmux::security::headers::{CACHE_CONTROL_VALUE, HSTS_VALUE, VARY_VALUE};
use tokio::sync::mpsc;

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::none())
        .resolve("localhost", SocketAddr::from(([127, 0, 0, 1], 0)))
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn secure_listener_serves_and_plain_listener_redirects() {
    common::install_crypto_provider();
    let site = common::site();
    let (cert_path, key_path) = common::self_signed(site.path());
    let tls = load_tls_config(&cert_path, &key_path).await.unwrap();

    let secure = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let plain = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let https_port = secure.local_addr().unwrap().port();
    let http_port = plain.local_addr().unwrap().port();

    let mut config = common::config(site.path());
    config.listener.tls = Some(TlsConfig { cert_path, key_path });
    config.hosts.allowed.insert(format!("localhost:{https_port}"), true);

    let listeners = BoundListeners::from_std(plain, Some((secure, tls))).unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    let server = tokio::spawn(async move { server.run(listeners, config_updates, server_shutdown).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client()
        .get(format!("https://localhost:{https_port}/robots.txt"))
        .send()
        .await
        .expect("secure listener unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["vary"], VARY_VALUE);
    assert_eq!(res.headers()["cache-control"], CACHE_CONTROL_VALUE);
    assert_eq!(res.headers()["strict-transport-security"], HSTS_VALUE);
    assert_eq!(res.text().await.unwrap(), "User-agent: *");

    let res = client()
        .get(format!("http://localhost:{http_port}/docs/guide.txt?v=2"))
        .send()
        .await
        .expect("plain listener unreachable");
    assert_eq!(res.status(), 301);
    assert_eq!(
        res.headers()["location"],
        format!("https://localhost:{https_port}/docs/guide.txt?v=2").as_str()
    );

    let res = client()
        .get(format!("http://localhost:{http_port}/"))
        .header("host", "evil.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    shutdown.trigger();
    server.await.unwrap().unwrap();

    for port in [https_port, http_port] {
        assert!(
            TcpStream::connect(("127.0.0.1", port)).is_err(),
            "port {port} still accepting after shutdown"
        );
    }
}
