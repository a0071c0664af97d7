//! Serving over real sockets and graceful shutdown.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use hostmux::config::{RouteTarget, ServerConfig};
use hostmux::http::HttpServer;
use hostmux::lifecycle::Shutdown;
use hostmux::net::listener::BoundListeners;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod common;

use common::route;

struct Running {
    addr: SocketAddr,
    shutdown: Shutdown,
    server: JoinHandle<Result<(), hostmux::http::ServerError>>,
}

/// Plain-only server (no TLS) on an ephemeral port, proxying `/slow/*` to
/// a backend that answers after `backend_delay`.
async fn start(site: &std::path::Path, backend_delay: Duration, grace_secs: u64) -> Running {
    let backend = common::start_echo_backend(backend_delay).await;

    let plain = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = plain.local_addr().unwrap();

    let mut config: ServerConfig = common::config(site);
    config.listener.tls = None;
    config.listener.http_address = addr.to_string();
    config.hosts.allowed.insert(addr.to_string(), true);
    config.timeouts.shutdown_grace_secs = grace_secs;
    config.routes.push(route(
        "slow",
        "GET",
        "/slow/*rest",
        RouteTarget::Proxy { upstream: backend.to_string() },
    ));

    let listeners = BoundListeners::from_std(plain, None).unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    let server = tokio::spawn(async move { server.run(listeners, config_updates, server_shutdown).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    Running { addr, shutdown, server }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn serves_over_plain_http_without_tls() {
    let site = common::site();
    let running = start(site.path(), Duration::ZERO, 5).await;

    let res = client()
        .get(format!("http://{}/robots.txt", running.addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["strict-transport-security"], "max-age=15768000; includeSubDomains");
    assert_eq!(res.text().await.unwrap(), "User-agent: *");

    let res = client()
        .get(format!("http://{}/robots.txt", running.addr))
        .header("host", "evil.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert!(res.headers().get("strict-transport-security").is_none());

    running.shutdown.trigger();
    running.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn in_flight_request_completes_across_shutdown() {
    let site = common::site();
    let running = start(site.path(), Duration::from_millis(500), 5).await;

    let url = format!("http://{}/slow/work", running.addr);
    let in_flight = tokio::spawn(async move { client().get(url).send().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    running.shutdown.trigger();

    let res = in_flight.await.unwrap().expect("in-flight request was cut off");
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().starts_with("GET /slow/work"));

    running.server.await.unwrap().unwrap();

    let refused = client()
        .get(format!("http://{}/robots.txt", running.addr))
        .timeout(Duration::from_secs(2))
        .send()
        .await;
    assert!(refused.is_err(), "new connections must be refused after shutdown");
}

#[tokio::test]
async fn grace_period_bounds_shutdown() {
    let site = common::site();
    let running = start(site.path(), Duration::from_secs(30), 1).await;

    let url = format!("http://{}/slow/stuck", running.addr);
    let stuck = tokio::spawn(async move { client().get(url).send().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    running.shutdown.trigger();
    running.server.await.unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5), "shutdown ignored the grace period");

    let outcome = tokio::time::timeout(Duration::from_secs(5), stuck).await;
    assert!(matches!(outcome, Ok(Ok(Err(_)))), "stuck request should have been closed");
}
