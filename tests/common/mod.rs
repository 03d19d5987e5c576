//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use onion::net::{Payload, RawRequest, RawResponse};
use onion::{HttpServer, RequestHandler, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Build a bodiless raw request with the given headers.
#[allow(dead_code)]
pub fn request(method: Method, uri: &str, headers: &[(&'static str, &'static str)]) -> RawRequest {
    let mut raw = RawRequest::new(method, uri.parse().unwrap());
    for &(name, value) in headers {
        raw.headers
            .append(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    raw
}

/// Bytes the response was ended with, as text. Empty when nothing was written.
#[allow(dead_code)]
pub fn body_text(res: &RawResponse) -> String {
    let bytes = res.payload().and_then(Payload::bytes).unwrap_or_default();
    String::from_utf8_lossy(bytes).into_owned()
}

/// A running test server.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
    }
}

/// Serve `handler` on an ephemeral local port.
#[allow(dead_code)]
pub async fn start_server(handler: RequestHandler) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let task = tokio::spawn(async move {
        HttpServer::new(handler)
            .run(listener, server_shutdown)
            .await
            .expect("server failed");
    });

    TestServer {
        addr,
        shutdown,
        task,
    }
}

/// HTTP client that never goes through a system proxy.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
