//! HttpFetcher against a minimal local HTTP server

use modkit_core::resolver::{HttpFetcher, MarkupFetcher, ModuleResolver};
use modkit_core::{ResolveError, Url};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve a single fixed response per connection and return the base URL
async fn serve(status_line: &'static str, body: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Url::parse(&format!("http://{}/index.html", addr)).unwrap()
}

#[tokio::test]
async fn test_fetch_success_returns_body() {
    let origin = serve("200 OK", "<div>ok</div>").await;
    let fetcher = HttpFetcher::new();

    let response = fetcher
        .fetch(&origin.join("modules/pricing/pricing.html").unwrap())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<div>ok</div>");
}

#[tokio::test]
async fn test_resolver_over_http() {
    let origin = serve("200 OK", "<section>pricing</section>").await;
    let resolver = ModuleResolver::builder(origin).build();

    let html = resolver.get_module_markup("pricing").await.unwrap();
    assert_eq!(html, "<section>pricing</section>");
}

#[tokio::test]
async fn test_resolver_over_http_404() {
    let origin = serve("404 Not Found", "missing").await;
    let resolver = ModuleResolver::builder(origin).build();

    let err = resolver.get_module_markup("pricing").await.unwrap_err();
    match err {
        ResolveError::Fetch(fetch) => assert_eq!(fetch.status(), Some(404)),
        other => panic!("expected Fetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let origin = Url::parse(&format!("http://{}/", addr)).unwrap();
    let resolver = ModuleResolver::builder(origin).build();

    let err = resolver.get_module_markup("pricing").await.unwrap_err();
    match err {
        ResolveError::Fetch(fetch) => assert_eq!(fetch.status(), None),
        other => panic!("expected Fetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_with_timeout_builds_client() {
    let origin = serve("200 OK", "<p></p>").await;
    let fetcher = HttpFetcher::with_timeout(Some(Duration::from_secs(5))).unwrap();

    let response = fetcher.fetch(&origin).await.unwrap();
    assert!(response.is_success());
}
