// Server loop module
// Accepts connections until a shutdown signal arrives, then drains in-flight connections

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the connection counter
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop until `shutdown` resolves.
///
/// After shutdown the listener is closed immediately; open connections get
/// up to the connection timeout to finish.
pub async fn run_server<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown(signal);
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&active_connections, state.config.connection_timeout()).await;
}

/// Wait for active connections to reach zero or the deadline to pass
async fn drain_connections(active: &AtomicUsize, deadline: Duration) {
    let deadline = tokio::time::Instant::now() + deadline;

    while active.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutting down with {} connection(s) still open",
                active.load(Ordering::SeqCst)
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use crate::store::MemoryStore;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_requests_until_shutdown() {
        let mut config = Config::load_with_env("tests/does-not-exist", HashMap::new()).unwrap();
        config.http.max_body_size = 64;
        let state = Arc::new(AppState::new(config, Arc::new(MemoryStore::new())));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(run_server(listener, state, async move {
            let _ = rx.await;
            "test"
        }));

        let body = r#"{"name":"A","description":"B"}"#;
        let response = raw_request(
            addr,
            &format!(
                "POST /api/v1/items HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 201"), "{response}");
        assert!(response.to_ascii_lowercase().contains("access-control-allow-origin: *"));
        assert!(response.contains(r#""name":"A""#));

        let response = raw_request(
            addr,
            "GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404"), "{response}");
        assert!(response.contains(r#""message":"Route not found""#));

        let big = "x".repeat(100);
        let response = raw_request(
            addr,
            &format!(
                "POST /api/v1/items HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{big}",
                big.len()
            ),
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 413"), "{response}");

        tx.send(()).unwrap();
        server.await.unwrap();
    }
}
