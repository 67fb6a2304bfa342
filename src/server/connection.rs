// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Decrements the active connection counter however the connection task ends
struct ConnectionGuard {
    state: Arc<AppState>,
}

impl ConnectionGuard {
    fn counter(&self) -> &AtomicUsize {
        &self.state.active_connections
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter().fetch_sub(1, Ordering::SeqCst);
    }
}

/// Accept a connection, enforcing the optional connection cap.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
) {
    // Increment first, then check the limit, so concurrent accepts cannot overshoot
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);
    let guard = ConnectionGuard {
        state: Arc::clone(state),
    };

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= max_conn {
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_debug(&format!("Accepted connection from {peer_addr}"));
    handle_connection(stream, guard);
}

/// Serve one connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive and the header read timeout
/// 3. Serves requests until the client closes or errors
///
/// Dropping the connection future drops any in-flight response body, which
/// closes the file being streamed.
fn handle_connection(stream: tokio::net::TcpStream, guard: ConnectionGuard) {
    tokio::spawn(async move {
        let state = Arc::clone(&guard.state);
        let io = TokioIo::new(stream);
        let performance = &state.config.performance;

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(performance.keep_alive)
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.header_read_timeout));

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move { Ok::<_, Infallible>(handler::handle_request(req, &state.site).await) }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        drop(guard);
    });
}
