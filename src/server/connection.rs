// Connection handling module
// Serves one accepted TCP connection with hyper's HTTP/1 driver

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Request activity on one connection
struct Activity {
    opened: Instant,
    /// Last request start or finish, in ms since `opened`
    last_ms: AtomicU64,
    in_flight: AtomicUsize,
}

impl Activity {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            last_ms: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn touch(&self) {
        let ms = u64::try_from(self.opened.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_ms.store(ms, Ordering::Relaxed);
    }

    fn request_started(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
    }

    fn request_finished(&self) {
        self.touch();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// When the connection becomes idle for `limit`, or a re-check point
    /// while a request is still running
    fn idle_deadline(&self, limit: Duration) -> Instant {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return Instant::now() + limit;
        }
        self.opened + Duration::from_millis(self.last_ms.load(Ordering::Relaxed)) + limit
    }

    fn is_idle(&self, limit: Duration) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0 && Instant::now() >= self.idle_deadline(limit)
    }
}

/// Handle a single connection in a spawned task.
///
/// Header reads are bounded by `read_timeout`. With keep-alive on, a
/// connection that has had no request for `keep_alive_timeout` seconds is
/// closed gracefully; a request in progress is never cut.
pub fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let idle_limit = Duration::from_secs(performance.keep_alive_timeout);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(!idle_limit.is_zero())
            .header_read_timeout(Duration::from_secs(performance.read_timeout));

        let activity = Arc::new(Activity::new());
        let service_state = Arc::clone(&state);
        let service_activity = Arc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                let activity = Arc::clone(&service_activity);
                async move {
                    activity.request_started();
                    let response = handler::handle_request(req, state, peer_addr).await;
                    activity.request_finished();
                    response
                }
            }),
        );
        tokio::pin!(conn);

        // Without keep-alive hyper closes after one response on its own
        let mut closing = idle_limit.is_zero();
        let result = loop {
            let deadline = activity.idle_deadline(idle_limit);
            tokio::select! {
                result = conn.as_mut() => break result,
                () = sleep_until(deadline), if !closing => {
                    if activity.is_idle(idle_limit) {
                        conn.as_mut().graceful_shutdown();
                        closing = true;
                    }
                }
            }
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }
    });
}
