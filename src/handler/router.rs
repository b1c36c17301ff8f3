//! Request routing dispatch module
//!
//! Only `GET /` (and `HEAD /`) is served; everything else is 404.

use crate::config::AppState;
use crate::handler::serve_file;
use crate::http::{self, RequestDump};
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// The single route this server answers
pub const ROOT_PATH: &str = "/";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let response = if is_served_route(&parts) {
        if state.config.logging.dump_requests {
            dump_request(&parts, body, state.config.logging.max_dump_body).await;
        }
        serve_file::serve_target(&state, parts.method == Method::HEAD).await
    } else {
        http::build_404_response(&state.config.http.server_name)
    };

    if state.config.logging.access_log {
        log_access(&parts, &response, peer_addr, started, &state);
    }

    Ok(response)
}

fn is_served_route(parts: &Parts) -> bool {
    parts.uri.path() == ROOT_PATH && matches!(parts.method, Method::GET | Method::HEAD)
}

/// Read the body and log the request; failures only cost the dump
async fn dump_request<B>(parts: &Parts, body: B, max_body: usize)
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    match read_body_prefix(body, max_body).await {
        Ok(prefix) => {
            let dump = RequestDump::new(parts, prefix, max_body);
            logger::log_request_dump(&dump);
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Cannot dump request {} {}: {e}",
                parts.method, parts.uri
            ));
        }
    }
}

/// Read at most `max_body + 1` bytes of `body`
///
/// Stops pulling frames once the cap is passed, so an endless body costs at
/// most one extra frame. The extra byte tells the dump it was truncated.
async fn read_body_prefix<B>(body: B, max_body: usize) -> Result<Bytes, B::Error>
where
    B: Body<Data = Bytes>,
{
    let limit = max_body.saturating_add(1);
    let mut body = std::pin::pin!(body);
    let mut prefix = Vec::new();

    while prefix.len() < limit {
        let Some(frame) = body.frame().await else {
            break;
        };
        if let Ok(data) = frame?.into_data() {
            let take = data.len().min(limit - prefix.len());
            prefix.extend_from_slice(&data[..take]);
        }
    }

    Ok(Bytes::from(prefix))
}

fn log_access(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.to_string(),
    );
    entry.http_version = format!("{:?}", parts.version);
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Frame;
    use hyper::StatusCode;
    use std::path::PathBuf;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    const MIB: usize = 1024 * 1024;

    /// Streams 1 MiB frames and never ends, counting how many were pulled
    struct EndlessBody {
        frames: Arc<AtomicUsize>,
    }

    impl Body for EndlessBody {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            self.frames.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Some(Ok(Frame::data(Bytes::from(vec![b'x'; MIB])))))
        }
    }

    /// Fails on the first frame, like a client that hangs up mid-body
    struct BrokenBody;

    impl Body for BrokenBody {
        type Data = Bytes;
        type Error = String;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, String>>> {
            Poll::Ready(Some(Err("connection reset".to_string())))
        }
    }

    async fn collect_body(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    fn scratch_file(name: &str, content: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mockone-router-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: &'static str,
    ) -> (StatusCode, String, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "localhost")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap();
        let resp = handle_request(req, Arc::clone(state), peer()).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn test_get_root_serves_json() {
        let state = Arc::new(AppState::for_tests(&scratch_file("a.json", b"{\"a\":1}")));
        let (status, content_type, body) = send(&state, Method::GET, "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_get_root_serves_html() {
        let state = Arc::new(AppState::for_tests(&scratch_file("p.html", b"<p>hi</p>")));
        let (status, content_type, body) = send(&state, Method::GET, "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/html"));
        assert_eq!(body, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let state = Arc::new(AppState::for_tests(&scratch_file("same.json", b"[1,2,3]")));
        let first = send(&state, Method::GET, "/", "").await;
        for _ in 0..3 {
            assert_eq!(send(&state, Method::GET, "/", "").await, first);
        }
    }

    #[tokio::test]
    async fn test_query_string_still_matches_root() {
        let state = Arc::new(AppState::for_tests(&scratch_file("q.json", b"{}")));
        let (status, _, body) = send(&state, Method::GET, "/?id=7", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn test_get_with_body_is_served() {
        let state = Arc::new(AppState::for_tests(&scratch_file("b.json", b"{\"ok\":true}")));
        let (status, _, body) = send(&state, Method::GET, "/", "{\"q\":1}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_head_root_has_headers_only() {
        let state = Arc::new(AppState::for_tests(&scratch_file("h.json", b"{\"a\":1}")));
        let (status, content_type, body) = send(&state, Method::HEAD, "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_other_paths_and_methods_are_404() {
        let state = Arc::new(AppState::for_tests(&scratch_file("n.json", b"{}")));
        for (method, uri) in [
            (Method::GET, "/other"),
            (Method::GET, "/n.json"),
            (Method::POST, "/"),
            (Method::PUT, "/"),
            (Method::DELETE, "/"),
        ] {
            let (status, _, _) = send(&state, method.clone(), uri, "x").await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_deleted_target_is_404() {
        let path = scratch_file("deleted.json", b"{}");
        let state = Arc::new(AppState::for_tests(&path));
        std::fs::remove_file(&path).unwrap();

        let (status, _, _) = send(&state, Method::GET, "/", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_endless_body_is_not_buffered() {
        let state = Arc::new(AppState::for_tests(&scratch_file("big.json", b"{\"big\":1}")));
        assert_eq!(state.config.logging.max_dump_body, 65_536);

        let frames = Arc::new(AtomicUsize::new(0));
        let req = Request::get("/")
            .body(EndlessBody {
                frames: Arc::clone(&frames),
            })
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state), peer()).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(collect_body(resp).await, "{\"big\":1}");
        // 64 KiB cap fits in the first 1 MiB frame
        assert_eq!(frames.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_body_prefix_stops_at_cap() {
        let frames = Arc::new(AtomicUsize::new(0));
        let body = EndlessBody {
            frames: Arc::clone(&frames),
        };
        let prefix = read_body_prefix(body, 3 * MIB).await.unwrap();
        assert_eq!(prefix.len(), 3 * MIB + 1);
        assert_eq!(frames.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_body_prefix_keeps_short_body() {
        let body = Full::new(Bytes::from_static(b"{\"q\":1}"));
        assert_eq!(read_body_prefix(body, 1024).await.unwrap(), "{\"q\":1}");
    }

    #[tokio::test]
    async fn test_broken_body_still_serves_file() {
        let state = Arc::new(AppState::for_tests(&scratch_file("broken.json", b"{\"a\":1}")));
        assert!(state.config.logging.dump_requests);

        let req = Request::get("/").body(BrokenBody).unwrap();
        let resp = handle_request(req, Arc::clone(&state), peer()).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(collect_body(resp).await, "{\"a\":1}");
    }
}
