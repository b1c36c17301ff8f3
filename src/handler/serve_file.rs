//! Serve target response module
//!
//! Reads the target from disk on every request so edits show up immediately.

use crate::config::AppState;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io;
use tokio::fs;

/// Answer with the target file, or 404/500 when it cannot be read
pub async fn serve_target(state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    let target = &state.target;
    let server_name = &state.config.http.server_name;

    match fs::read(target.path()).await {
        Ok(content) => http::build_file_response(
            Bytes::from(content),
            target.content_type(),
            server_name,
            is_head,
        ),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            logger::log_warning(&format!(
                "Serve target missing '{}': {e}",
                target.path().display()
            ));
            http::build_404_response(server_name)
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                target.path().display()
            ));
            http::build_500_response(server_name)
        }
    }
}
