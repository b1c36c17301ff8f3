//! Request dump module
//!
//! Renders an incoming request the way it looked on the wire so a developer
//! can see exactly what a client sent to the mock.

use hyper::body::Bytes;
use hyper::http::request::Parts;
use std::fmt;

/// A captured request: request line, headers in arrival order, body
#[derive(Debug, Clone)]
pub struct RequestDump {
    request_line: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    /// Set to the cap when the body went past it
    truncated_at: Option<usize>,
}

impl RequestDump {
    /// Capture a request, keeping at most `max_body` body bytes
    ///
    /// `body` may already be cut short by the caller; anything longer than
    /// `max_body` is marked as truncated.
    pub fn new(parts: &Parts, body: Bytes, max_body: usize) -> Self {
        let request_line = format!("{} {} {:?}", parts.method, parts.uri, parts.version);

        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let (body, truncated_at) = if body.len() > max_body {
            (body.slice(..max_body), Some(max_body))
        } else {
            (body, None)
        };

        Self {
            request_line,
            headers,
            body,
            truncated_at,
        }
    }
}

impl fmt::Display for RequestDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.request_line)?;
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        f.write_str("\r\n")?;
        f.write_str(&String::from_utf8_lossy(&self.body))?;
        if let Some(limit) = self.truncated_at {
            write!(f, "... (body truncated at {limit} bytes)")?;
        }
        Ok(())
    }
}
