//! HTTP protocol layer module
//!
//! Content-type lookup, request dumps and response builders, independent of
//! how the server wires them together.

pub mod dump;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use dump::RequestDump;
pub use response::{build_404_response, build_500_response, build_file_response};
