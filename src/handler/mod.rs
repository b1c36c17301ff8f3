//! Request handler module
//!
//! Route check, request dump and the file response for the single endpoint.

pub mod router;
pub mod serve_file;

// Re-export main entry point
pub use router::handle_request;
