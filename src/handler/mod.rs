//! Request handler module
//!
//! Maps request paths onto the content root and turns the filesystem entity
//! found there into a response.

pub mod dispatch;
pub mod resolve;
pub mod router;

// Re-export main entry point
pub use resolve::ContentRoot;
pub use router::handle_request;
