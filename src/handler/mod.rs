//! Request handler module
//!
//! Responsible for request routing dispatch and business logic: the prompt
//! relay endpoint and static frontend serving with the SPA catch-all.

pub mod relay;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
