//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! relay and static-asset business logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_404_response_with_detail, build_413_response,
    build_json_error, build_json_response, build_options_response,
};
