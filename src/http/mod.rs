//! HTTP module
//!
//! Converts router output into hyper responses.

pub mod response;

pub use response::{build_api_response, cors_headers};
