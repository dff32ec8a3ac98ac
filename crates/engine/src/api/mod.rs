//! HTTP and live-stream entry points.

pub mod http;
pub mod stream;

pub use http::{routes, ApiError};
