//! HTTP 中间件

mod logging;

pub use logging::logging_middleware;
