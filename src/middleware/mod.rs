//! Middleware for the loan submission API

mod tracing;

pub use self::tracing::request_tracing;
