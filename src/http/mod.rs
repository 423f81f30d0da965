//! HTTP transport and retry policy.

pub mod retry;
mod transport;

pub use retry::{DEFAULT_BACKOFF_UNIT, DEFAULT_RETRIES, RetryMode, backoff_delay};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{HttpResponse, ReqwestTransport, Transport};
