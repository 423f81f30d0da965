//! Client for a marketing-data append service: send partial identity fields,
//! receive enriched contact data such as an email address.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod response;

pub use client::{API_KEY_PARAM, Client, RequestParams, SERVICE_PARAM};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::AppendError;
pub use http::{HttpResponse, ReqwestTransport, RetryMode, Transport};
pub use response::{AppendResult, AppendResultExt};
