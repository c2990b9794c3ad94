//! # request-dispatch
//!
//! A small stateful HTTP client facade. A [`Dispatcher`] owns a base address,
//! an optional per-call deadline and a body-encoding mode, and layers on top
//! of a pluggable [`HttpTransport`]:
//!
//! - one replaceable request interceptor and one response interceptor;
//! - body shaping for JSON values, multipart forms and raw strings;
//! - content-type driven decoding into a payload or a full [`ResponseEnvelope`];
//! - a streaming POST that hands back the live response body.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use request_dispatch::prelude::*;
//! use serde_json::{Value, json};
//!
//! # async fn run() -> Result<(), RequestError> {
//! let dispatcher = Dispatcher::new("https://api.example.com", 5_000, false);
//! dispatcher.set_request_interceptor(|config: RequestConfig| config.bearer_auth("token"));
//!
//! let created: Value = dispatcher
//!     .post("/items", json!({ "name": "a" }))
//!     .send()
//!     .await?;
//!
//! let full = dispatcher.get("/items").send_full::<Value>().await?;
//! println!("{} {}", full.status, created);
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod stream;
pub mod telemetry;
pub mod transport;

pub use body::{Body, FormData, FormValue, WireBody};
pub use builder::DispatchBuilder;
pub use config::{BodyEncoding, DispatcherConfig, DispatcherConfigBuilder};
pub use dispatcher::{Dispatcher, SendOptions};
pub use error::{ErrorCategory, RequestError, Result};
pub use interceptor::{LoggingInterceptor, RequestInterceptor, ResponseInterceptor};
pub use request::{RequestConfig, TransportRequest};
pub use response::{Payload, ResponseEnvelope};
pub use stream::{ByteStream, TextStream};
pub use transport::{HttpTransport, ReqwestTransport, ResponseBody, TransportResponse};

/// Convenient imports for callers.
pub mod prelude {
    pub use crate::body::{Body, FormData, FormValue};
    pub use crate::config::{BodyEncoding, DispatcherConfig};
    pub use crate::dispatcher::{Dispatcher, SendOptions};
    pub use crate::error::RequestError;
    pub use crate::interceptor::{LoggingInterceptor, RequestInterceptor, ResponseInterceptor};
    pub use crate::request::RequestConfig;
    pub use crate::response::ResponseEnvelope;
    pub use crate::transport::{HttpTransport, TransportResponse};
}
