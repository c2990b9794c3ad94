//! Per-call request options and the final outbound request.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use crate::body::WireBody;
use crate::error::{RequestError, Result};

/// Caller-supplied transport options for one call.
///
/// The pipeline only touches `headers`; everything in `options` (credentials,
/// mode, cache, ...) is forwarded to the transport untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub headers: HeaderMap,
    pub options: BTreeMap<String, String>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, replacing any previous value with the same name.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            RequestError::Configuration(format!("Invalid header name '{name}': {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            RequestError::Configuration(format!("Invalid header value for '{name}': {e}"))
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set an opaque pass-through option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Bearer token shorthand, handy inside request interceptors.
    pub fn bearer_auth(self, token: &str) -> Result<Self> {
        self.header("authorization", &format!("Bearer {token}"))
    }
}

/// Fully-formed request handed to an [`HttpTransport`](crate::transport::HttpTransport).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<WireBody>,
    pub options: BTreeMap<String, String>,
    /// Fires when the dispatch deadline elapses. Transports should abort on it.
    pub cancellation: Option<CancellationToken>,
}

impl TransportRequest {
    /// Merge a (possibly intercepted) config with the computed method, body and
    /// content type. A `Content-Type` already present in the config is kept.
    pub fn assemble(
        method: Method,
        url: String,
        config: RequestConfig,
        body: Option<WireBody>,
        content_type: Option<&'static str>,
    ) -> Self {
        let RequestConfig {
            mut headers,
            options,
        } = config;
        if let Some(content_type) = content_type
            && !headers.contains_key(CONTENT_TYPE)
        {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Self {
            method,
            url,
            headers,
            body,
            options,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
