//! The request dispatch pipeline
//!
//! Every verb funnels through [`Dispatcher::send`]:
//!
//! 1. shape the body ([`encode_body`]);
//! 2. apply the request interceptor, if any;
//! 3. merge config, method, body and computed `Content-Type`;
//! 4. arm the deadline when a timeout is configured;
//! 5. execute the transport call;
//! 6. run the response interceptor, if any, on every response;
//! 7. fail fast on a non-2xx status without touching the body;
//! 8. decode by content type and optionally wrap in a [`ResponseEnvelope`].
//!
//! [`Dispatcher::stream`] is the exception: a plain JSON POST with no
//! interceptors, no deadline and no decoding.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::body::{Body, EncodedBody, encode_body, encode_json};
use crate::builder::DispatchBuilder;
use crate::config::{BodyEncoding, DispatcherConfig};
use crate::error::{RequestError, Result};
use crate::interceptor::{InterceptorSlot, RequestInterceptor, ResponseInterceptor};
use crate::request::{RequestConfig, TransportRequest};
use crate::response::{Payload, ResponseEnvelope, ResponseHead};
use crate::stream::{ByteStream, TextStream, utf8_text};
use crate::telemetry::HTTP_TARGET;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Per-call switches for [`Dispatcher::send`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Send multipart bodies as flattened JSON instead.
    pub convert_form: bool,
}

struct Inner {
    config: DispatcherConfig,
    transport: Arc<dyn HttpTransport>,
    request_interceptor: InterceptorSlot<dyn RequestInterceptor>,
    response_interceptor: InterceptorSlot<dyn ResponseInterceptor>,
}

/// HTTP client facade bound to one base address.
///
/// Cloning is cheap and clones share configuration and interceptor slots.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .field("request_interceptor", &self.inner.request_interceptor.is_set())
            .field("response_interceptor", &self.inner.response_interceptor.is_set())
            .finish()
    }
}

impl Dispatcher {
    /// `timeout_ms <= 0` disables the deadline; `encode_body` selects base64 JSON bodies.
    pub fn new(base_address: impl Into<String>, timeout_ms: i64, encode_body: bool) -> Self {
        Self::from_config(
            DispatcherConfig::builder(base_address)
                .timeout_ms(timeout_ms)
                .encode_body(encode_body)
                .build(),
        )
    }

    /// Build on the default `reqwest` transport.
    pub fn from_config(config: DispatcherConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: DispatcherConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                request_interceptor: InterceptorSlot::empty(),
                response_interceptor: InterceptorSlot::empty(),
            }),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    pub fn base_address(&self) -> &str {
        &self.inner.config.base_address
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.config.timeout
    }

    pub fn body_encoding(&self) -> BodyEncoding {
        self.inner.config.body_encoding
    }

    /// Replace the request interceptor. Calls already dispatched keep the old one.
    pub fn set_request_interceptor(&self, interceptor: impl RequestInterceptor + 'static) {
        self.inner.request_interceptor.set(Arc::new(interceptor));
    }

    /// Replace the response interceptor. Calls already dispatched keep the old one.
    pub fn set_response_interceptor(&self, interceptor: impl ResponseInterceptor + 'static) {
        self.inner.response_interceptor.set(Arc::new(interceptor));
    }

    pub fn clear_request_interceptor(&self) {
        self.inner.request_interceptor.clear();
    }

    pub fn clear_response_interceptor(&self) {
        self.inner.response_interceptor.clear();
    }

    pub fn get(&self, path: impl Into<String>) -> DispatchBuilder<'_> {
        DispatchBuilder::new(self, Method::GET, path.into(), None)
    }

    pub fn post(&self, path: impl Into<String>, body: impl Into<Body>) -> DispatchBuilder<'_> {
        DispatchBuilder::new(self, Method::POST, path.into(), Some(body.into()))
    }

    pub fn put(&self, path: impl Into<String>, body: impl Into<Body>) -> DispatchBuilder<'_> {
        DispatchBuilder::new(self, Method::PUT, path.into(), Some(body.into()))
    }

    pub fn patch(&self, path: impl Into<String>, body: impl Into<Body>) -> DispatchBuilder<'_> {
        DispatchBuilder::new(self, Method::PATCH, path.into(), Some(body.into()))
    }

    pub fn delete(&self, path: impl Into<String>, body: impl Into<Body>) -> DispatchBuilder<'_> {
        DispatchBuilder::new(self, Method::DELETE, path.into(), Some(body.into()))
    }

    /// Run one call through the full pipeline and return the envelope.
    ///
    /// A `None` body sends no body and computes no `Content-Type`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        config: Option<RequestConfig>,
        body: Option<&Body>,
        options: SendOptions,
    ) -> Result<ResponseEnvelope<T>> {
        let url = self.inner.config.url_for(path);

        let encoded = match body {
            Some(body) => encode_body(body, options.convert_form, self.inner.config.body_encoding)?,
            None => EncodedBody::empty(),
        };

        let config = config.unwrap_or_default();
        let config = match self.inner.request_interceptor.snapshot() {
            Some(interceptor) => interceptor.intercept(config).map_err(interceptor_failure)?,
            None => config,
        };
        let response_interceptor = self.inner.response_interceptor.snapshot();

        let request = TransportRequest::assemble(
            method,
            url,
            config,
            encoded.body,
            encoded.content_type,
        );
        tracing::debug!(target: HTTP_TARGET, method = %request.method, url = %request.url, "dispatching request");

        let result = match self.inner.config.timeout {
            Some(timeout) => {
                let token = CancellationToken::new();
                let request = request.with_cancellation(token.clone());
                let exchange = self.exchange(request, response_interceptor);
                tokio::select! {
                    biased;
                    result = exchange => result,
                    _ = tokio::time::sleep(timeout) => {
                        token.cancel();
                        Err(RequestError::Cancelled { after: timeout })
                    }
                }
            }
            None => self.exchange(request, response_interceptor).await,
        };

        let (payload, head) = result.inspect_err(|e| {
            tracing::debug!(target: HTTP_TARGET, err = %e, "request failed");
        })?;
        Ok(head.wrap(payload.into_typed()?))
    }

    /// Transport call, response interceptor, status check and body read.
    async fn exchange(
        &self,
        request: TransportRequest,
        response_interceptor: Option<Arc<dyn ResponseInterceptor>>,
    ) -> Result<(Payload, ResponseHead)> {
        let response = self.inner.transport.execute(request).await?;

        if let Some(interceptor) = response_interceptor {
            interceptor
                .on_response(&response)
                .map_err(interceptor_failure)?;
        }

        if !response.ok() {
            tracing::warn!(target: HTTP_TARGET, url = %response.url, status = response.status, "request failed with error status");
            return Err(RequestError::status(response.status, response.url));
        }
        tracing::debug!(target: HTTP_TARGET, url = %response.url, status = response.status, "response received");

        Payload::read(response).await
    }

    /// POST a JSON body and hand back the live response body.
    ///
    /// No interceptors, deadline or decoding apply. Error statuses are
    /// rejected before the stream is returned.
    pub async fn stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        body: &B,
    ) -> Result<ByteStream> {
        let value = serde_json::to_value(body)
            .map_err(|e| RequestError::Encoding(format!("Failed to serialize body: {e}")))?;
        let encoded = encode_json(&value, BodyEncoding::Plain)?;
        let request = TransportRequest::assemble(
            Method::POST,
            self.inner.config.url_for(path),
            config.unwrap_or_default(),
            encoded.body,
            encoded.content_type,
        );
        tracing::debug!(target: HTTP_TARGET, url = %request.url, "opening stream");

        let response = self.inner.transport.execute(request).await?;
        if !response.ok() {
            return Err(RequestError::status(response.status, response.url));
        }
        Ok(response.body.into_stream())
    }

    /// [`Dispatcher::stream`] decoded into UTF-8 text chunks.
    pub async fn stream_text<B: Serialize + ?Sized>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        body: &B,
    ) -> Result<TextStream> {
        Ok(utf8_text(self.stream(path, config, body).await?))
    }
}

fn interceptor_failure(error: RequestError) -> RequestError {
    match error {
        RequestError::Interceptor(_) => error,
        other => RequestError::Interceptor(other.to_string()),
    }
}
