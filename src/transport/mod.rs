//! HTTP transport abstraction.
//!
//! The dispatcher never talks to the network directly. It hands a fully-formed
//! [`TransportRequest`] to an [`HttpTransport`] and gets back a
//! [`TransportResponse`] whose body can be consumed exactly once. The default
//! implementation is [`ReqwestTransport`]; tests and embedders can inject their
//! own to observe the final request or return synthetic responses.

pub mod client;

pub use client::ReqwestTransport;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;
use std::fmt;

use crate::error::{RequestError, Result};
use crate::request::TransportRequest;
use crate::stream::ByteStream;

/// Performs one HTTP exchange.
///
/// Implementations should stop work and return an error once
/// `request.cancellation` fires; the dispatcher reports the deadline itself.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Unread response body.
pub struct ResponseBody {
    inner: ByteStream,
}

impl ResponseBody {
    pub fn from_stream(stream: ByteStream) -> Self {
        Self { inner: stream }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::from_stream(crate::stream::from_chunks([bytes.into()]))
    }

    pub fn empty() -> Self {
        Self::from_stream(Box::pin(futures::stream::empty::<Result<Bytes>>()))
    }

    /// Read the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes> {
        let mut inner = self.inner;
        let mut buf = BytesMut::new();
        while let Some(chunk) = inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    pub async fn read_text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| RequestError::Decode(format!("Response body is not UTF-8: {e}")))
    }

    pub async fn read_json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Hand the live chunk stream to the caller.
    pub fn into_stream(self) -> ByteStream {
        self.inner
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// Raw response as returned by a transport.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub url: String,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn new(status: u16, url: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url: url.into(),
            body: ResponseBody::empty(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    /// 2xx check.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}
