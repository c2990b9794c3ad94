//! Verb-level request builder.
//!
//! Returned by [`Dispatcher::get`], [`Dispatcher::post`] and friends. Each
//! builder binds its parameters onto [`Dispatcher::send`].

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::body::Body;
use crate::dispatcher::{Dispatcher, SendOptions};
use crate::error::Result;
use crate::request::RequestConfig;
use crate::response::ResponseEnvelope;

/// A pending call, not yet sent.
#[must_use = "requests do nothing until `send` or `send_full` is awaited"]
#[derive(Debug)]
pub struct DispatchBuilder<'a> {
    dispatcher: &'a Dispatcher,
    method: Method,
    path: String,
    config: Option<RequestConfig>,
    body: Option<Body>,
    options: SendOptions,
}

impl<'a> DispatchBuilder<'a> {
    pub(crate) fn new(
        dispatcher: &'a Dispatcher,
        method: Method,
        path: String,
        body: Option<Body>,
    ) -> Self {
        Self {
            dispatcher,
            method,
            path,
            config: None,
            body,
            options: SendOptions::default(),
        }
    }

    /// Per-call transport options.
    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Send a multipart body as flattened JSON.
    pub fn convert_form(mut self, convert: bool) -> Self {
        self.options.convert_form = convert;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Send and return only the decoded payload.
    pub async fn send<T: DeserializeOwned>(self) -> Result<T> {
        self.send_full().await.map(ResponseEnvelope::into_data)
    }

    /// Send and return the payload with status, headers, url and content type.
    pub async fn send_full<T: DeserializeOwned>(self) -> Result<ResponseEnvelope<T>> {
        self.dispatcher
            .send(
                self.method,
                &self.path,
                self.config,
                self.body.as_ref(),
                self.options,
            )
            .await
    }
}
