//! `reqwest`-backed transport.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};

use super::{HttpTransport, ResponseBody, TransportResponse};
use crate::body::{FormData, FormValue, WireBody};
use crate::error::{RequestError, Result};
use crate::request::TransportRequest;
use crate::telemetry::HTTP_TARGET;

/// Default transport over a shared `reqwest::Client`.
///
/// Only method, URL, headers and body reach the wire. The opaque
/// [`RequestConfig::options`](crate::request::RequestConfig::options) bag is
/// ignored here: browser-style keys such as `credentials`, `mode` or `cache`
/// have no `reqwest` equivalent. Transports that understand them can read
/// [`TransportRequest::options`] in their own [`HttpTransport`] impl.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an already configured client (proxy, TLS, default headers, ...).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_form(form: FormData) -> Result<Form> {
        let mut out = Form::new();
        for (name, value) in form.fields() {
            out = match value {
                FormValue::Text(text) => out.text(name.to_string(), text.clone()),
                FormValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mime = content_type.clone().unwrap_or_else(|| {
                        mime_guess::from_path(file_name)
                            .first_or_octet_stream()
                            .essence_str()
                            .to_string()
                    });
                    let part = Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(&mime)
                        .map_err(|e| {
                            RequestError::Configuration(format!(
                                "Invalid MIME type '{mime}' for form field '{name}': {e}"
                            ))
                        })?;
                    out.part(name.to_string(), part)
                }
            };
        }
        Ok(out)
    }

    async fn exchange(&self, request: TransportRequest) -> Result<TransportResponse> {
        if !request.options.is_empty() {
            tracing::trace!(
                target: HTTP_TARGET,
                options = ?request.options.keys().collect::<Vec<_>>(),
                "ignoring request options"
            );
        }
        let mut builder = self
            .client
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        builder = match request.body {
            Some(WireBody::Text(text)) => builder.body(text),
            Some(WireBody::Form(form)) => builder.multipart(Self::build_form(form)?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RequestError::Transport(format!("Stream error: {e}"))));

        Ok(TransportResponse {
            status,
            headers,
            url,
            body: ResponseBody::from_stream(Box::pin(stream)),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        match request.cancellation.clone() {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(RequestError::Transport("request aborted".to_string())),
                result = self.exchange(request) => result,
            },
            None => self.exchange(request).await,
        }
    }
}
