//! Request and response interceptors
//!
//! A dispatcher holds at most one interceptor of each kind. Registering a new
//! one replaces the previous one; interceptors are never chained.
//!
//! - A [`RequestInterceptor`] receives the caller's [`RequestConfig`] (an empty
//!   one when the caller supplied none) and returns the replacement config used
//!   for the call.
//! - A [`ResponseInterceptor`] observes every response before its status is
//!   checked, including error statuses.
//!
//! Plain closures implement both traits.

use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::request::RequestConfig;
use crate::telemetry::HTTP_TARGET;
use crate::transport::TransportResponse;

/// Transforms outbound configuration before each dispatched call.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, config: RequestConfig) -> Result<RequestConfig>;
}

/// Observes each raw response before it is interpreted.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, response: &TransportResponse) -> Result<()>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync,
{
    fn intercept(&self, config: RequestConfig) -> Result<RequestConfig> {
        self(config)
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&TransportResponse) -> Result<()> + Send + Sync,
{
    fn on_response(&self, response: &TransportResponse) -> Result<()> {
        self(response)
    }
}

/// Single replaceable interceptor slot.
///
/// Readers take a snapshot of the current value; calls already holding a
/// snapshot are unaffected by later replacement.
pub struct InterceptorSlot<T: ?Sized> {
    current: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> InterceptorSlot<T> {
    pub fn empty() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Replace the current interceptor. Last write wins.
    pub fn set(&self, interceptor: Arc<T>) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(interceptor);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn snapshot(&self) -> Option<Arc<T>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.snapshot().is_some()
    }
}

impl<T: ?Sized> Default for InterceptorSlot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A simple logging interceptor backed by `tracing` (no header values or bodies).
#[derive(Clone, Debug, Default)]
pub struct LoggingInterceptor;

impl RequestInterceptor for LoggingInterceptor {
    fn intercept(&self, config: RequestConfig) -> Result<RequestConfig> {
        tracing::debug!(
            target: HTTP_TARGET,
            headers = config.headers.len(),
            options = config.options.len(),
            "intercepting request"
        );
        Ok(config)
    }
}

impl ResponseInterceptor for LoggingInterceptor {
    fn on_response(&self, response: &TransportResponse) -> Result<()> {
        tracing::debug!(
            target: HTTP_TARGET,
            url = %response.url,
            status = response.status,
            "response received"
        );
        Ok(())
    }
}
