//! Dispatcher configuration types.
//!
//! This module defines `DispatcherConfig` and its builder. The configuration is
//! fixed once a [`Dispatcher`](crate::Dispatcher) is constructed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RequestError, Result};

/// Wire encoding applied to JSON request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// JSON text is sent as-is.
    #[default]
    Plain,
    /// JSON text is base64-encoded before sending.
    Base64,
}

impl BodyEncoding {
    /// Map the boolean "encode body" switch onto an encoding.
    pub const fn from_flag(encode: bool) -> Self {
        if encode { Self::Base64 } else { Self::Plain }
    }

    pub const fn is_encoded(self) -> bool {
        matches!(self, Self::Base64)
    }

    /// Encode serialized JSON text for the wire.
    pub fn encode(self, json: &str) -> String {
        match self {
            Self::Plain => json.to_string(),
            Self::Base64 => STANDARD.encode(json.as_bytes()),
        }
    }

    /// Inverse of [`BodyEncoding::encode`].
    pub fn decode(self, wire: &str) -> Result<String> {
        match self {
            Self::Plain => Ok(wire.to_string()),
            Self::Base64 => {
                let bytes = STANDARD
                    .decode(wire.trim())
                    .map_err(|e| RequestError::Decode(format!("Invalid base64 body: {e}")))?;
                String::from_utf8(bytes)
                    .map_err(|e| RequestError::Decode(format!("Body is not UTF-8: {e}")))
            }
        }
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Prefix for every request path
    pub base_address: String,
    /// Deadline for each dispatched call; `None` disables cancellation
    #[serde(default, with = "timeout_millis_serde")]
    pub timeout: Option<Duration>,
    /// Encoding applied to JSON bodies
    #[serde(default)]
    pub body_encoding: BodyEncoding,
}

impl DispatcherConfig {
    pub fn new(base_address: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            timeout: None,
            body_encoding: BodyEncoding::Plain,
        }
    }

    /// Returns a builder for constructing `DispatcherConfig`
    pub fn builder(base_address: impl Into<String>) -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::new(base_address)
    }

    /// Resolve a request path against the base address.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_address, path)
    }
}

/// Builder for `DispatcherConfig`
#[derive(Debug, Clone)]
pub struct DispatcherConfigBuilder {
    base_address: String,
    timeout: Option<Duration>,
    body_encoding: BodyEncoding,
}

impl DispatcherConfigBuilder {
    pub fn new(base_address: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            timeout: None,
            body_encoding: BodyEncoding::Plain,
        }
    }

    /// Zero durations disable the deadline.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Millisecond form of [`Self::timeout`]; values `<= 0` disable the deadline.
    pub fn timeout_ms(self, millis: i64) -> Self {
        let timeout = u64::try_from(millis).ok().map(Duration::from_millis);
        self.timeout(timeout)
    }

    pub fn body_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.body_encoding = encoding;
        self
    }

    pub fn encode_body(self, encode: bool) -> Self {
        self.body_encoding(BodyEncoding::from_flag(encode))
    }

    /// Build the configuration
    pub fn build(self) -> DispatcherConfig {
        DispatcherConfig {
            base_address: self.base_address,
            timeout: self.timeout,
            body_encoding: self.body_encoding,
        }
    }
}

// Timeouts travel as integer milliseconds; 0 and null both mean "disabled".
mod timeout_millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match timeout {
            Some(d) => u64::try_from(d.as_millis())
                .unwrap_or(u64::MAX)
                .serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.filter(|m| *m > 0).map(Duration::from_millis))
    }
}
