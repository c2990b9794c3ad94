//! Request body shaping
//!
//! Turns a caller-supplied [`Body`] into the bytes that go on the wire and the
//! `Content-Type` the dispatcher should advertise:
//!
//! - structured values are serialized as JSON text, optionally base64-encoded;
//! - multipart forms pass through untouched unless a JSON conversion is requested,
//!   in which case they are flattened into a key/value object first;
//! - raw strings are sent as-is.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::BodyEncoding;
use crate::error::{RequestError, Result};

pub const APPLICATION_JSON: &str = "application/json";

/// A single multipart field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormValue {
    /// The value used when the form is flattened into JSON.
    fn flattened(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::File { file_name, .. } => file_name.clone(),
        }
    }
}

/// Ordered multipart payload. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                file_name: file_name.into(),
                content_type: None,
                bytes: bytes.into(),
            },
        ));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: FormValue) {
        self.fields.push((name.into(), value));
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Collapse into a plain string mapping. The first value seen for a key wins.
    pub fn flatten(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, value) in &self.fields {
            if !map.contains_key(name) {
                map.insert(name.clone(), Value::String(value.flattened()));
            }
        }
        map
    }
}

/// Caller-supplied request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured value, sent as JSON.
    Json(Value),
    /// Multipart form payload.
    Form(FormData),
    /// Raw string, sent verbatim.
    Text(String),
}

impl Body {
    /// Serialize any value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| RequestError::Encoding(format!("Failed to serialize body: {e}")))
    }

    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Self::Json(Value::Object(map))
    }
}

impl From<FormData> for Body {
    fn from(form: FormData) -> Self {
        Self::Form(form)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Body in the form handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireBody {
    Text(String),
    Form(FormData),
}

impl WireBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Form(_) => None,
        }
    }
}

/// Output of [`encode_body`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub body: Option<WireBody>,
    pub content_type: Option<&'static str>,
}

impl EncodedBody {
    pub const fn empty() -> Self {
        Self {
            body: None,
            content_type: None,
        }
    }
}

/// Serialize a JSON value and apply the transport encoding.
pub fn encode_json(value: &Value, encoding: BodyEncoding) -> Result<EncodedBody> {
    let text = serde_json::to_string(value)
        .map_err(|e| RequestError::Encoding(format!("Failed to serialize body: {e}")))?;
    Ok(EncodedBody {
        body: Some(WireBody::Text(encoding.encode(&text))),
        content_type: Some(APPLICATION_JSON),
    })
}

/// Shape a body for the wire.
///
/// `convert_form` only affects multipart payloads: when set, the form is
/// flattened and sent as JSON instead of multipart.
pub fn encode_body(body: &Body, convert_form: bool, encoding: BodyEncoding) -> Result<EncodedBody> {
    match body {
        Body::Json(value) => encode_json(value, encoding),
        Body::Form(form) if convert_form => encode_json(&Value::Object(form.flatten()), encoding),
        Body::Form(form) => Ok(EncodedBody {
            body: Some(WireBody::Form(form.clone())),
            content_type: None,
        }),
        Body::Text(text) => Ok(EncodedBody {
            body: Some(WireBody::Text(text.clone())),
            content_type: None,
        }),
    }
}
