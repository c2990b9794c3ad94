//! Response decoding and the full-response envelope.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::transport::TransportResponse;

/// Full response wrapper returned when the caller asks for more than the payload.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<T> {
    pub data: T,
    pub status: u16,
    pub ok: bool,
    pub headers: HeaderMap,
    pub url: String,
    /// Response `Content-Type`, empty when the header was absent.
    pub content_type: String,
}

impl<T> ResponseEnvelope<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            data: f(self.data),
            status: self.status,
            ok: self.ok,
            headers: self.headers,
            url: self.url,
            content_type: self.content_type,
        }
    }
}

/// Body decoded according to its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// JSON when the content type mentions `application/json`, text otherwise.
    pub async fn read(response: TransportResponse) -> Result<(Self, ResponseHead)> {
        let head = ResponseHead::of(&response);
        let payload = if head.content_type.contains("application/json") {
            Self::Json(response.body.read_json().await?)
        } else {
            Self::Text(response.body.read_text().await?)
        };
        Ok((payload, head))
    }

    /// Convert into the caller's target type. Text becomes a JSON string first,
    /// so `String` and `serde_json::Value` targets accept both kinds of payload.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        let value = match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// Everything in a response except its body.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: u16,
    pub ok: bool,
    pub headers: HeaderMap,
    pub url: String,
    pub content_type: String,
}

impl ResponseHead {
    pub fn of(response: &TransportResponse) -> Self {
        Self {
            status: response.status,
            ok: response.ok(),
            headers: response.headers.clone(),
            url: response.url.clone(),
            content_type: response.content_type().unwrap_or_default().to_string(),
        }
    }

    pub fn wrap<T>(self, data: T) -> ResponseEnvelope<T> {
        ResponseEnvelope {
            data,
            status: self.status,
            ok: self.ok,
            headers: self.headers,
            url: self.url,
            content_type: self.content_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use crate::transport::ResponseBody;
    use reqwest::header::{CONTENT_TYPE, HeaderValue};
    use serde::Deserialize;

    fn response(content_type: Option<&'static str>, body: &'static str) -> TransportResponse {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        TransportResponse::new(200, "http://h/items")
            .with_headers(headers)
            .with_body(ResponseBody::from_bytes(body))
    }

    #[tokio::test]
    async fn json_content_type_is_parsed() {
        let (payload, head) = Payload::read(response(
            Some("application/json; charset=utf-8"),
            r#"{"id":1}"#,
        ))
        .await
        .unwrap();
        assert_eq!(payload, Payload::Json(serde_json::json!({"id": 1})));
        assert_eq!(head.content_type, "application/json; charset=utf-8");

        #[derive(Deserialize)]
        struct Item {
            id: u32,
        }
        let item: Item = payload.into_typed().unwrap();
        assert_eq!(item.id, 1);
    }

    #[tokio::test]
    async fn other_content_types_are_text() {
        let (payload, head) = Payload::read(response(None, r#"{"id":1}"#)).await.unwrap();
        assert_eq!(payload, Payload::Text(r#"{"id":1}"#.to_string()));
        assert_eq!(head.content_type, "");
        let text: String = payload.into_typed().unwrap();
        assert_eq!(text, r#"{"id":1}"#);
    }

    #[tokio::test]
    async fn text_into_struct_is_a_decode_error() {
        let (payload, _) = Payload::read(response(Some("text/html"), "<p>hi</p>")).await.unwrap();
        let err = payload.into_typed::<Vec<u8>>().unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
    }

    #[test]
    fn envelope_keeps_response_metadata() {
        let head = ResponseHead::of(&response(Some("application/json"), "{}"));
        let envelope = head.wrap(7u8).map(|n| n * 2);
        assert_eq!(envelope.data, 14);
        assert_eq!(envelope.status, 200);
        assert!(envelope.ok);
        assert_eq!(envelope.url, "http://h/items");
        assert_eq!(envelope.content_type, "application/json");
    }
}
