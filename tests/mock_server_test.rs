//! End-to-end tests for the dispatcher over the default `reqwest` transport.
//!
//! These tests use wiremock to stand in for a JSON API.

use futures_util::StreamExt;
use request_dispatch::prelude::*;
use request_dispatch::stream::utf8_text;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, body_string, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Created {
    id: u32,
}

async fn created_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "a"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_raw(r#"{"id":1}"#, "application/json"),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn post_resolves_with_decoded_payload() {
    let server = created_server().await;
    let dispatcher = Dispatcher::new(server.uri(), 0, false);

    let created: Created =
        assert_ok!(dispatcher.post("/items", json!({"name": "a"})).send().await);

    assert_eq!(created, Created { id: 1 });
}

#[tokio::test]
async fn post_full_response_carries_envelope() {
    let server = created_server().await;
    let dispatcher = Dispatcher::new(server.uri(), 0, false);

    let envelope = dispatcher
        .post("/items", json!({"name": "a"}))
        .send_full::<Value>()
        .await
        .unwrap();

    assert_eq!(envelope.data, json!({"id": 1}));
    assert_eq!(envelope.status, 201);
    assert!(envelope.ok);
    assert_eq!(envelope.url, format!("{}/items", server.uri()));
    assert_eq!(envelope.content_type, "application/json");
    assert_eq!(envelope.headers.get("content-type").unwrap(), "application/json");
}

#[tokio::test]
async fn server_error_rejects_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("not json at all"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 0, false);
    let err = dispatcher
        .put("/items/1", json!({"name": "b"}))
        .send::<Value>()
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert!(matches!(err, RequestError::Status { status: 500, .. }));
}

#[tokio::test]
async fn converted_form_is_sent_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/forms"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"a": "1", "b": "2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 0, false);
    let form = FormData::new().text("a", "1").text("b", "2");
    let reply: Value = dispatcher
        .post("/forms", form)
        .convert_form(true)
        .send()
        .await
        .unwrap();

    assert_eq!(reply, json!({"ok": true}));
}

#[tokio::test]
async fn form_without_conversion_is_sent_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 0, true);
    let form = FormData::new()
        .text("title", "report")
        .file("file", "report.csv", b"a,b\n1,2\n".to_vec());
    let reply: String = dispatcher.post("/upload", form).send().await.unwrap();
    assert_eq!(reply, "");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"title\""));
    assert!(body.contains("filename=\"report.csv\""));
    assert!(body.contains("text/csv"));
}

#[tokio::test]
async fn encoded_dispatcher_sends_base64_json() {
    let server = MockServer::start().await;
    let payload = json!({"name": "a"});
    let wire = BodyEncoding::Base64.encode(&payload.to_string());
    Mock::given(method("PATCH"))
        .and(path("/items/1"))
        .and(body_string(wire))
        .respond_with(ResponseTemplate::new(200).set_body_string("patched"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 0, true);
    let reply: String = dispatcher.patch("/items/1", payload).send().await.unwrap();
    assert_eq!(reply, "patched");
}

#[tokio::test]
async fn get_applies_request_interceptor_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 1_000, false);
    dispatcher.set_request_interceptor(|config: RequestConfig| config.bearer_auth("secret"));

    let me: Value = dispatcher.get("/me").send().await.unwrap();
    assert_eq!(me["user"], "u1");
}

#[tokio::test]
async fn caller_content_type_overrides_computed_one() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/items/1"))
        .and(header("content-type", "application/merge-patch+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 0, false);
    let config = RequestConfig::new()
        .header("Content-Type", "application/merge-patch+json")
        .unwrap();
    let reply: Value = dispatcher
        .delete("/items/1", json!({"soft": true}))
        .config(config)
        .send()
        .await
        .unwrap();
    assert_eq!(reply, Value::Null);
}

#[tokio::test]
async fn slow_server_is_cancelled_by_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 50, false);
    let started = std::time::Instant::now();
    let err = assert_err!(dispatcher.get("/slow").send::<Value>().await);

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn stream_returns_live_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"prompt": "hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw("chunk-1 chunk-2", "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    // Interceptors must not run for streams.
    let dispatcher = Dispatcher::new(server.uri(), 0, true);
    dispatcher.set_request_interceptor(|_: RequestConfig| -> request_dispatch::Result<RequestConfig> {
        Err(RequestError::Interceptor("should not run".into()))
    });

    let stream = dispatcher
        .stream("/generate", None, &json!({"prompt": "hi"}))
        .await
        .unwrap();
    let text: Vec<String> = utf8_text(stream).map(|chunk| chunk.unwrap()).collect().await;
    assert_eq!(text.concat(), "chunk-1 chunk-2");
}

#[tokio::test]
async fn stream_rejects_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 0, false);
    let err = dispatcher
        .stream_text("/generate", None, &json!({}))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn request_options_do_not_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(server.uri(), 0, false);
    let config = RequestConfig::new()
        .option("credentials", "include")
        .option("mode", "cors");
    let items: Value = dispatcher.get("/items").config(config).send().await.unwrap();
    assert_eq!(items, json!([]));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("credentials").is_none());
    assert!(requests[0].headers.get("mode").is_none());
    assert!(requests[0].body.is_empty());
}
