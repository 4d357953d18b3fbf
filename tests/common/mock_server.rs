//! WireMock server utilities for API testing
//!
//! Helpers that mount Twitter-shaped endpoints on a mock server, with or
//! without gzip content-encoding.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TIMELINE_PATH: &str = "/1.1/statuses/home_timeline.json";
pub const UPDATE_PATH: &str = "/1.1/statuses/update.json";
pub const UPLOAD_PATH: &str = "/1.1/media/upload.json";
pub const STREAM_PATH: &str = "/1.1/statuses/sample.json";

/// Every mocked endpoint only answers signed requests.
pub const OAUTH_HEADER_PATTERN: &str = r#"^OAuth .*oauth_signature="[^"]+""#;

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Response carrying `body`, gzip-encoded when `compressed` is set.
pub fn encoded_response(status: u16, body: &str, compressed: bool) -> ResponseTemplate {
    if compressed {
        ResponseTemplate::new(status)
            .insert_header("content-encoding", "gzip")
            .set_body_bytes(gzip(body.as_bytes()))
    } else {
        ResponseTemplate::new(status).set_body_string(body.to_string())
    }
}

/// Mock server with a timeline, a status update and a media upload endpoint.
///
/// # Example
/// ```rust
/// let mock_server = setup_mock_server().await;
/// let url = format!("{}{}", mock_server.uri(), TIMELINE_PATH);
/// ```
pub async fn setup_mock_server() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TIMELINE_PATH))
        .and(header_regex("authorization", OAUTH_HEADER_PATTERN))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id":1,"text":"first"},{"id":2,"text":"second"}]"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(UPDATE_PATH))
        .and(header_regex("authorization", OAUTH_HEADER_PATTERN))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":3,"text":"posted"}"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(header_regex("authorization", OAUTH_HEADER_PATTERN))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                r#"{"media_id":710511363345354753,"media_id_string":"710511363345354753"}"#,
            ),
        )
        .mount(&mock_server)
        .await;

    mock_server
}

/// Mock server whose stream endpoint sends `body` then closes.
pub async fn setup_stream_server(body: &str, compressed: bool) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .and(header_regex("authorization", OAUTH_HEADER_PATTERN))
        .respond_with(encoded_response(200, body, compressed))
        .mount(&mock_server)
        .await;

    mock_server
}

/// Mock server whose stream endpoint holds the headers back for `delay`.
pub async fn setup_slow_stream_server(body: &str, delay: Duration) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .set_delay(delay),
        )
        .mount(&mock_server)
        .await;

    mock_server
}

/// Mock server that answers every request with an error envelope.
pub async fn setup_error_server(
    status: u16,
    code: i64,
    message: &str,
    compressed: bool,
) -> MockServer {
    let mock_server = MockServer::start().await;
    let body = serde_json::json!({"errors": [{"code": code, "message": message}]}).to_string();

    Mock::given(wiremock::matchers::any())
        .respond_with(encoded_response(status, &body, compressed))
        .mount(&mock_server)
        .await;

    mock_server
}
