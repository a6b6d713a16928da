//! Integration tests with mocked upstream APIs
//! Exercises the generator and speech clients without hitting Google services
use base64::Engine;
use saha_cfo_api::errors::UpstreamError;
use saha_cfo_api::gemini_client::GeminiClient;
use saha_cfo_api::speech::SpeechClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn gemini_client(base_url: String) -> GeminiClient {
    GeminiClient::new(
        base_url,
        "test_key".to_string(),
        "gemini-test".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn speech_client(base_url: String) -> SpeechClient {
    SpeechClient::new(
        base_url,
        "tts_key".to_string(),
        "en-IN".to_string(),
        None,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn model_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_text_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test_key"))
        .and(body_partial_json(json!({
            "generationConfig": { "temperature": 0.0 },
            "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("{\"income\": 1}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = gemini_client(mock_server.uri());
    let text = client.generate_text("hello").await.unwrap();

    assert_eq!(text, "{\"income\": 1}");
}

#[tokio::test]
async fn test_generate_text_joins_parts() {
    let mock_server = MockServer::start().await;

    let reply = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "```json\n{\"a\":" }, { "text": " 1}\n```" }] }
        }]
    });
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&mock_server)
        .await;

    let client = gemini_client(mock_server.uri());
    let text = client.generate_text("prompt").await.unwrap();

    assert_eq!(text, "```json\n{\"a\": 1}\n```");
}

#[tokio::test]
async fn test_generate_with_media_sends_inline_data_first() {
    let mock_server = MockServer::start().await;
    let encoded = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG");

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": encoded } },
                    { "text": "describe" }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("{}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = gemini_client(mock_server.uri());
    let text = client
        .generate_with_media("describe", b"\x89PNG", "image/png")
        .await
        .unwrap();

    assert_eq!(text, "{}");
}

#[tokio::test]
async fn test_generate_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&mock_server)
        .await;

    let client = gemini_client(mock_server.uri());
    let err = client.generate_text("hello").await.unwrap_err();

    assert_eq!(
        err,
        UpstreamError::Status {
            status: 403,
            body: "API key not valid".to_string()
        }
    );
}

#[tokio::test]
async fn test_generate_empty_candidates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&mock_server)
        .await;

    let client = gemini_client(mock_server.uri());
    let err = client.generate_text("hello").await.unwrap_err();

    assert_eq!(err, UpstreamError::EmptyResponse);
}

#[tokio::test]
async fn test_generate_undecodable_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = gemini_client(mock_server.uri());
    let err = client.generate_text("hello").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Decode(_)));
}

#[tokio::test]
async fn test_circuit_opens_after_consecutive_failures() {
    let mock_server = MockServer::start().await;

    // Only five requests may reach the server; the sixth is rejected locally
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let client = gemini_client(mock_server.uri());
    for _ in 0..5 {
        let err = client.generate_text("hello").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 503, .. }));
    }

    let err = client.generate_text("hello").await.unwrap_err();
    assert_eq!(err, UpstreamError::Rejected);
}

#[tokio::test]
async fn test_unreachable_generator() {
    // Nothing listens on port 9 locally
    let client = gemini_client("http://127.0.0.1:9".to_string());
    let err = client.generate_text("hello").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Request(_)));
}

#[tokio::test]
async fn test_synthesize_success() {
    let mock_server = MockServer::start().await;
    let audio = b"ID3\x03fake-mp3".to_vec();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&audio);

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .and(header("x-goog-api-key", "tts_key"))
        .and(body_partial_json(json!({
            "input": { "text": "Tip Save more each month." },
            "voice": { "languageCode": "en-IN" },
            "audioConfig": { "audioEncoding": "MP3" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audioContent": encoded })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = speech_client(mock_server.uri());
    let bytes = client
        .synthesize("## Tip\n* **Save** more each month.")
        .await
        .unwrap();

    assert_eq!(bytes, audio);
}

#[tokio::test]
async fn test_synthesize_blank_text_skips_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = speech_client(mock_server.uri());
    let err = client.synthesize("``` \n **").await.unwrap_err();

    assert_eq!(err, UpstreamError::EmptyResponse);
}

#[tokio::test]
async fn test_synthesize_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad voice"))
        .mount(&mock_server)
        .await;

    let client = speech_client(mock_server.uri());
    let err = client.synthesize("hello").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Status { status: 400, .. }));
}

#[tokio::test]
async fn test_synthesize_missing_audio() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = speech_client(mock_server.uri());
    let err = client.synthesize("hello").await.unwrap_err();

    assert_eq!(err, UpstreamError::EmptyResponse);
}
