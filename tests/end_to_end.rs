//! Upload, generate and present, with the Gemini endpoint mocked.

use serde_json::json;
use spritegen::{
    App, GeminiProvider, Phase, SpriteError, UploadFile, GENERATION_FAILED_MESSAGE,
    INVALID_FILE_MESSAGE, SPRITE_SHEET_FILENAME,
};
use std::path::{Path, PathBuf};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

fn red_png() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/red_10x10.png")
}

fn app(server: &MockServer) -> App<GeminiProvider> {
    let provider = GeminiProvider::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap();
    App::new(provider)
}

fn image_response(data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"parts": [
                {"text": "Sprite sheet attached."},
                {"inlineData": {"mimeType": "image/png", "data": data}}
            ]},
            "finishReason": "STOP"
        }]
    }))
}

#[tokio::test]
async fn test_red_png_to_sprite_sheet() {
    let server = MockServer::start().await;
    let png = std::fs::read(red_png()).unwrap();
    let expected_upload = spritegen::DataUrl::from_bytes("image/png", &png);

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{"parts": [
                {"inlineData": {"mimeType": "image/png", "data": expected_upload.data()}},
                {"text": spritegen::SPRITE_SHEET_PROMPT}
            ]}]
        })))
        .respond_with(image_response("ABC123"))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app(&server);
    app.upload(&UploadFile::new(red_png())).await.unwrap();
    assert_eq!(app.state().phase(), Phase::Ready);
    assert_eq!(app.state().uploaded().unwrap().data_url, expected_upload);

    app.generate().await;

    assert_eq!(app.state().phase(), Phase::ReadyWithResult);
    assert_eq!(app.state().result(), Some("data:image/png;base64,ABC123"));
    assert_eq!(app.state().error(), None);

    let html = app.preview_html().unwrap();
    assert!(html.contains("data:image/png;base64,ABC123"));
    assert!(html.contains("image-rendering: pixelated"));
}

#[tokio::test]
async fn test_generate_without_upload_makes_no_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(image_response("ABC123"))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = app(&server);
    app.generate().await;

    assert_eq!(app.state().error(), Some("Please upload an image first."));
    assert_eq!(app.state().result(), None);
}

#[tokio::test]
async fn test_non_image_upload_is_rejected_without_state_change() {
    let server = MockServer::start().await;
    let mut app = app(&server);

    app.upload(&UploadFile::new(red_png())).await.unwrap();
    let before = app.state().uploaded().cloned();

    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not an image").unwrap();

    let err = app.upload(&UploadFile::new(&notes)).await.unwrap_err();
    assert!(matches!(err, SpriteError::InvalidFile { .. }));
    assert_eq!(err.user_message(), INVALID_FILE_MESSAGE);
    assert_eq!(app.state().uploaded().cloned(), before);
    assert_eq!(app.state().error(), None);
}

#[tokio::test]
async fn test_upstream_failure_shows_generic_message_and_allows_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(image_response("aGVsbG8="))
        .mount(&server)
        .await;

    let mut app = app(&server);
    app.upload(&UploadFile::new(red_png())).await.unwrap();

    app.generate().await;
    assert_eq!(app.state().phase(), Phase::ReadyWithError);
    assert_eq!(app.state().error(), Some(GENERATION_FAILED_MESSAGE));
    assert_eq!(app.state().result(), None);

    app.generate().await;
    assert_eq!(app.state().phase(), Phase::ReadyWithResult);
    assert_eq!(app.state().error(), None);

    let out = tempfile::tempdir().unwrap();
    let saved = app.save_result(out.path()).unwrap().unwrap();
    assert_eq!(saved, out.path().join(SPRITE_SHEET_FILENAME));
    assert_eq!(std::fs::read(saved).unwrap(), b"hello");
}

#[tokio::test]
async fn test_empty_response_is_generic_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let mut app = app(&server);
    app.upload(&UploadFile::new(red_png())).await.unwrap();
    app.generate().await;

    assert_eq!(app.state().error(), Some(GENERATION_FAILED_MESSAGE));
    assert!(app.save_result(".").unwrap().is_none());
}

#[tokio::test]
async fn test_new_upload_clears_previous_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(image_response("ABC123"))
        .mount(&server)
        .await;

    let mut app = app(&server);
    app.upload(&UploadFile::new(red_png())).await.unwrap();
    app.generate().await;
    assert!(app.state().result().is_some());

    let dir = tempfile::tempdir().unwrap();
    let second = dir.path().join("second.webp");
    std::fs::write(&second, b"RIFF\0\0\0\0WEBP").unwrap();

    app.upload(&UploadFile::new(&second)).await.unwrap();
    assert_eq!(app.state().phase(), Phase::Ready);
    assert_eq!(app.state().result(), None);
    assert_eq!(app.state().error(), None);
    assert_eq!(
        app.state().uploaded().unwrap().data_url.mime_type(),
        "image/webp"
    );
}
