//! Gemini (Google) image generation provider.

use crate::error::{parse_retry_after, sanitize_error_message, Result, SpriteError};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Production endpoint for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GOOGLE_API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Points the provider at another API host (proxies, tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider, resolving the API key.
    ///
    /// A missing key is an [`SpriteError::Auth`] error; callers treat it as
    /// fatal at startup.
    pub fn build(self) -> Result<GeminiProvider> {
        self.build_with_env(|name| std::env::var(name).ok())
    }

    fn build_with_env(self, env: impl Fn(&str) -> Option<String>) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .or_else(|| API_KEY_ENV_VARS.iter().find_map(|&name| env(name)))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SpriteError::Auth("API_KEY environment variable not set".into())
            })?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiProvider {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model.as_str())
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let start = Instant::now();
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::from_generation_request(request);

        tracing::debug!(
            model = self.model.as_str(),
            mime_type = request.input_image.mime_type(),
            "submitting Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let inline_data = extract_inline_image(gemini_response)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let image = GeneratedImage::new(
            inline_data.data,
            inline_data.mime_type,
            GenerationMetadata {
                model: Some(self.model.as_str().to_string()),
                duration_ms: Some(duration_ms),
            },
        );
        tracing::debug!(
            mime_type = %image.mime_type,
            size_bytes = image.size(),
            duration_ms,
            "Gemini generation complete"
        );

        Ok(image)
    }
}

/// Picks the first inline image out of a response.
///
/// Only the first candidate is considered. Text parts are skipped; any
/// image parts after the first are dropped.
fn extract_inline_image(response: GeminiResponse) -> Result<InlineData> {
    // Prompt blocks come back as HTTP 200
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(SpriteError::ContentBlocked(msg));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(SpriteError::NoImageProduced)?;

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(SpriteError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
            "IMAGE_OTHER" | "NO_IMAGE" => return Err(SpriteError::NoImageProduced),
            _ => {} // STOP, MAX_TOKENS, etc. are normal
        }
    }

    let content = candidate.content.ok_or(SpriteError::NoImageProduced)?;

    let mut parts = content.parts.into_iter();
    let found = parts.by_ref().find_map(|part| {
        if let Some(text) = part.text {
            tracing::debug!(%text, "skipping text part in Gemini response");
        }
        part.inline_data
    });
    let skipped = parts.filter(|p| p.inline_data.is_some()).count();
    if skipped > 0 {
        tracing::debug!(skipped, "ignoring additional image parts");
    }

    found.ok_or(SpriteError::NoImageProduced)
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> SpriteError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return SpriteError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return SpriteError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return SpriteError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return SpriteError::ContentBlocked(text);
    }
    SpriteError::Api {
        status,
        message: text,
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(SpriteError::Auth("Invalid API key".into())),
            404 => Err(SpriteError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(SpriteError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        // Image first, then the instruction
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.input_image.mime_type().to_string(),
                    data: req.input_image.data().to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: req.prompt.clone(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_url::DataUrl;

    fn parse(json: &str) -> GeminiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiModel::NanoBananaPro.as_str(),
            "nano-banana-pro-preview"
        );
        assert_eq!(GeminiModel::default(), GeminiModel::NanoBanana);
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let provider = GeminiProviderBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::NanoBananaPro)
            .base_url("http://localhost:1234/")
            .build_with_env(|_| None)
            .unwrap();
        assert_eq!(provider.model(), GeminiModel::NanoBananaPro);
        assert_eq!(
            provider.model_url(),
            "http://localhost:1234/v1beta/models/nano-banana-pro-preview"
        );
    }

    #[test]
    fn test_builder_env_fallback_order() {
        let provider = GeminiProviderBuilder::new()
            .build_with_env(|name| match name {
                "API_KEY" => Some("primary".into()),
                "GOOGLE_API_KEY" => Some("secondary".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(provider.api_key, "primary");

        let provider = GeminiProviderBuilder::new()
            .build_with_env(|name| (name == "GOOGLE_API_KEY").then(|| "secondary".into()))
            .unwrap();
        assert_eq!(provider.api_key, "secondary");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_builder_missing_key_is_auth_error() {
        let err = GeminiProviderBuilder::new()
            .build_with_env(|_| None)
            .err()
            .unwrap();
        assert!(matches!(err, SpriteError::Auth(_)));

        let err = GeminiProviderBuilder::new()
            .build_with_env(|_| Some("   ".into()))
            .err()
            .unwrap();
        assert!(matches!(err, SpriteError::Auth(_)));
    }

    #[test]
    fn test_request_construction() {
        let req = GenerationRequest::new("Walk right", DataUrl::new("image/jpeg", "/9j/4AAQ"));
        let json = serde_json::to_value(GeminiRequest::from_generation_request(&req)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{
                    "parts": [
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}},
                        {"text": "Walk right"}
                    ]
                }],
                "generationConfig": {"responseModalities": ["IMAGE"]}
            })
        );
    }

    #[test]
    fn test_extract_skips_text_parts() {
        let resp = parse(
            r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your sprite sheet"},
                        {"inlineData": {"mimeType": "image/png", "data": "ABC123"}},
                        {"inlineData": {"mimeType": "image/png", "data": "SECOND"}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#,
        );
        let inline = extract_inline_image(resp).unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "ABC123");
    }

    #[test]
    fn test_extract_no_image_parts() {
        let resp = parse(r#"{"candidates": [{"content": {"parts": [{"text": "sorry"}]}}]}"#);
        assert!(matches!(
            extract_inline_image(resp),
            Err(SpriteError::NoImageProduced)
        ));

        let resp = parse(r#"{"candidates": []}"#);
        assert!(matches!(
            extract_inline_image(resp),
            Err(SpriteError::NoImageProduced)
        ));

        let resp = parse(r#"{"candidates": [{"finishReason": "NO_IMAGE"}]}"#);
        assert!(matches!(
            extract_inline_image(resp),
            Err(SpriteError::NoImageProduced)
        ));

        let resp = parse(r#"{"candidates": [{"content": {}}]}"#);
        assert!(matches!(
            extract_inline_image(resp),
            Err(SpriteError::NoImageProduced)
        ));
    }

    #[test]
    fn test_extract_prompt_feedback_block() {
        let resp = parse(
            r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#,
        );
        match extract_inline_image(resp) {
            Err(SpriteError::ContentBlocked(msg)) => {
                assert_eq!(msg, "Prompt was blocked due to safety")
            }
            other => panic!("expected ContentBlocked, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_safety_finish_reason() {
        let resp = parse(r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#);
        assert!(matches!(
            extract_inline_image(resp),
            Err(SpriteError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_parse_error_mapping() {
        let headers = reqwest::header::HeaderMap::new();
        assert!(matches!(
            parse_error(401, "bad key", &headers),
            SpriteError::Auth(_)
        ));
        assert!(matches!(
            parse_error(404, "", &headers),
            SpriteError::InvalidRequest(_)
        ));
        assert!(matches!(
            parse_error(429, "", &headers),
            SpriteError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            parse_error(400, "request blocked by safety", &headers),
            SpriteError::ContentBlocked(_)
        ));
        assert!(matches!(
            parse_error(500, "internal", &headers),
            SpriteError::Api { status: 500, .. }
        ));
    }
}
