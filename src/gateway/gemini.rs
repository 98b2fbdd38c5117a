//! Gemini REST client.
//!
//! Structured text goes through `models/{model}:generateContent`,
//! images through the Imagen `models/{model}:predict` endpoint.
//! Docs: <https://ai.google.dev/api/generate-content>

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{GenerativeModel, ImageOptions};
use crate::config::GatewayConfig;
use crate::error::ExplorerError;

/// How much of an error body ends up in the log.
const ERROR_BODY_LIMIT: usize = 512;

const API_KEY_HEADER: &str = "x-goog-api-key";

// -----------------------------
// generateContent (text)
// -----------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts joined together.
    fn output_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// -----------------------------
// predict (Imagen)
// -----------------------------

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters<'a>,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u8,
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

/// [`GenerativeModel`] backed by the Gemini API.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GeminiClient {
    /// Builds a client from explicit configuration.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Builds a client reusing an existing reqwest client.
    pub fn with_client(client: reqwest::Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_base, model, method)
    }

    async fn post_json<B: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, ExplorerError> {
        let resp = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| ExplorerError::Upstream(format!("Request to {url} failed: {err}")))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            ExplorerError::Upstream(format!("Failed reading body from {url}: {err}"))
        })?;

        if !status.is_success() {
            return Err(ExplorerError::Upstream(format!(
                "{url} returned {status}: {}",
                error_snippet(&bytes)
            )));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            ExplorerError::Upstream(format!(
                "Failed to parse JSON from {url}: {err}: {}",
                error_snippet(&bytes)
            ))
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: Value,
    ) -> Result<Value, ExplorerError> {
        let url = self.model_url(&self.config.text_model, "generateContent");
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let parsed: GenerateContentResponse = self.post_json(&url, &request).await?;
        if let Some(err) = &parsed.error {
            return Err(ExplorerError::Upstream(format!(
                "generateContent returned error: {err}"
            )));
        }

        let Some(text) = parsed.output_text() else {
            let finish_reason = parsed
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.clone())
                .unwrap_or_else(|| "none".to_string());
            return Err(ExplorerError::Upstream(format!(
                "generateContent returned no text (finish reason {finish_reason}, feedback {:?})",
                parsed.prompt_feedback
            )));
        };
        debug!("Structured output: {}", text);

        serde_json::from_str(&text).map_err(|err| {
            ExplorerError::Upstream(format!("Failed to parse structured output JSON: {err}"))
        })
    }

    async fn generate_images(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Vec<String>, ExplorerError> {
        let url = self.model_url(&self.config.image_model, "predict");
        let request = PredictRequest {
            instances: vec![PredictInstance { prompt }],
            parameters: PredictParameters {
                sample_count: options.count,
                aspect_ratio: &options.aspect_ratio,
            },
        };

        let parsed: PredictResponse = self.post_json(&url, &request).await?;
        if let Some(err) = &parsed.error {
            return Err(ExplorerError::Upstream(format!(
                "predict returned error: {err}"
            )));
        }

        let mut images = Vec::with_capacity(parsed.predictions.len());
        for prediction in parsed.predictions {
            match prediction.bytes_base64_encoded {
                Some(encoded) => images.push(encoded),
                None => warn!(
                    "Image prediction without data, filtered: {}",
                    prediction
                        .rai_filtered_reason
                        .as_deref()
                        .unwrap_or("no reason given")
                ),
            }
        }
        Ok(images)
    }
}

fn error_snippet(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.chars().count() <= ERROR_BODY_LIMIT {
        return text.into_owned();
    }
    let mut snippet: String = text.chars().take(ERROR_BODY_LIMIT).collect();
    snippet.push('…');
    snippet
}
