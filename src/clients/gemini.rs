use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::clients::gateway::{GatewayError, GatewayFailure, GeneratedImages, ImageGateway};
use crate::config::GatewayConfig;

// --- Imagen `:predict` ---

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: Option<String>,
    #[serde(rename = "raiFilteredReason")]
    rai_filtered_reason: Option<String>,
}

// --- Gemini `:generateContent` ---

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the Google Generative Language REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    generate_model: String,
    edit_model: String,
    aspect_ratio: String,
}

impl GeminiClient {
    #[must_use]
    pub fn new(client: Client, config: &GatewayConfig) -> Self {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!("No Gemini API key configured; image generation will fail");
        }

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            generate_model: config.generate_model.clone(),
            edit_model: config.edit_model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, GatewayFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayFailure::Provider("API key is not configured".to_string()))?;

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GatewayFailure::Provider(format!("status={status}, {message}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayFailure::Provider(format!("Malformed response: {e}")))
    }
}

#[async_trait::async_trait]
impl ImageGateway for GeminiClient {
    async fn generate(&self, prompt: &str, count: u32) -> Result<GeneratedImages, GatewayError> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": count,
                "aspectRatio": self.aspect_ratio,
                "outputOptions": { "mimeType": "image/png" },
            },
        });

        debug!("Requesting {} image(s) from {}", count, self.generate_model);

        let response: PredictResponse = self
            .post_json(&self.endpoint(&self.generate_model, "predict"), &body)
            .await
            .map_err(GatewayError::Generation)?;

        interpret_predictions(response, count).map_err(GatewayError::Generation)
    }

    async fn edit(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<u8>, GatewayError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": BASE64.encode(image) } },
                    { "text": prompt },
                ],
            }],
            "generationConfig": { "responseModalities": ["IMAGE"] },
        });

        debug!("Requesting image edit from {}", self.edit_model);

        let response: GenerateContentResponse = self
            .post_json(&self.endpoint(&self.edit_model, "generateContent"), &body)
            .await
            .map_err(GatewayError::Edit)?;

        interpret_edit(response).map_err(GatewayError::Edit)
    }
}

fn map_transport_error(err: reqwest::Error) -> GatewayFailure {
    if err.is_connect() || err.is_timeout() {
        GatewayFailure::Offline
    } else {
        GatewayFailure::Provider(err.to_string())
    }
}

fn decode(data: &str) -> Result<Vec<u8>, GatewayFailure> {
    BASE64
        .decode(data)
        .map_err(|e| GatewayFailure::Provider(format!("Invalid image data: {e}")))
}

/// Splits predictions into images and safety-filter reasons.
fn interpret_predictions(
    response: PredictResponse,
    requested: u32,
) -> Result<GeneratedImages, GatewayFailure> {
    if response.predictions.is_empty() {
        return Err(GatewayFailure::NoResult(
            "No images were generated. This may be due to the safety policy. Try adjusting your prompt."
                .to_string(),
        ));
    }

    let mut images = Vec::new();
    let mut reasons = BTreeSet::new();

    for prediction in response.predictions {
        if let Some(data) = prediction.bytes_base64_encoded {
            images.push(decode(&data)?);
        } else if let Some(reason) = prediction.rai_filtered_reason {
            reasons.insert(reason);
        }
    }

    let reasons: Vec<String> = reasons.into_iter().collect();

    if images.is_empty() {
        if reasons.is_empty() {
            return Err(GatewayFailure::NoResult(
                "The API returned no valid image data.".to_string(),
            ));
        }
        return Err(GatewayFailure::NoResult(format!(
            "All images were blocked by the safety policy. Reason(s): {}",
            reasons.join(", ")
        )));
    }

    let partial_failure_note = (!reasons.is_empty()).then(|| {
        let blocked = (requested as usize).saturating_sub(images.len());
        format!(
            "{blocked} image(s) couldn't be generated due to safety policies. Reason(s): {}",
            reasons.join(", ")
        )
    });

    Ok(GeneratedImages {
        images,
        partial_failure_note,
    })
}

fn interpret_edit(response: GenerateContentResponse) -> Result<Vec<u8>, GatewayFailure> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        GatewayFailure::NoResult("The API returned an empty response.".to_string())
    })?;

    if let Some(reason) = candidate.finish_reason.as_deref()
        && reason != "STOP"
    {
        return Err(GatewayFailure::Provider(format!(
            "Image editing was stopped. Reason: {reason}. This may be due to a safety policy violation or an issue with the prompt."
        )));
    }

    let image = candidate
        .content
        .into_iter()
        .flat_map(|c| c.parts)
        .find_map(|p| p.inline_data);

    match image {
        Some(inline) => decode(&inline.data),
        None => Err(GatewayFailure::NoResult(
            "The API did not return an image, which could be due to a safety policy violation."
                .to_string(),
        )),
    }
}
