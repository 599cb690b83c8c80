use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Config;
use crate::error::ProxyError;

// https://ai.google.dev/api/generate-content
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    /// Entries may be `null`; only the first one is ever read.
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<Option<Candidate>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The API sometimes sends `null` where an empty list is meant.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl GenerateContentRequest {
    /// One user turn: the prompt followed by the source image, asking for an
    /// image back.
    pub fn image_edit(prompt: &str, mime_type: &str, image_data: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: Some(mime_type.to_string()),
                            data: Some(image_data.to_string()),
                        }),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first().and_then(Option::as_ref)
    }

    fn first_candidate_parts(&self) -> &[Part] {
        self.first_candidate()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// The first part of the first candidate that carries inline data decides
    /// the result; later parts are not consulted.
    pub fn first_inline_image(&self) -> Option<&str> {
        self.first_candidate_parts()
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .and_then(|inline| inline.data.as_deref())
            .filter(|data| !data.is_empty())
    }

    /// Text the model returned instead of an image, usually a refusal.
    fn text_parts(&self) -> Vec<&str> {
        self.first_candidate_parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

pub struct GeminiClient {
    http_client: reqwest::Client,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http_client: reqwest::Client, config: &Config) -> Self {
        Self {
            http_client,
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base,
            self.model,
            urlencoding::encode(api_key)
        )
    }

    /// Sends one generateContent call and returns the base64 image it produced.
    pub async fn generate_image(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, ProxyError> {
        let response = self
            .http_client
            .post(self.endpoint_url(api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                // the URL carries the key
                let e = e.without_url();
                tracing::error!("Google API request failed: {}", e);
                ProxyError::UpstreamRequest(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google API Error {}: {}", status, body);
            return Err(ProxyError::UpstreamStatus {
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let result = response
            .json::<Option<GenerateContentResponse>>()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Failed to parse Google API response: {}", e);
                ProxyError::UpstreamResponse(e)
            })?
            .unwrap_or_default();

        match result.first_inline_image() {
            Some(data) => Ok(data.to_string()),
            None => {
                tracing::warn!(
                    "No image data in Google API response (candidates: {}, finish reason: {:?}, text: {:?})",
                    result.candidates.len(),
                    result.first_candidate().and_then(|c| c.finish_reason.as_deref()),
                    result.text_parts()
                );
                Err(ProxyError::NoImageData)
            }
        }
    }
}
