use crate::embeddings::GEMINI_API_BASE;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait ChatModel {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub struct GeminiChatModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

impl GeminiChatModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let model = model.into();
        let model = model.trim_start_matches("models/").to_string();

        Ok(Self {
            client,
            base_url: GEMINI_API_BASE.to_string(),
            model,
            api_key: api_key.into(),
            temperature: None,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn endpoint(&self) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        ))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: self
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let response = self
            .client
            .post(self.endpoint()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "gemini",
                status,
                details,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        candidate_text(parsed)
    }
}

fn candidate_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(ProviderError::InvalidResponse {
            provider: "gemini",
            details: "response has no candidates".to_string(),
        })?;

    let parts = candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default();

    let text = parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(ProviderError::InvalidResponse {
            provider: "gemini",
            details: "candidate has no text parts".to_string(),
        });
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{candidate_text, GenerateResponse};

    #[test]
    fn candidate_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "The document covers " },
                        { "text": "hydraulic safety." }
                    ]
                }
            }]
        }))
        .unwrap();

        let text = candidate_text(response).unwrap();
        assert_eq!(text, "The document covers hydraulic safety.");
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let response: GenerateResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [] })).unwrap();
        assert!(candidate_text(response).is_err());
    }

    #[test]
    fn blank_parts_are_an_error() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "  " }] } }]
        }))
        .unwrap();
        assert!(candidate_text(response).is_err());
    }
}
