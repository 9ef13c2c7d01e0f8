//! Gemini API client

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::gateway::Completion;
use crate::error::ModelError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// Fixed generation parameters; not user-tunable.
const TEMPERATURE: f32 = 0.2;
const TOP_P: f32 = 0.8;
const TOP_K: i32 = 40;

/// Gemini client for text generation requests
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: i32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }
}

impl Completion for GeminiClient {
    async fn complete(&self, payload: &str) -> Result<String, ModelError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: payload.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                top_k: TOP_K,
            },
        };

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, message });
        }

        let generated: GenerateResponse = response.json().await?;
        generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(ModelError::EmptyResponse)
    }
}
