use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::TailoringResult;

#[derive(Debug, Error)]
pub enum TailorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No response from AI service")]
    NoResponse,

    #[error("Failed to parse tailoring result: {0}")]
    Parse(#[from] serde_json::Error),
}

// --- Provider trait ---

#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Sends `prompt` with a declared JSON output schema and returns the raw
    /// text payload, or `None` when the service produced no text.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<Option<String>, TailorError>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub model_id: String,
    pub short_name: String,
}

pub const DEFAULT_MODEL: &str = "gemini-3-pro";

pub fn resolve_model(name: &str) -> Result<ModelSpec> {
    match name {
        "gemini-3-pro" | "pro" => Ok(ModelSpec {
            model_id: "gemini-3-pro-preview".to_string(),
            short_name: "gemini-3-pro".to_string(),
        }),
        "gemini-2.5-pro" => Ok(ModelSpec {
            model_id: "gemini-2.5-pro".to_string(),
            short_name: "gemini-2.5-pro".to_string(),
        }),
        "gemini-2.5-flash" | "flash" => Ok(ModelSpec {
            model_id: "gemini-2.5-flash".to_string(),
            short_name: "gemini-2.5-flash".to_string(),
        }),
        _ => Err(anyhow!(
            "Unknown model '{}'. Available: gemini-3-pro (default), gemini-2.5-pro, gemini-2.5-flash",
            name
        )),
    }
}

pub fn create_provider(spec: &ModelSpec, config: &Config) -> Result<Arc<dyn AIProvider>> {
    let provider = GeminiProvider::new(config.api_key.clone(), spec.model_id.clone())?
        .with_base_url(config.api_base.clone());
    Ok(Arc::new(provider))
}

// --- Gemini provider ---

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

impl GeminiResponse {
    /// Text parts of the first candidate joined together, skipping thought
    /// summaries.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[derive(Debug)]
pub struct GeminiProvider {
    api_key: String,
    model_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model_id: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow!(
                "Gemini API key is empty. Set it with: export GEMINI_API_KEY=your-key-here"
            ));
        }
        Ok(Self {
            api_key,
            model_id,
            base_url: GEMINI_API_BASE.to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_id
        )
    }
}

fn request_body<'a>(prompt: &'a str, schema: &'a Value) -> GeminiRequest<'a> {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart { text: prompt }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        },
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<Option<String>, TailorError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, schema))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TailorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: GeminiResponse = response.json().await?;
        Ok(api_response.text())
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Tailoring ---

pub fn build_tailoring_prompt(resume: &str, job_text: &str) -> String {
    format!(
        "You are an expert Executive Career Coach and Resume Writer with 20+ years of experience \
        in technical recruiting and HR.\n\n\
        TASK:\n\
        Rewrite the following resume to perfectly align with the provided job description.\n\n\
        GOALS:\n\
        1. Optimize for ATS (Applicant Tracking Systems) by naturally incorporating relevant keywords from the job description.\n\
        2. Quantify achievements (e.g., \"Increased revenue by 20%\", \"Reduced latency by 50ms\").\n\
        3. Ensure the summary and top-level skills section highlight exactly what the job description is looking for.\n\
        4. Maintain the professional truth of the original resume: do not invent experiences, but rephrase existing ones to emphasize relevance.\n\
        5. Return the result in a structured JSON format.\n\n\
        ORIGINAL RESUME:\n{}\n\n\
        JOB DESCRIPTION:\n{}\n",
        resume, job_text
    )
}

/// Output schema declared to the service, in Gemini's OpenAPI subset.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "tailoredResume": {
                "type": "STRING",
                "description": "The complete rewritten resume in professional Markdown format."
            },
            "keyChanges": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "A list of key strategic changes made to the resume."
            },
            "matchScore": {
                "type": "NUMBER",
                "description": "An estimated match score from 0 to 100 between the new resume and the job requirements."
            }
        },
        "required": ["tailoredResume", "keyChanges", "matchScore"]
    })
}

pub fn parse_tailoring_response(text: Option<&str>) -> Result<TailoringResult, TailorError> {
    let text = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(TailorError::NoResponse)?;
    Ok(serde_json::from_str(text)?)
}

pub async fn tailor_resume(
    provider: &dyn AIProvider,
    resume: &str,
    job_text: &str,
) -> Result<TailoringResult, TailorError> {
    let prompt = build_tailoring_prompt(resume, job_text);
    let schema = response_schema();

    debug!(
        model = provider.model_name(),
        resume_chars = resume.len(),
        job_chars = job_text.len(),
        "requesting tailored resume"
    );

    let text = provider.generate_structured(&prompt, &schema).await?;
    let result = parse_tailoring_response(text.as_deref())?;

    if !result.score_in_range() {
        warn!(score = result.match_score, "match score outside 0-100");
    }
    debug!(
        changes = result.key_changes.len(),
        score = result.match_score,
        "tailoring complete"
    );

    Ok(result)
}
