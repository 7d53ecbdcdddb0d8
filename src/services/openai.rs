// src/services/openai.rs
use crate::profile::merger::ExtractedProfileFields;
use crate::services::settings::SettingsService;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Settings error: {0}")]
    SettingsError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub models: ModelConfig,
    pub reasoning_effort: ReasoningEffortConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub extraction: String,
    pub review: String,
    pub mentor: String,
    pub interview: String,
}

#[derive(Debug, Clone)]
pub struct ReasoningEffortConfig {
    pub extraction: String,
    pub review: String,
    pub mentor: String,
    pub interview: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            extraction: "gpt-5-mini".to_string(),
            review: "gpt-5-mini".to_string(),
            mentor: "gpt-5-mini".to_string(),
            interview: "gpt-5-mini".to_string(),
        }
    }
}

impl Default for ReasoningEffortConfig {
    fn default() -> Self {
        Self {
            extraction: "medium".to_string(),
            review: "medium".to_string(),
            mentor: "low".to_string(),
            interview: "low".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TextGenerationPurpose {
    ProfileExtraction,
    DocumentReview,
    MentorChat,
    InterviewQuestions,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    messages: Option<Vec<ChatMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[allow(dead_code)]
    id: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    #[allow(dead_code)]
    prompt_tokens: u32,
    #[serde(default)]
    #[allow(dead_code)]
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug)]
pub struct OpenAIService {
    settings_service: Arc<SettingsService>,
    client: Client,
}

impl OpenAIService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings_service,
            client,
        }
    }

    /// Get OpenAI configuration from settings
    pub async fn get_config(&self) -> Result<OpenAIConfig, OpenAIError> {
        let api_key = self
            .settings_service
            .get_setting("openai_api_key")
            .await
            .map_err(|e| OpenAIError::SettingsError(e.to_string()))?
            .ok_or(OpenAIError::NotConfigured)?;

        let base_url = self
            .settings_service
            .get_setting("openai_base_url")
            .await
            .map_err(|e| OpenAIError::SettingsError(e.to_string()))?
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let models = ModelConfig {
            extraction: self
                .get_model_setting("openai_model_extraction", "gpt-5-mini")
                .await?,
            review: self
                .get_model_setting("openai_model_review", "gpt-5-mini")
                .await?,
            mentor: self
                .get_model_setting("openai_model_mentor", "gpt-5-mini")
                .await?,
            interview: self
                .get_model_setting("openai_model_interview", "gpt-5-mini")
                .await?,
        };

        let reasoning_effort = ReasoningEffortConfig {
            extraction: self
                .get_model_setting("openai_reasoning_effort_extraction", "medium")
                .await?,
            review: self
                .get_model_setting("openai_reasoning_effort_review", "medium")
                .await?,
            mentor: self
                .get_model_setting("openai_reasoning_effort_mentor", "low")
                .await?,
            interview: self
                .get_model_setting("openai_reasoning_effort_interview", "low")
                .await?,
        };

        Ok(OpenAIConfig {
            api_key,
            base_url,
            models,
            reasoning_effort,
        })
    }

    async fn get_model_setting(&self, key: &str, default: &str) -> Result<String, OpenAIError> {
        Ok(self
            .settings_service
            .get_setting(key)
            .await
            .map_err(|e| OpenAIError::SettingsError(e.to_string()))?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Generate text using the OpenAI API
    pub async fn generate_text(
        &self,
        purpose: TextGenerationPurpose,
        prompt: &str,
        context: Option<serde_json::Value>,
    ) -> Result<String, OpenAIError> {
        let config = self.get_config().await?;

        let (model, reasoning_effort) = match purpose {
            TextGenerationPurpose::ProfileExtraction => (
                &config.models.extraction,
                &config.reasoning_effort.extraction,
            ),
            TextGenerationPurpose::DocumentReview => {
                (&config.models.review, &config.reasoning_effort.review)
            }
            TextGenerationPurpose::MentorChat => {
                (&config.models.mentor, &config.reasoning_effort.mentor)
            }
            TextGenerationPurpose::InterviewQuestions => (
                &config.models.interview,
                &config.reasoning_effort.interview,
            ),
        };

        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: self.get_system_prompt(purpose),
        }];

        if let Some(ctx) = context {
            let context_str = serde_json::to_string_pretty(&ctx)
                .map_err(|e| OpenAIError::SerializationError(e.to_string()))?;
            messages.push(ChatMessage {
                role: "user".to_string(),
                content: format!("Context:\n{}\n\nTask:\n{}", context_str, prompt),
            });
        } else {
            messages.push(ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            });
        }

        // GPT-5 family uses the Responses API (input + reasoning); older
        // models use Chat Completions (messages).
        let is_gpt5 =
            model.starts_with("gpt-5") || model.starts_with("o1") || model.starts_with("o3");

        let request = if is_gpt5 {
            let content: Vec<serde_json::Value> = messages
                .iter()
                .map(|msg| {
                    serde_json::json!({
                        "type": "input_text",
                        "text": msg.content
                    })
                })
                .collect();

            ChatCompletionRequest {
                model: model.clone(),
                messages: None,
                input: Some(vec![serde_json::json!({
                    "role": "user",
                    "content": content
                })]),
                temperature: None,
                max_tokens: None,
                max_output_tokens: Some(4000),
                reasoning: Some(serde_json::json!({"effort": reasoning_effort})),
                text: Some(serde_json::json!({"format": {"type": "text"}})),
            }
        } else {
            ChatCompletionRequest {
                model: model.clone(),
                messages: Some(messages),
                input: None,
                temperature: Some(0.7),
                max_tokens: Some(2000),
                max_output_tokens: None,
                reasoning: None,
                text: None,
            }
        };

        debug!(
            purpose = ?purpose,
            model = %model,
            reasoning_effort = %reasoning_effort,
            "Sending OpenAI text generation request"
        );

        let response = self.make_request_with_retry(&config, request).await?;

        let generated_text = if !response.output.is_empty() {
            let mut text_found: Option<String> = None;

            for output in &response.output {
                if let Some(content_item) = output.content.first() {
                    if let Some(txt) = &content_item.text {
                        text_found = Some(txt.clone());
                        break;
                    }
                }
            }

            text_found.ok_or_else(|| {
                error!(
                    "Failed to extract text from response, output items: {}",
                    response.output.len()
                );
                OpenAIError::InvalidResponse("No text in output".to_string())
            })?
        } else {
            response
                .choices
                .first()
                .ok_or_else(|| OpenAIError::InvalidResponse("No choices in response".to_string()))?
                .message
                .content
                .clone()
        };

        if let Some(usage) = response.usage {
            info!(
                purpose = ?purpose,
                model = %model,
                tokens_used = usage.total_tokens,
                "OpenAI text generation completed"
            );
        }

        Ok(generated_text)
    }

    /// Run structured profile extraction over document text
    pub async fn extract_profile_fields(
        &self,
        document_text: &str,
    ) -> Result<ExtractedProfileFields, OpenAIError> {
        let prompt = format!(
            r#"Extract structured candidate information from this CV text. Return a JSON object with this exact structure:
{{
  "name": "full name or empty string",
  "email": "email address or empty string",
  "phone": "phone number or empty string",
  "position": "current or most recent job title or empty string",
  "skills": "comma-separated skill list or empty string",
  "experience": "short summary of work experience or empty string",
  "languages": [{{"language": "English", "proficiency": "Native"}}]
}}

Return ONLY the JSON object, no commentary.

CV text:
{}"#,
            document_text
        );

        let raw = self
            .generate_text(TextGenerationPurpose::ProfileExtraction, &prompt, None)
            .await?;

        let json_text = extract_json_block(&raw);
        serde_json::from_str::<ExtractedProfileFields>(&json_text).map_err(|e| {
            warn!(error = %e, "Extraction response was not valid JSON");
            OpenAIError::InvalidResponse(format!("extraction output not parseable: {}", e))
        })
    }

    /// Score a document against a job description. Returns the raw parsed
    /// JSON; weighted rescaling happens in the caller's post-processing.
    pub async fn review_document(
        &self,
        document_text: &str,
        job_description: &str,
    ) -> Result<serde_json::Value, OpenAIError> {
        let prompt = format!(
            r#"Review this CV against the job description. Return a JSON object:
{{
  "summary": "2-3 sentence assessment",
  "strengths": ["..."],
  "gaps": ["..."],
  "sub_scores": [
    {{"area": "skills match", "score": 0-100, "weight": 0.4}},
    {{"area": "experience match", "score": 0-100, "weight": 0.4}},
    {{"area": "presentation", "score": 0-100, "weight": 0.2}}
  ]
}}

Return ONLY the JSON object.

Job description:
{}

CV text:
{}"#,
            job_description, document_text
        );

        let raw = self
            .generate_text(TextGenerationPurpose::DocumentReview, &prompt, None)
            .await?;

        let json_text = extract_json_block(&raw);
        serde_json::from_str(&json_text).map_err(|e| {
            OpenAIError::InvalidResponse(format!("review output not parseable: {}", e))
        })
    }

    /// Make API request with retry logic
    async fn make_request_with_retry(
        &self,
        config: &OpenAIConfig,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAIError> {
        let max_retries = 3;
        let mut last_error = None;

        for attempt in 1..=max_retries {
            match self.make_request(config, &request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        error = %e,
                        "OpenAI API request failed, retrying..."
                    );
                    last_error = Some(e);

                    // Exponential backoff
                    if attempt < max_retries {
                        let delay =
                            std::time::Duration::from_millis(1000 * 2_u64.pow(attempt - 1));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| OpenAIError::RequestFailed("Unknown error".to_string())))
    }

    /// Make a single API request
    async fn make_request(
        &self,
        config: &OpenAIConfig,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAIError> {
        // Use /v1/responses for GPT-5 models, /v1/chat/completions for others
        let endpoint = if request.model.starts_with("gpt-5")
            || request.model.starts_with("o1")
            || request.model.starts_with("o3")
        {
            "v1/responses"
        } else {
            "v1/chat/completions"
        };
        let url = format!("{}/{}", config.base_url.trim_end_matches('/'), endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| OpenAIError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OpenAIError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI API request failed");
            return Err(OpenAIError::RequestFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| OpenAIError::InvalidResponse(e.to_string()))
    }

    fn get_system_prompt(&self, purpose: TextGenerationPurpose) -> String {
        match purpose {
            TextGenerationPurpose::ProfileExtraction => {
                "You extract structured candidate data from CV text. You respond with strict JSON only."
            }
            TextGenerationPurpose::DocumentReview => {
                "You are a senior recruiter reviewing CVs against job descriptions. You respond with strict JSON only."
            }
            TextGenerationPurpose::MentorChat => {
                "You are a supportive career mentor. Give practical, concrete advice on job hunting, CVs, and interviews. Keep answers concise."
            }
            TextGenerationPurpose::InterviewQuestions => {
                "You generate realistic interview questions for a given role. You respond with strict JSON only."
            }
        }
        .to_string()
    }
}

/// Strip markdown code fences from a model response, returning the inner
/// JSON when the model wrapped it despite instructions.
pub fn extract_json_block(raw: &str) -> String {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("static regex");
    if let Some(captures) = fence.captures(raw) {
        return captures[1].to_string();
    }
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_block_strips_fences() {
        let raw = "Here you go:\n```json\n{\"name\": \"Jan\"}\n```\nDone.";
        assert_eq!(extract_json_block(raw), "{\"name\": \"Jan\"}");
    }

    #[test]
    fn test_extract_json_block_plain_fence() {
        let raw = "```\n{\"a\":1}\n```";
        assert_eq!(extract_json_block(raw), "{\"a\":1}");
    }

    #[test]
    fn test_extract_json_block_passthrough() {
        let raw = "  {\"a\":1}  ";
        assert_eq!(extract_json_block(raw), "{\"a\":1}");
    }
}
