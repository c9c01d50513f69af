/// Job extraction: page text in, one `JobPosting` out.
///
/// The model is asked for a JSON object with `role`, `experience`, `skills` and
/// `description`. A JSON array is accepted and reduced to its first element. The reply may
/// wrap the JSON in a Markdown code fence, with or without text before it. Anything that
/// cannot be read as a posting becomes `AppError::ContextTooBig`; the page text is never
/// chunked or truncated first.
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{info, warn};

use outreach_common::openai::OpenAiClient;

use crate::error::AppError;
use crate::model::JobPosting;
use crate::prompts;

// First fenced block anywhere in the reply; an unclosed fence runs to the end.
static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*(?:```|$)").expect("valid regex"));

pub struct JobExtractor {
    openai: OpenAiClient,
    model: String,
}

impl JobExtractor {
    pub fn new(openai: OpenAiClient, model: String) -> Self {
        Self { openai, model }
    }

    pub async fn extract(&self, page_text: &str, api_key: &str) -> Result<JobPosting, AppError> {
        let prompt = prompts::render_extract_prompt(page_text);
        let raw = self
            .openai
            .with_api_key(api_key)
            .complete(&self.model, prompt, Some(0.0))
            .await?;

        let job = parse_job_posting(&raw)?;
        info!(role = %job.role, "job posting extracted");
        Ok(job)
    }
}

pub fn parse_job_posting(raw: &str) -> Result<JobPosting, AppError> {
    let value = parse_json_reply(raw).ok_or_else(|| {
        warn!("extraction response is not valid JSON");
        AppError::ContextTooBig
    })?;

    let first = match value {
        Value::Array(items) => {
            if items.len() > 1 {
                info!(discarded = items.len() - 1, "keeping first of several job postings");
            }
            items.into_iter().next()
        }
        other => Some(other),
    };

    let Some(Value::Object(fields)) = first else {
        warn!("extraction response is not a JSON object");
        return Err(AppError::ContextTooBig);
    };

    Ok(JobPosting {
        role: field_text(&fields, "role"),
        experience: field_text(&fields, "experience"),
        skills: field_text(&fields, "skills"),
        description: field_text(&fields, "description"),
    })
}

/// Flatten whatever the model put under `key` into a string.
///
/// Lists are joined with ", ", scalars are stringified, null or absent becomes "".
fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// The reply as JSON, or the contents of its first fenced block when the reply as a whole
/// is not JSON.
fn parse_json_reply(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(strip_json_fences(raw)) {
        return Some(value);
    }
    let inner = FENCED_BLOCK_RE.captures(raw)?.get(1)?.as_str();
    serde_json::from_str(inner).ok()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}
