/// Email drafting.
///
/// Formatting rules (bulleted portfolio links, one blank line after "Best regards,") are
/// requested in the prompt only. `format_warnings` reports which ones the draft missed;
/// the draft is returned unchanged either way.
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use outreach_common::openai::OpenAiClient;

use crate::error::AppError;
use crate::model::{EmailDraft, JobPosting, LinkMatch};
use crate::prompts;

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+\.)\s+\S").expect("valid regex"));

const CLOSING_LINE: &str = "Best regards,";

/// Sender identity interpolated into the drafting prompt.
#[derive(Debug, Clone, Copy)]
pub struct Sender<'a> {
    pub name: &'a str,
    pub company: &'a str,
    pub designation: &'a str,
}

pub struct EmailComposer {
    openai: OpenAiClient,
    model: String,
}

impl EmailComposer {
    pub fn new(openai: OpenAiClient, model: String) -> Self {
        Self { openai, model }
    }

    pub async fn compose(
        &self,
        job: &JobPosting,
        links: &LinkMatch,
        sender: Sender<'_>,
        api_key: &str,
    ) -> Result<EmailDraft, AppError> {
        let prompt = prompts::render_email_prompt(
            job,
            links,
            sender.name,
            sender.company,
            sender.designation,
        );
        let text = self
            .openai
            .with_api_key(api_key)
            .complete(&self.model, prompt, Some(0.0))
            .await?;

        let format_warnings = format_warnings(&text, links);
        for warning in &format_warnings {
            warn!(warning = %warning, "drafted email deviates from requested format");
        }
        info!(chars = text.chars().count(), "email drafted");

        Ok(EmailDraft {
            text,
            format_warnings,
        })
    }
}

/// Formatting rules from the prompt that `text` does not follow.
pub fn format_warnings(text: &str, links: &LinkMatch) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut warnings = Vec::new();

    for url in links.urls() {
        let bulleted = lines
            .iter()
            .any(|line| line.contains(url) && BULLET_RE.is_match(line));
        if !bulleted {
            warnings.push(format!("portfolio link {url} is not listed as a bullet point"));
        }
    }

    match lines.iter().position(|line| line.trim() == CLOSING_LINE) {
        None => warnings.push(format!("closing line \"{CLOSING_LINE}\" is missing")),
        Some(idx) => {
            let blank_after = lines[idx + 1..]
                .iter()
                .take_while(|line| line.trim().is_empty())
                .count();
            let has_signature = idx + 1 + blank_after < lines.len();
            if blank_after != 1 || !has_signature {
                warnings.push(format!(
                    "expected exactly one blank line between \"{CLOSING_LINE}\" and the signature, found {blank_after}"
                ));
            }
        }
    }

    warnings
}
