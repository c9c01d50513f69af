//! Prompt templates for the two LLM calls.
//!
//! Placeholders are `{name}` tokens, all filled in one pass over the template. Substituted
//! values are never scanned again, so braces in page text, sender fields or portfolio links
//! stay as written. Tokens with no value are left untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{JobPosting, LinkMatch};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid regex"));

pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}
### INSTRUCTION:
The scraped text is from the career's page of a website.
Your job is to extract the job postings and return them in JSON format containing the following keys: `role`, `experience`, `skills` and `description`.
Only return the valid JSON.
### VALID JSON (NO PREAMBLE):
"#;

pub const EMAIL_PROMPT_TEMPLATE: &str = r#"### JOB DESCRIPTION:
{job_description}

### INSTRUCTION:

You are {writer_name}, a {writer_designation} at {company_name}. {company_name} is a leading AI & Software Consulting company specializing in the seamless integration of business processes through advanced automated tools.

Your task is to draft a concise, personalized cold email to the client based on the job description provided. The email should:

1. Clearly highlight how {company_name} can address the client's needs as described in the job description.
2. Emphasize the relevant skills and qualifications required for the job.
3. Incorporate the most pertinent links from {company_name}'s portfolio to showcase our capabilities and experience related to the job requirements.

Ensure that:
- The email is directly tailored to the job description.
- The email is brief and to the point, avoiding any unnecessary details or preamble.
- The relevant skills must be mentioned in paragraph or sentence form only.
- The portfolio links should be presented as bullet points in a separate list format, like below:

  **Portfolio:**
    - [Link 1]
    - [Link 2]
    - [Link 3]

- Ensure there is exactly **one line space** after "Best regards,"

### EMAIL (NO PREAMBLE):
Dear Hiring Manager,

[Insert concise email content here]

We have a proven track record of delivering impactful data science solutions and are confident in our ability to bring value to your organization. Here are some examples from our portfolio that showcase our relevant expertise:

Portfolio:
{link_list}

We would be delighted to discuss how our expertise can help you achieve your goals.

Thank you for considering our proposal. Please let me know if you need any additional information.

Best regards,

[One line space here]

{writer_name}
"#;

const NO_LINKS: &str = "(no portfolio links available)";

pub fn render_extract_prompt(page_text: &str) -> String {
    render(EXTRACT_PROMPT_TEMPLATE, &[("page_data", page_text)])
}

pub fn render_email_prompt(
    job: &JobPosting,
    links: &LinkMatch,
    name: &str,
    company: &str,
    designation: &str,
) -> String {
    let job_description =
        serde_json::to_string_pretty(job).unwrap_or_else(|_| format!("{job:?}"));

    let link_list = render_link_list(links);

    render(
        EMAIL_PROMPT_TEMPLATE,
        &[
            ("job_description", &job_description),
            ("writer_name", name),
            ("writer_designation", designation),
            ("company_name", company),
            ("link_list", &link_list),
        ],
    )
}

fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
        })
        .into_owned()
}

/// One `- <url>` bullet per matched link.
pub fn render_link_list(links: &LinkMatch) -> String {
    if links.is_empty() {
        return NO_LINKS.to_string();
    }
    links
        .urls()
        .map(|url| format!("- {url}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PortfolioLink;

    fn job() -> JobPosting {
        JobPosting {
            role: "Data Engineer".to_string(),
            experience: "3+ years".to_string(),
            skills: "Python, {company_name}".to_string(),
            description: "Build pipelines".to_string(),
        }
    }

    #[test]
    fn extract_prompt_embeds_page_text() {
        let prompt = render_extract_prompt("We are hiring a Rust engineer");
        assert!(prompt.contains("We are hiring a Rust engineer"));
        assert!(!prompt.contains("{page_data}"));
        assert!(prompt.contains("`role`, `experience`, `skills` and `description`"));
    }

    #[test]
    fn email_prompt_fills_identity_and_links() {
        let links = LinkMatch {
            links: vec![PortfolioLink {
                link: "https://example.com/ml".to_string(),
                tech_stack: "Python, Pandas".to_string(),
                score: 0.9,
            }],
        };
        let prompt = render_email_prompt(&job(), &links, "Jane Doe", "Acme AI", "CTO");

        assert!(prompt.contains("You are Jane Doe, a CTO at Acme AI."));
        assert!(prompt.contains("Portfolio:\n- https://example.com/ml\n"));
        assert!(prompt.trim_end().ends_with("Jane Doe"));
        assert!(!prompt.contains("{writer_name}"));
        assert!(!prompt.contains("{link_list}"));
    }

    #[test]
    fn job_text_is_not_treated_as_template() {
        let prompt = render_email_prompt(&job(), &LinkMatch::default(), "Jane", "Acme", "CTO");
        assert!(prompt.contains("Python, {company_name}"));
        assert!(prompt.contains(NO_LINKS));
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let links = LinkMatch {
            links: vec![PortfolioLink {
                link: "http://x/{job_description}".to_string(),
                tech_stack: "Go".to_string(),
                score: 0.5,
            }],
        };
        let prompt = render_email_prompt(&job(), &links, "Ann {link_list}", "Acme", "CTO");

        assert!(prompt.contains("You are Ann {link_list}, a CTO at Acme."));
        assert!(prompt.contains("Portfolio:\n- http://x/{job_description}\n"));
        assert!(prompt.trim_end().ends_with("Ann {link_list}"));
        assert_eq!(prompt.matches("Build pipelines").count(), 1);
    }

    #[test]
    fn page_text_braces_survive_extraction_prompt() {
        let prompt = render_extract_prompt("Salary {page_data} negotiable");
        assert!(prompt.contains("Salary {page_data} negotiable"));
    }
}
