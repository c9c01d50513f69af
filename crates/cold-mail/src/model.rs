use std::fmt;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A job posting pulled out of a careers page by the extraction prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobPosting {
    /// Job title, e.g. "Senior Data Engineer"
    pub role: String,
    /// Required experience as written on the page, e.g. "3+ years"
    pub experience: String,
    /// Skills text; this is what the portfolio is searched with
    pub skills: String,
    /// Free-form description of the role
    pub description: String,
}

/// One row of the portfolio CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioEntry {
    /// Generated UUID v4, assigned at load time
    pub id: String,
    /// `Techstack` column; the text that gets embedded
    pub tech_stack: String,
    /// `Links` column; returned as match metadata
    pub link: String,
}

/// Where the portfolio table is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortfolioSource {
    /// A CSV the user supplied.
    Uploaded { path: PathBuf },
    /// The CSV shipped with the tool.
    Builtin,
}

/// A portfolio link returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PortfolioLink {
    pub link: String,
    pub tech_stack: String,
    /// 1.0 - L2 distance, clamped at 0. Higher is more similar.
    pub score: f32,
}

/// Ranked portfolio matches for one job, best first. Holds at most two entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinkMatch {
    pub links: Vec<PortfolioLink>,
}

impl LinkMatch {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.link.as_str())
    }
}

/// Email text as returned by the drafting prompt, plus any formatting rules it missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EmailDraft {
    pub text: String,
    pub format_warnings: Vec<String>,
}

/// Everything one run of the pipeline needs.
///
/// Built fresh for every submission; the caller decides what to remember between runs.
#[derive(Clone, Default)]
pub struct OutreachRequest {
    pub url: String,
    pub api_key: String,
    pub name: String,
    pub company: String,
    pub designation: String,
    pub portfolio: Option<PortfolioSource>,
    /// Address for the mailto link. Empty leaves the recipient for the mail client.
    pub recipient: Option<String>,
    /// Subject for the mailto link. Defaults to one derived from the job role.
    pub subject: Option<String>,
}

impl OutreachRequest {
    /// Checks that every required field holds non-blank text.
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("url", &self.url),
            ("api_key", &self.api_key),
            ("name", &self.name),
            ("company", &self.company),
            ("designation", &self.designation),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingFields(missing))
        }
    }
}

impl fmt::Debug for OutreachRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutreachRequest")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("name", &self.name)
            .field("company", &self.company)
            .field("designation", &self.designation)
            .field("portfolio", &self.portfolio)
            .field("recipient", &self.recipient)
            .field("subject", &self.subject)
            .finish()
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Outreach {
    pub job: JobPosting,
    pub links: LinkMatch,
    pub email: EmailDraft,
    pub mailto_link: String,
}
