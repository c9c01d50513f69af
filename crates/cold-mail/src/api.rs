//! Tool parameter and response types published over MCP.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{OutreachRequest, PortfolioSource};

#[derive(Clone, Deserialize, JsonSchema)]
pub struct GenerateEmailParams {
    /// Careers page to read the job posting from.
    #[serde(default)]
    pub url: String,
    /// API key for the chat completions provider (Groq by default). Used for this call only.
    #[serde(default)]
    pub api_key: String,
    /// Sender's name, used in the signature.
    #[serde(default)]
    pub name: String,
    /// Sender's company.
    #[serde(default)]
    pub company: String,
    /// Sender's designation, e.g. "Business Development Executive".
    #[serde(default)]
    pub designation: String,
    /// Portfolio to match links from: `{"kind": "builtin"}` or
    /// `{"kind": "uploaded", "path": "/path/to/portfolio.csv"}`. Omit to draft without links.
    pub portfolio: Option<PortfolioSource>,
    /// Recipient address for the mailto link.
    pub recipient: Option<String>,
    /// Subject for the mailto link. Defaults to one derived from the job role.
    pub subject: Option<String>,
}

impl From<GenerateEmailParams> for OutreachRequest {
    fn from(p: GenerateEmailParams) -> Self {
        OutreachRequest {
            url: p.url,
            api_key: p.api_key,
            name: p.name,
            company: p.company,
            designation: p.designation,
            portfolio: p.portfolio,
            recipient: p.recipient,
            subject: p.subject,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MailtoParams {
    /// Recipient address. May be empty.
    #[serde(default)]
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MailtoResponse {
    pub mailto_link: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReindexParams {
    /// Portfolio to rebuild the index from.
    pub portfolio: PortfolioSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReindexResponse {
    /// Rows written to the vector table.
    pub rows: usize,
}
