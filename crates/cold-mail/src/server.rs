/// MCP server for the cold email generator.
///
/// Exposes three tools:
/// - `generate_email`: Run the fetch, extract, match and compose pipeline for one careers page
/// - `create_mailto_link`: Wrap a subject and body into a `mailto:` link
/// - `reindex_portfolio`: Rebuild the portfolio vector table from a CSV
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::{info, warn};

use crate::api::{
    GenerateEmailParams, MailtoParams, MailtoResponse, ReindexParams, ReindexResponse,
};
use crate::mailto::create_mailto_link;
use crate::matcher::PortfolioMatcher;
use crate::model::{Outreach, OutreachRequest};
use crate::pipeline::OutreachPipeline;

#[derive(Clone)]
pub struct ColdMailServer {
    pipeline: Arc<OutreachPipeline>,
    matcher: Arc<PortfolioMatcher>,
    tool_router: ToolRouter<ColdMailServer>,
}

impl ColdMailServer {
    pub fn new(pipeline: Arc<OutreachPipeline>, matcher: Arc<PortfolioMatcher>) -> Self {
        Self {
            pipeline,
            matcher,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl ColdMailServer {
    #[tool(description = "Generate a cold email for a job posting. Scrapes the careers page at `url`, extracts the job, picks up to two matching portfolio links and drafts the email. Returns the job, links, email text and a mailto link.")]
    async fn generate_email(
        &self,
        Parameters(params): Parameters<GenerateEmailParams>,
    ) -> Result<Json<Outreach>, String> {
        let request = OutreachRequest::from(params);
        match self.pipeline.run(&request).await {
            Ok(outreach) => Ok(Json(outreach)),
            Err(e) => {
                warn!(error = %e, "email generation failed");
                Err(e.user_message())
            }
        }
    }

    #[tool(description = "Build a mailto: link with a percent-encoded subject and body, ready to open in a mail client.")]
    async fn create_mailto_link(
        &self,
        Parameters(params): Parameters<MailtoParams>,
    ) -> Result<Json<MailtoResponse>, String> {
        Ok(Json(MailtoResponse {
            mailto_link: create_mailto_link(&params.recipient, &params.subject, &params.body),
        }))
    }

    #[tool(description = "Rebuild the portfolio vector table from the built-in CSV or an uploaded one, replacing whatever is indexed.")]
    async fn reindex_portfolio(
        &self,
        Parameters(params): Parameters<ReindexParams>,
    ) -> Result<Json<ReindexResponse>, String> {
        info!(portfolio = ?params.portfolio, "reindex_portfolio tool invoked");
        let rows = self
            .matcher
            .reindex(&params.portfolio)
            .await
            .map_err(|e| e.user_message())?;
        Ok(Json(ReindexResponse { rows }))
    }
}

#[tool_handler]
impl ServerHandler for ColdMailServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "cold-mail".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Cold email generator. Use generate_email with a careers page URL, a chat \
                 API key and the sender's name, company and designation to draft an outreach \
                 email that cites matching portfolio projects. create_mailto_link wraps any \
                 draft for a mail client, and reindex_portfolio refreshes the portfolio index."
                    .to_string(),
            ),
        }
    }
}
