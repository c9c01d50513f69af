/// The four-stage outreach pipeline: fetch, extract, match, compose.
///
/// Stages run one after another for a single request; the first error ends the run and
/// nothing partial is returned. Field validation happens before any network call.
use std::sync::Arc;

use tracing::info;

use crate::compose::{EmailComposer, Sender};
use crate::error::AppError;
use crate::extract::JobExtractor;
use crate::fetch::PageFetcher;
use crate::mailto::create_mailto_link;
use crate::matcher::PortfolioMatcher;
use crate::model::{JobPosting, Outreach, OutreachRequest};

pub struct OutreachPipeline {
    fetcher: PageFetcher,
    extractor: JobExtractor,
    matcher: Arc<PortfolioMatcher>,
    composer: EmailComposer,
}

impl OutreachPipeline {
    pub fn new(
        fetcher: PageFetcher,
        extractor: JobExtractor,
        matcher: Arc<PortfolioMatcher>,
        composer: EmailComposer,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            matcher,
            composer,
        }
    }

    pub async fn run(&self, request: &OutreachRequest) -> Result<Outreach, AppError> {
        request.validate()?;
        info!(url = %request.url, portfolio = ?request.portfolio, "generating outreach email");

        let page_text = self.fetcher.fetch(request.url.trim()).await?;
        let job = self.extractor.extract(&page_text, &request.api_key).await?;
        let links = self
            .matcher
            .match_links(&job, request.portfolio.as_ref())
            .await?;
        let email = self
            .composer
            .compose(
                &job,
                &links,
                Sender {
                    name: &request.name,
                    company: &request.company,
                    designation: &request.designation,
                },
                &request.api_key,
            )
            .await?;

        let subject = request
            .subject
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_subject(&job, &request.company));
        let mailto_link = create_mailto_link(
            request.recipient.as_deref().unwrap_or_default(),
            &subject,
            &email.text,
        );

        info!(
            role = %job.role,
            links = links.len(),
            format_warnings = email.format_warnings.len(),
            "outreach email generated"
        );
        Ok(Outreach {
            job,
            links,
            email,
            mailto_link,
        })
    }
}

fn default_subject(job: &JobPosting, company: &str) -> String {
    let role = job.role.trim();
    if role.is_empty() {
        format!("{company}: regarding your opening")
    } else {
        format!("{company}: regarding your {role} opening")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::Duration;

    use arrow_array::{Array, StringArray};
    use outreach_common::embedding::TextEmbedder;
    use outreach_common::openai::{OpenAiClient, OpenAiClientConfig};
    use outreach_common::vectordb::VectorDb;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::{CONTEXT_TOO_BIG, FILL_ALL_FIELDS};
    use crate::model::PortfolioSource;
    use crate::testing::{completion_body, HashEmbedder};

    const PORTFOLIO: &str = "Techstack,Links\n\"Python, Pandas\",http://a\n\"React, Node\",http://b\n";
    const JOB_JSON: &str = r#"[{"role": "Data Engineer", "experience": "3 years", "skills": "Python", "description": "Pipelines"},
                              {"role": "Frontend Dev", "experience": "1 year", "skills": "React", "description": "UI"}]"#;
    const EMAIL: &str = "Dear Hiring Manager,\n\nPortfolio:\n- http://a\n\nBest regards,\n\nJane Doe";

    struct Harness {
        _dir: tempfile::TempDir,
        server: MockServer,
        embedder: Arc<HashEmbedder>,
        vectordb: Arc<VectorDb>,
        pipeline: OutreachPipeline,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = dir.path().join("portfolio.csv");
        std::fs::write(&csv, PORTFOLIO).unwrap();

        let server = MockServer::start().await;
        let vectordb = Arc::new(
            VectorDb::connect(dir.path().join("vectorstore").to_str().unwrap())
                .await
                .unwrap(),
        );
        let embedder = Arc::new(HashEmbedder::default());
        let matcher = Arc::new(PortfolioMatcher::new(
            Arc::clone(&embedder) as Arc<dyn TextEmbedder>,
            Arc::clone(&vectordb),
            csv,
        ));
        let openai = OpenAiClient::new(OpenAiClientConfig {
            base_url: server.uri(),
            ..OpenAiClientConfig::default()
        })
        .unwrap();
        let pipeline = OutreachPipeline::new(
            PageFetcher::new(Duration::from_secs(5)).unwrap(),
            JobExtractor::new(openai.clone(), "test-model".to_string()),
            matcher,
            EmailComposer::new(openai, "test-model".to_string()),
        );

        Harness {
            _dir: dir,
            server,
            embedder,
            vectordb,
            pipeline,
        }
    }

    fn request(h: &Harness) -> OutreachRequest {
        OutreachRequest {
            url: format!("{}/careers", h.server.uri()),
            api_key: "gsk_key".to_string(),
            name: "Jane Doe".to_string(),
            company: "Acme AI".to_string(),
            designation: "CTO".to_string(),
            portfolio: Some(PortfolioSource::Builtin),
            recipient: Some("hr@example.com".to_string()),
            subject: None,
        }
    }

    async fn mount_page(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/careers"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><h1>Data Engineer</h1><p>Python</p></body></html>",
                "text/html",
            ))
            .mount(server)
            .await;
    }

    async fn mount_chat(server: &MockServer, marker: &str, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains(marker))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(reply)))
            .mount(server)
            .await;
    }

    async fn stored_ids(vectordb: &VectorDb) -> BTreeSet<String> {
        vectordb
            .scan(PortfolioMatcher::table_name())
            .await
            .unwrap()
            .iter()
            .flat_map(|b| {
                let ids = b
                    .column_by_name("id")
                    .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                    .expect("id column");
                (0..b.num_rows()).map(|i| ids.value(i).to_string()).collect::<Vec<_>>()
            })
            .collect()
    }

    #[tokio::test]
    async fn full_run_produces_email_and_mailto() {
        let h = harness().await;
        mount_page(&h.server).await;
        mount_chat(&h.server, "SCRAPED TEXT FROM WEBSITE", JOB_JSON).await;
        mount_chat(&h.server, "### JOB DESCRIPTION", EMAIL).await;

        let outreach = h.pipeline.run(&request(&h)).await.expect("pipeline succeeds");

        assert_eq!(outreach.job.role, "Data Engineer");
        assert_eq!(outreach.links.links[0].link, "http://a");
        assert!(outreach.links.len() <= 2);
        assert_eq!(outreach.email.text, EMAIL);
        assert_eq!(
            outreach.mailto_link,
            crate::mailto::create_mailto_link(
                "hr@example.com",
                "Acme AI: regarding your Data Engineer opening",
                EMAIL
            )
        );
    }

    #[tokio::test]
    async fn rerun_keeps_ingested_documents() {
        let h = harness().await;
        mount_page(&h.server).await;
        mount_chat(&h.server, "SCRAPED TEXT FROM WEBSITE", JOB_JSON).await;
        mount_chat(&h.server, "### JOB DESCRIPTION", EMAIL).await;

        h.pipeline.run(&request(&h)).await.unwrap();
        let first = stored_ids(&h.vectordb).await;
        h.pipeline.run(&request(&h)).await.unwrap();

        assert_eq!(stored_ids(&h.vectordb).await, first);
        assert_eq!(h.embedder.document_calls(), 1);
    }

    #[tokio::test]
    async fn missing_field_makes_no_network_calls() {
        let h = harness().await;
        mount_page(&h.server).await;
        mount_chat(&h.server, "", EMAIL).await;

        for field in ["url", "api_key", "name", "company", "designation"] {
            let mut req = request(&h);
            match field {
                "url" => req.url.clear(),
                "api_key" => req.api_key.clear(),
                "name" => req.name.clear(),
                "company" => req.company.clear(),
                _ => req.designation.clear(),
            }
            let err = h.pipeline.run(&req).await.unwrap_err();
            assert!(matches!(err, AppError::MissingFields(_)), "{field}: {err:?}");
            assert_eq!(err.user_message(), FILL_ALL_FIELDS);
        }

        let received = h.server.received_requests().await.expect("recording enabled");
        assert!(received.is_empty(), "unexpected requests: {}", received.len());
        assert_eq!(h.embedder.document_calls(), 0);
    }

    #[tokio::test]
    async fn unparseable_extraction_stops_with_fixed_message() {
        let h = harness().await;
        mount_page(&h.server).await;
        mount_chat(&h.server, "SCRAPED TEXT FROM WEBSITE", "I could not find any jobs.").await;

        let err = h.pipeline.run(&request(&h)).await.unwrap_err();
        assert!(matches!(err, AppError::ContextTooBig));
        assert_eq!(err.user_message(), CONTEXT_TOO_BIG);
        assert_eq!(h.embedder.document_calls(), 0);

        let chat_calls = h
            .server
            .received_requests()
            .await
            .expect("recording enabled")
            .iter()
            .filter(|r| r.url.path() == "/chat/completions")
            .count();
        assert_eq!(chat_calls, 1);
    }

    #[tokio::test]
    async fn unreachable_page_is_generic_error() {
        let h = harness().await;
        let mut req = request(&h);
        req.url = format!("{}/missing", h.server.uri());

        let err = h.pipeline.run(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(err.user_message().starts_with("An error occurred: "));
    }

    #[tokio::test]
    async fn without_portfolio_the_email_has_no_links() {
        let h = harness().await;
        mount_page(&h.server).await;
        mount_chat(&h.server, "SCRAPED TEXT FROM WEBSITE", JOB_JSON).await;
        mount_chat(&h.server, "(no portfolio links available)", EMAIL).await;

        let mut req = request(&h);
        req.portfolio = None;
        let outreach = h.pipeline.run(&req).await.unwrap();
        assert!(outreach.links.is_empty());
        assert_eq!(h.embedder.document_calls(), 0);
    }

    #[test]
    fn default_subject_uses_role() {
        let job = JobPosting {
            role: " ML Engineer ".to_string(),
            ..JobPosting::default()
        };
        assert_eq!(default_subject(&job, "Acme"), "Acme: regarding your ML Engineer opening");
        assert_eq!(
            default_subject(&JobPosting::default(), "Acme"),
            "Acme: regarding your opening"
        );
    }
}
