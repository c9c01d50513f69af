/// Careers page loader.
///
/// Downloads a page and reduces it to the text a reader would see: the `<title>` and every
/// text node under `<body>` outside of scripts, styles and other non-rendered elements.
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::info;

use crate::error::AppError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe", "head"];

pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch `url` and return its visible text. The URL is passed through unvalidated.
    pub async fn fetch(&self, url: &str) -> Result<String, AppError> {
        info!(url, "fetching page");
        let fetch_err = |message: String| AppError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP status {status}")));
        }

        let html = response.text().await.map_err(|e| fetch_err(e.to_string()))?;
        let text = visible_text(&html);
        info!(url, chars = text.chars().count(), "page text extracted");
        Ok(text)
    }
}

/// Reduce an HTML document to its rendered text, one text node per line.
pub fn visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();

    if let Some(title) = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
    {
        let title = collapse_whitespace(&title.text().collect::<String>());
        if !title.is_empty() {
            lines.push(title);
        }
    }

    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element());

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| HIDDEN_ELEMENTS.contains(&el.value().name()));
        if hidden {
            continue;
        }
        let line = collapse_whitespace(text);
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
