//! Page fetching and visible-text extraction.
//!
//! Fetches a URL with a browser-like user agent and returns the rendered
//! text of the document body. Pages rendered entirely by client-side
//! scripts are out of reach for an HTTP fetch; the trade-off is recorded
//! in DESIGN.md.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::types::RagError;

/// Fixed user agent presented to scraped sites. Some hosts reject
/// anonymous clients outright.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Raw result of one page fetch.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: Url,
    pub text: String,
    pub bytes: usize,
}

/// Fetches pages and extracts the visible body text.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Builds a fetcher with the given fetch deadline and ensures the
    /// scratch directory exists. Nothing is written into the directory by
    /// the fetcher itself.
    pub fn new(timeout: Duration, scratch_dir: &Path) -> Result<Self, RagError> {
        std::fs::create_dir_all(scratch_dir)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|err| RagError::Config(format!("http client: {err}")))?;
        Ok(Self { client })
    }

    /// Loads `url` and returns the visible text of its body.
    ///
    /// Fails with [`RagError::Navigation`] when the page cannot be loaded
    /// and [`RagError::Timeout`] when the deadline passes or the document
    /// has no body. No retries.
    pub async fn fetch(&self, url: &Url) -> Result<ScrapedPage, RagError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| classify(url, err))?
            .error_for_status()
            .map_err(|err| classify(url, err))?;

        let html = response.text().await.map_err(|err| classify(url, err))?;
        let bytes = html.len();
        let text = visible_body_text(&html)?;

        Ok(ScrapedPage {
            url: url.clone(),
            text,
            bytes,
        })
    }
}

fn classify(url: &Url, err: reqwest::Error) -> RagError {
    if err.is_timeout() {
        RagError::Timeout(format!("{url} did not respond in time"))
    } else {
        RagError::Navigation {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Extracts the rendered text of the document body, skipping script,
/// style, and noscript content.
fn visible_body_text(html: &str) -> Result<String, RagError> {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body")
        .map_err(|err| RagError::Timeout(format!("body selector: {err}")))?;
    let body = document
        .select(&body_selector)
        .next()
        .ok_or_else(|| RagError::Timeout("no body element in the fetched document".into()))?;

    // scraper exposes no node removal, so invisible subtrees are blanked
    // out of the serialized body before the text pass.
    let mut body_html = body.html();
    for tag in ["script", "style", "noscript"] {
        let selector = Selector::parse(tag)
            .map_err(|err| RagError::Timeout(format!("{tag} selector: {err}")))?;
        for element in document.select(&selector) {
            body_html = body_html.replace(&element.html(), "");
        }
    }

    let cleaned = Html::parse_fragment(&body_html);
    let text = cleaned
        .root_element()
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(text)
}
