//! Encyclopedia corpus: the search/fetch collaborator the scraper drives.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::Settings;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const MAX_DISAMBIGUATION_LINKS: &str = "50";

/// A fetched article.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePage {
    pub title: String,
    pub full_text: String,
    pub url: String,
    /// Lead section, before the first heading.
    pub excerpt: String,
}

impl CandidatePage {
    pub fn new(title: String, full_text: String, url: String) -> Self {
        let excerpt = lead_section(&full_text);
        CandidatePage { title, full_text, url, excerpt }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Found(CandidatePage),
    /// The title names several topics; holds the alternative titles.
    Ambiguous(Vec<String>),
    NotFound,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("corpus answered HTTP {0}")]
    Status(u16),
    #[error("malformed corpus response: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub trait Corpus: Send + Sync {
    /// Ranked page titles for `query`, at most `limit`. May be empty.
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>, CorpusError>> + Send;

    fn fetch_page(&self, title: &str) -> impl Future<Output = Result<PageOutcome, CorpusError>> + Send;
}

fn lead_section(text: &str) -> String {
    let end = text.find("\n==").unwrap_or(text.len());
    text[..end].trim().to_string()
}

// ── MediaWiki API ──

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct PagesResponse {
    query: Option<PagesQuery>,
}

#[derive(Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Deserialize)]
struct ApiPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    fullurl: Option<String>,
    pageprops: Option<PageProps>,
    #[serde(default)]
    links: Vec<ApiLink>,
}

#[derive(Deserialize)]
struct PageProps {
    disambiguation: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ApiLink {
    title: String,
}

/// MediaWiki `api.php` client. Cheap to share; the inner client pools connections.
#[derive(Clone)]
pub struct WikiClient {
    http: reqwest::Client,
    api_url: String,
    variant: String,
}

impl WikiClient {
    pub fn new(settings: &Settings) -> Result<Self, CorpusError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(WikiClient {
            http,
            api_url: settings.api_url.clone(),
            variant: settings.variant.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, CorpusError> {
        let mut attempt = 0;
        loop {
            let response = self
                .http
                .get(&self.api_url)
                .query(&[
                    ("format", "json"),
                    ("formatversion", "2"),
                    ("variant", self.variant.as_str()),
                ])
                .query(params)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let body = response.text().await?;
                return Ok(serde_json::from_str(&body)?);
            }

            let retryable = status.as_u16() == 429 || status.is_server_error();
            if !retryable || attempt == MAX_RETRIES {
                return Err(CorpusError::Status(status.as_u16()));
            }

            let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
            warn!(
                "Corpus answered {} (attempt {}/{}), backing off {:.1}s",
                status,
                attempt + 1,
                MAX_RETRIES,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    async fn disambiguation_options(&self, title: &str) -> Result<Vec<String>, CorpusError> {
        let resp: PagesResponse = self
            .get_json(&[
                ("action", "query"),
                ("prop", "links"),
                ("titles", title),
                ("redirects", "1"),
                ("plnamespace", "0"),
                ("pllimit", MAX_DISAMBIGUATION_LINKS),
            ])
            .await?;
        Ok(resp
            .query
            .into_iter()
            .flat_map(|q| q.pages)
            .flat_map(|p| p.links)
            .map(|l| l.title)
            .collect())
    }
}

impl Corpus for WikiClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, CorpusError> {
        let limit = limit.to_string();
        let resp: SearchResponse = self
            .get_json(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("srprop", ""),
            ])
            .await?;
        let titles: Vec<String> = resp
            .query
            .map(|q| q.search.into_iter().map(|h| h.title).collect())
            .unwrap_or_default();
        debug!(query, hits = titles.len(), "search");
        Ok(titles)
    }

    async fn fetch_page(&self, title: &str) -> Result<PageOutcome, CorpusError> {
        let resp: PagesResponse = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts|info|pageprops"),
                ("titles", title),
                ("redirects", "1"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("ppprop", "disambiguation"),
            ])
            .await?;

        let Some(page) = resp.query.and_then(|q| q.pages.into_iter().next()) else {
            return Ok(PageOutcome::NotFound);
        };
        if page.missing || page.invalid {
            return Ok(PageOutcome::NotFound);
        }
        if page.pageprops.is_some_and(|p| p.disambiguation.is_some()) {
            let options = self.disambiguation_options(&page.title).await?;
            return Ok(PageOutcome::Ambiguous(options));
        }

        let url = page.fullurl.unwrap_or_default();
        let text = page.extract.unwrap_or_default();
        Ok(PageOutcome::Found(CandidatePage::new(page.title, text, url)))
    }
}
