use std::future::Future;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use super::dedup::{CrawlPage, CrawlResult};
use super::http::{check_response, ApiFailure};

const CRAWL_INSTRUCTIONS: &str = "I need the following:\n1. doctrinal statement, their beliefs, doctrine, teaching statement, or statement of faith.\n2. The address of the church/main campus.\n3. Their pastors and elders.";

/// Fetches the public pages of a church website.
pub trait CrawlProvider: Send + Sync {
    fn crawl(
        &self,
        website: &str,
    ) -> impl Future<Output = Result<CrawlResult, CrawlError>> + Send;
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("{variable} is not configured")]
    MissingCredential { variable: &'static str },
    #[error("crawl request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("crawl provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unable to parse crawl response: {0}")]
    Parse(String),
}

impl From<ApiFailure> for CrawlError {
    fn from(failure: ApiFailure) -> Self {
        CrawlError::Api {
            status: failure.status,
            message: failure.message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    results: Vec<TavilyPage>,
}

#[derive(Debug, Default, Deserialize)]
struct TavilyPage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, alias = "rawContent")]
    raw_content: Option<String>,
    #[serde(default)]
    favicon: Option<String>,
}

/// Crawl client for the Tavily crawl and extract endpoints.
#[derive(Debug, Clone)]
pub struct TavilyCrawler {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TavilyCrawler {
    pub fn new(client: reqwest::Client, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_key(&self) -> Result<&str, CrawlError> {
        self.api_key
            .as_deref()
            .ok_or(CrawlError::MissingCredential {
                variable: "TAVILY_API_KEY",
            })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<TavilyResponse, CrawlError> {
        let api_key = self.api_key()?;
        let resp = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|err| CrawlError::Parse(err.to_string()))
    }
}

impl CrawlProvider for TavilyCrawler {
    async fn crawl(&self, website: &str) -> Result<CrawlResult, CrawlError> {
        self.api_key()?;

        let crawled = self
            .post(
                "crawl",
                json!({
                    "url": website,
                    "instructions": CRAWL_INSTRUCTIONS,
                    "max_depth": 2,
                    "extract_depth": "advanced",
                    "allow_external": false,
                    "format": "markdown",
                }),
            )
            .await?;
        info!(website, pages = crawled.results.len(), "crawl finished");

        if !crawled.results.is_empty() {
            return Ok(crawl_result(crawled, website));
        }

        debug!(website, "crawl returned no pages; falling back to extract");
        let extracted = self
            .post(
                "extract",
                json!({
                    "urls": [website],
                    "extract_depth": "advanced",
                    "format": "markdown",
                }),
            )
            .await?;
        Ok(extract_result(extracted, website))
    }
}

fn crawl_result(response: TavilyResponse, website: &str) -> CrawlResult {
    CrawlResult {
        base_url: response.base_url.unwrap_or_else(|| website.to_string()),
        pages: response
            .results
            .into_iter()
            .map(|page| CrawlPage {
                url: page.url.unwrap_or_default(),
                raw_content: page.raw_content.unwrap_or_default(),
                favicon: page.favicon,
            })
            .collect(),
    }
}

fn extract_result(response: TavilyResponse, website: &str) -> CrawlResult {
    CrawlResult {
        base_url: website.to_string(),
        pages: response
            .results
            .into_iter()
            .map(|page| CrawlPage {
                url: page
                    .url
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| website.to_string()),
                raw_content: page.raw_content.unwrap_or_default(),
                favicon: None,
            })
            .collect(),
    }
}
