//! Doctrinal extraction boundary: prompt rendering, the provider seam, and response parsing.

mod openai;
mod prompt;
mod schema;

pub use openai::OpenAiExtractor;
pub use prompt::{render_page_blocks, truncate_content, ExtractionPrompt, MAX_PAGE_CHARS};
pub use schema::{response_schema, SCHEMA_NAME};

use std::future::Future;

use thiserror::Error;

use super::dedup::CrawlPage;
use super::domain::ChurchEvaluationRaw;
use super::http::ApiFailure;

/// Turns deduplicated page text into a structured doctrinal profile.
pub trait DoctrinalExtractor: Send + Sync {
    fn extract(
        &self,
        pages: &[CrawlPage],
    ) -> impl Future<Output = Result<ChurchEvaluationRaw, ExtractionError>> + Send;
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{variable} is not configured")]
    MissingCredential { variable: &'static str },
    #[error("extraction request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("extraction provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("extraction model returned an empty response")]
    EmptyResponse,
    #[error("extraction output does not match the evaluation schema: {0}")]
    InvalidPayload(String),
}

impl From<ApiFailure> for ExtractionError {
    fn from(failure: ApiFailure) -> Self {
        ExtractionError::Api {
            status: failure.status,
            message: failure.message,
        }
    }
}

/// Parse the model's message text into the raw evaluation record.
pub fn parse_evaluation(text: &str) -> Result<ChurchEvaluationRaw, ExtractionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }
    serde_json::from_str(trimmed).map_err(|err| ExtractionError::InvalidPayload(err.to_string()))
}
