use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::super::dedup::CrawlPage;
use super::super::domain::ChurchEvaluationRaw;
use super::super::http::check_response;
use super::{parse_evaluation, response_schema, DoctrinalExtractor, ExtractionError, ExtractionPrompt};

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extractor backed by an OpenAI-compatible chat completions endpoint with structured output.
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn request_body(&self, prompt: &ExtractionPrompt) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": response_schema(),
            },
        })
    }
}

impl DoctrinalExtractor for OpenAiExtractor {
    async fn extract(&self, pages: &[CrawlPage]) -> Result<ChurchEvaluationRaw, ExtractionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ExtractionError::MissingCredential {
                variable: "OPENAI_API_KEY",
            })?;

        let prompt = ExtractionPrompt::for_pages(pages);
        info!(model = %self.model, pages = pages.len(), "requesting doctrinal extraction");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.request_body(&prompt))
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|err| ExtractionError::InvalidPayload(err.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ExtractionError::EmptyResponse)?;

        let raw = parse_evaluation(&content)?;
        info!(model = %self.model, "doctrinal extraction finished");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_structured_output() {
        let extractor = OpenAiExtractor::new(
            reqwest::Client::new(),
            Some("sk-test".to_string()),
            "https://api.openai.com/v1/",
            "gpt-5-mini",
        );
        let prompt = ExtractionPrompt::for_pages(&[CrawlPage::new("https://a.example/", "A")]);
        let body = extractor.request_body(&prompt);

        assert_eq!(extractor.base_url, "https://api.openai.com/v1");
        assert_eq!(body["model"], "gpt-5-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["response_format"]["json_schema"]["name"],
            "church_evaluation_schema"
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_reported_before_any_request() {
        let extractor =
            OpenAiExtractor::new(reqwest::Client::new(), None, "http://127.0.0.1:9", "gpt-5-mini");
        let err = extractor
            .extract(&[CrawlPage::new("https://a.example/", "A")])
            .await
            .expect_err("credential required");
        assert!(matches!(
            err,
            ExtractionError::MissingCredential {
                variable: "OPENAI_API_KEY"
            }
        ));
    }
}
