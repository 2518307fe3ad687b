use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::GatewayError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MODEL: &str = "gpt-4o-mini";

/// Structured reading of a free-text search query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhancedQuery {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_intent: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(&self, query: &str) -> Result<EnhancedQuery, GatewayError>;

    /// Suggest completions for a partial query, given the titles of
    /// listings already matching it.
    async fn suggest(
        &self,
        query: &str,
        context_titles: &[String],
    ) -> Result<Vec<String>, GatewayError>;
}

pub struct HttpTextEnhancer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTextEnhancer {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn key(&self) -> Result<&str, GatewayError> {
        self.api_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured("search enhancement"))
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, GatewayError> {
        let key = self.key()?;
        let body = serde_json::json!({
            "model": MODEL,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": 0.2,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Service(format!("HTTP {status}: {message}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Parse("empty completion".to_string()))
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl TextEnhancer for HttpTextEnhancer {
    async fn enhance(&self, query: &str) -> Result<EnhancedQuery, GatewayError> {
        let system = "You turn marketplace search queries into JSON with keys \
                      keywords (array of strings), category (string or null), \
                      price_intent (one of budget, mid-range, premium, or null) \
                      and attributes (array of strings). Reply with JSON only.";
        let content = self.complete(system, query).await?;
        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    async fn suggest(
        &self,
        query: &str,
        context_titles: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        let system = "You complete marketplace search queries. Given a partial \
                      query and product titles from the catalog, reply with a \
                      JSON array of up to 8 short suggestion strings. Reply \
                      with JSON only.";
        let user = format!("query: {query}\ncatalog titles: {}", context_titles.join("; "));
        let content = self.complete(system, &user).await?;
        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

/// Models frequently wrap JSON replies in a markdown fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
    }

    #[test]
    fn enhanced_query_tolerates_missing_fields() {
        let parsed: EnhancedQuery = serde_json::from_str("{\"keywords\":[\"mug\"]}").unwrap();
        assert_eq!(parsed.keywords, vec!["mug"]);
        assert!(parsed.category.is_none());
        assert!(parsed.price_intent.is_none());
        assert!(parsed.attributes.is_empty());
    }
}
