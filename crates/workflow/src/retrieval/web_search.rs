//! Web search for the `web_search` source.
//!
//! Providers are pluggable behind [`SearchProvider`]. Tavily is preferred,
//! SerpAPI is the fallback, and without either key a placeholder text is
//! returned so the workflow still completes.

use agentic_core::SearchSettings;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const TAVILY_URL: &str = "https://api.tavily.com/search";
const SERPAPI_URL: &str = "https://serpapi.com/search.json";

/// A search result entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Trait for pluggable search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for display
    fn name(&self) -> &str;

    /// Execute a search query
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, String>;
}

/// Tavily search provider.
pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, String> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "include_answer": false,
        });

        let response = self
            .client
            .post(TAVILY_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Tavily request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(format!("Tavily API error ({}): {}", status.as_u16(), err_body));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Tavily response: {}", e))?;

        Ok(parse_tavily(&data))
    }
}

/// SerpAPI (Google engine) search provider.
pub struct SerpApiProvider {
    client: reqwest::Client,
    api_key: String,
}

impl SerpApiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &str {
        "SerpAPI"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, String> {
        let response = self
            .client
            .get(SERPAPI_URL)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| format!("SerpAPI request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(format!("SerpAPI error ({}): {}", status.as_u16(), err_body));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse SerpAPI response: {}", e))?;

        if let Some(error) = data.get("error").and_then(|e| e.as_str()) {
            return Err(format!("SerpAPI error: {}", error));
        }

        let mut results = parse_serpapi(&data);
        results.truncate(max_results);
        Ok(results)
    }
}

fn str_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Map a Tavily response body: `results[].{title, content, url}`.
pub fn parse_tavily(data: &Value) -> Vec<SearchResult> {
    data.get("results")
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .map(|item| SearchResult {
                    title: str_field(item, "title"),
                    url: str_field(item, "url"),
                    content: str_field(item, "content"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Map a SerpAPI response body: `organic_results[].{title, snippet, link}`.
pub fn parse_serpapi(data: &Value) -> Vec<SearchResult> {
    data.get("organic_results")
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .map(|item| SearchResult {
                    title: str_field(item, "title"),
                    url: str_field(item, "link"),
                    content: str_field(item, "snippet"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Render results as retrieval context.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No web search results found.".to_string();
    }

    let mut lines = vec!["Web Search Results:\n".to_string()];
    for (i, result) in results.iter().enumerate() {
        let title = if result.title.is_empty() {
            "No title"
        } else {
            result.title.as_str()
        };
        let content = if result.content.is_empty() {
            "No content"
        } else {
            result.content.as_str()
        };

        lines.push(format!("[Result {}]", i + 1));
        lines.push(format!("Title: {}", title));
        lines.push(format!("Content: {}", content));
        if !result.url.is_empty() {
            lines.push(format!("URL: {}", result.url));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn mock_results(query: &str) -> String {
    format!(
        "[Mock Web Search Results for: {}]\n\n\
         Note: No web search provider configured. \
         Set TAVILY_API_KEY or SERPAPI_API_KEY in .env to enable real web search.\n\n\
         This is a placeholder for web search results.",
        query
    )
}

/// Runs web searches through the configured provider.
#[derive(Clone)]
pub struct WebSearchManager {
    provider: Option<Arc<dyn SearchProvider>>,
    max_results: usize,
}

impl WebSearchManager {
    /// Pick a provider from the configured keys.
    pub fn new(settings: &SearchSettings) -> Self {
        let key = |k: &Option<String>| {
            k.as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        };

        let provider: Option<Arc<dyn SearchProvider>> =
            if let Some(api_key) = key(&settings.tavily_api_key) {
                tracing::info!("Using Tavily for web search");
                Some(Arc::new(TavilyProvider::new(api_key)))
            } else if let Some(api_key) = key(&settings.serpapi_api_key) {
                tracing::info!("Using SerpAPI for web search");
                Some(Arc::new(SerpApiProvider::new(api_key)))
            } else {
                tracing::warn!("No web search provider configured");
                None
            };

        Self {
            provider,
            max_results: settings.max_results,
        }
    }

    pub fn with_provider(provider: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        Self {
            provider: Some(provider),
            max_results,
        }
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// Search and format. Provider failures come back as text.
    pub async fn search(&self, query: &str) -> String {
        tracing::info!("Performing web search: {}", query);

        let Some(provider) = &self.provider else {
            tracing::info!("Using mock web search");
            return mock_results(query);
        };

        match provider.search(query, self.max_results).await {
            Ok(results) => format_results(&results),
            Err(e) => {
                tracing::error!("{} search failed: {}", provider.name(), e);
                format!("Web search error: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedProvider(Result<Vec<SearchResult>, String>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(
            &self,
            _query: &str,
            max_results: usize,
        ) -> Result<Vec<SearchResult>, String> {
            self.0.clone().map(|mut r| {
                r.truncate(max_results);
                r
            })
        }
    }

    fn result(title: &str, content: &str, url: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_parse_tavily() {
        let data = json!({
            "results": [
                {"title": "Rust", "content": "A language", "url": "https://rust-lang.org", "score": 0.9},
                {"content": "untitled"}
            ]
        });
        assert_eq!(
            parse_tavily(&data),
            vec![
                result("Rust", "A language", "https://rust-lang.org"),
                result("", "untitled", ""),
            ]
        );
        assert!(parse_tavily(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_serpapi() {
        let data = json!({
            "organic_results": [
                {"title": "Tokio", "snippet": "Async runtime", "link": "https://tokio.rs"}
            ]
        });
        assert_eq!(
            parse_serpapi(&data),
            vec![result("Tokio", "Async runtime", "https://tokio.rs")]
        );
    }

    #[test]
    fn test_format_results() {
        let formatted = format_results(&[
            result("Rust", "A language", "https://rust-lang.org"),
            result("", "", ""),
        ]);
        assert_eq!(
            formatted,
            "Web Search Results:\n\n\
             [Result 1]\nTitle: Rust\nContent: A language\nURL: https://rust-lang.org\n\n\
             [Result 2]\nTitle: No title\nContent: No content\n"
        );
        assert_eq!(format_results(&[]), "No web search results found.");
    }

    #[tokio::test]
    async fn test_mock_without_keys() {
        let manager = WebSearchManager::new(&SearchSettings {
            tavily_api_key: Some("  ".to_string()),
            serpapi_api_key: None,
            max_results: 5,
        });
        assert!(manager.provider_name().is_none());

        let output = manager.search("rust news").await;
        assert!(output.starts_with("[Mock Web Search Results for: rust news]"));
        assert!(output.contains("Set TAVILY_API_KEY or SERPAPI_API_KEY"));
    }

    #[test]
    fn test_provider_preference() {
        let both = WebSearchManager::new(&SearchSettings {
            tavily_api_key: Some("t".to_string()),
            serpapi_api_key: Some("s".to_string()),
            max_results: 5,
        });
        assert_eq!(both.provider_name(), Some("Tavily"));

        let serp = WebSearchManager::new(&SearchSettings {
            tavily_api_key: None,
            serpapi_api_key: Some("s".to_string()),
            max_results: 5,
        });
        assert_eq!(serp.provider_name(), Some("SerpAPI"));
    }

    #[tokio::test]
    async fn test_search_formats_and_reports_errors() {
        let ok = WebSearchManager::with_provider(
            Arc::new(FixedProvider(Ok(vec![
                result("a", "first", ""),
                result("b", "second", ""),
            ]))),
            1,
        );
        let output = ok.search("q").await;
        assert!(output.contains("[Result 1]"));
        assert!(!output.contains("[Result 2]"));

        let failing =
            WebSearchManager::with_provider(Arc::new(FixedProvider(Err("timeout".to_string()))), 5);
        assert_eq!(failing.search("q").await, "Web search error: timeout");
    }
}
