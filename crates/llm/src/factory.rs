//! LLM provider factory.
//!
//! This module creates LLM clients from a provider name, an optional
//! endpoint override and an optional API key.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatClient};
use crate::types::ProviderType;
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "openai", "ollama")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key, required by the hosted providers
///
/// # Errors
/// Returns error if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    match provider_type {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_base_url(base_url))),
        ProviderType::Groq | ProviderType::OpenAI => {
            let key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                format!(
                    "{} provider requires API key",
                    display_name(provider_type)
                )
            })?;
            Ok(Arc::new(OpenAiCompatClient::new(
                provider_type.as_str(),
                base_url,
                key,
            )))
        }
    }
}

fn display_name(provider: ProviderType) -> &'static str {
    match provider {
        ProviderType::Groq => "Groq",
        ProviderType::OpenAI => "OpenAI",
        ProviderType::Ollama => "Ollama",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_groq_client() {
        let client = create_client("groq", None, Some("gsk-test")).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", None, None) {
            Err(err) => assert!(err.contains("Groq provider requires API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
        assert!(create_client("groq", None, Some("")).is_err());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None) {
            Err(err) => assert!(err.contains("OpenAI provider requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
