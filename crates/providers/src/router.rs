//! Provider construction from configuration.

use std::sync::Arc;
use minijira_config::AppConfig;
use minijira_core::error::ProviderError;
use minijira_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// Every supported backend speaks the OpenAI chat-completions dialect; the
/// provider name only picks the default endpoint and whether a key is needed.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();

    let base_url = match (&config.base_url, default_base_url(name)) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.to_string(),
        (None, None) => {
            return Err(ProviderError::NotConfigured(format!(
                "unknown provider '{name}': set base_url to use it"
            )));
        }
    };

    let api_key = match (&config.api_key, requires_api_key(name)) {
        (Some(key), _) => key.clone(),
        (None, false) => name.to_string(),
        (None, true) => {
            return Err(ProviderError::NotConfigured(format!(
                "provider '{name}' needs an api_key (or MINIJIRA_API_KEY)"
            )));
        }
    };

    tracing::debug!(provider = name, base_url = %base_url, "Building provider");
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "ollama" => Some("http://localhost:11434/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}

/// Hosted endpoints reject anonymous requests; local servers ignore the key.
fn requires_api_key(provider_name: &str) -> bool {
    matches!(provider_name, "openai" | "openrouter" | "groq")
}
