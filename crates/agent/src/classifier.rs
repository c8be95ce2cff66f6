//! Intent classification.
//!
//! One model round trip per turn. Output that cannot be decoded, and a model
//! that does not answer in time, both degrade to the fallback decision.
//! Transport failures are returned to the caller.

use minijira_config::AppConfig;
use minijira_core::error::ProviderError;
use minijira_core::intent::{DecisionError, RouterDecision};
use minijira_core::message::Conversation;
use minijira_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::prompt::router_messages;

/// Turns free text plus context into a [`RouterDecision`].
pub struct IntentClassifier {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Build a classifier from the model settings in `config`.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, &config.model)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_timeout(Duration::from_secs(config.classifier_timeout_secs))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Bound on the model round trip; expiry yields the fallback decision.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn request(&self, history: &Conversation, user_text: &str) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: router_messages(history, user_text),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode: true,
        }
    }

    /// Classify `user_text` in the context of `history`.
    ///
    /// Never fails on bad model output; fails only when the model cannot
    /// be reached or rejects the request.
    pub async fn classify(
        &self,
        history: &Conversation,
        user_text: &str,
    ) -> Result<RouterDecision, ProviderError> {
        let request = self.request(history, user_text);

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(ProviderError::Timeout(reason))) => {
                warn!(provider = self.provider.name(), %reason, "Model request timed out, using fallback");
                return Ok(RouterDecision::fallback());
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                let err = DecisionError::TimedOut(self.timeout.as_secs());
                warn!(provider = self.provider.name(), error = %err, "Classifier timed out, using fallback");
                return Ok(RouterDecision::fallback());
            }
        };

        let raw = response.message.content;
        debug!(model = %response.model, reply = %raw, "Router reply");

        match RouterDecision::decode(&raw) {
            Ok(decision) => {
                debug!(intent = %decision.intent, "Classified");
                Ok(decision)
            }
            Err(e) => {
                warn!(error = %e, "Unusable router reply, using fallback");
                Ok(RouterDecision::fallback())
            }
        }
    }
}
