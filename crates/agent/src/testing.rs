//! Scripted providers for tests.

use minijira_core::error::ProviderError;
use minijira_core::message::Message;
use minijira_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reaction to a `complete` call.
#[derive(Debug, Clone)]
pub enum Step {
    /// Reply with this raw text.
    Reply(String),
    /// Fail with this error.
    Fail(ProviderError),
    /// Wait this long, then reply with the text.
    Delay(Duration, String),
}

/// A provider that replays a queue of scripted steps and records requests.
///
/// Panics if called more often than scripted.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with each text in turn.
    pub fn replies<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Step::Reply(t.into())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn text_response(text: String) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "scripted".into(),
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text_response(text)),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Delay(wait, text)) => {
                tokio::time::sleep(wait).await;
                Ok(text_response(text))
            }
            None => panic!("ScriptedProvider: no more steps scripted"),
        }
    }
}
