//! The turn dispatcher.
//!
//! One turn is a fixed walk: `ROUTE → (tool | CLARIFY | UNSUPPORTED) → END`.
//! The classifier runs exactly once, exactly one assistant message is
//! appended, and nothing loops.

use minijira_config::AppConfig;
use minijira_core::error::AgentError;
use minijira_core::intent::{Args, CLARIFY_MESSAGE, FALLBACK_MESSAGE, Intent, RouterDecision};
use minijira_core::message::{Conversation, Message};
use minijira_core::provider::Provider;
use minijira_core::tool::{Tool, ToolRegistry};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span};

use crate::classifier::IntentClassifier;
use crate::compactor::HistoryLimits;

/// Where a decision leads after `ROUTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run the tool registered under this intent.
    Tool(Intent),
    /// Ask the user for missing details.
    Clarify,
    /// Decline.
    Unsupported,
}

/// The transition out of `ROUTE`.
pub fn route(intent: Intent) -> Route {
    match intent {
        Intent::AddUser
        | Intent::CreateTicket
        | Intent::ViewTicket
        | Intent::UpdateStatus
        | Intent::ListTickets
        | Intent::ShowUsers
        | Intent::DeleteUser
        | Intent::DeleteTicket
        | Intent::ResetDatabase => Route::Tool(intent),
        Intent::Clarify => Route::Clarify,
        Intent::Unsupported => Route::Unsupported,
    }
}

/// The result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's reply, also the last message of `history`.
    pub reply: String,
    /// Compacted prior history plus this turn's user and assistant messages.
    pub history: Conversation,
    /// The intent the turn was routed by.
    pub intent: Intent,
}

/// Runs conversation turns against a tool registry.
///
/// Holds no per-conversation state: callers own the history and pass it in
/// on every turn.
pub struct Dispatcher {
    classifier: IntentClassifier,
    tools: Arc<ToolRegistry>,
    limits: HistoryLimits,
}

impl Dispatcher {
    pub fn new(classifier: IntentClassifier, tools: Arc<ToolRegistry>) -> Self {
        Self {
            classifier,
            tools,
            limits: HistoryLimits::default(),
        }
    }

    /// Wire a dispatcher from configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self::new(IntentClassifier::from_config(provider, config), tools).with_limits(
            HistoryLimits::new(config.history.max_window, config.history.max_chars),
        )
    }

    pub fn with_limits(mut self, limits: HistoryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one turn.
    ///
    /// Errors only when the model or the store is unreachable; the caller's
    /// history is then unchanged (it was moved in, so callers that retry
    /// should keep a clone).
    pub async fn run_turn(
        &self,
        history: Conversation,
        user_text: &str,
    ) -> Result<TurnOutcome, AgentError> {
        let span = info_span!("turn", id = %uuid::Uuid::new_v4());
        self.turn(history, user_text).instrument(span).await
    }

    async fn turn(&self, history: Conversation, user_text: &str) -> Result<TurnOutcome, AgentError> {
        let mut history = self.limits.apply(&history);
        debug!(messages = history.len(), "Routing");

        // ROUTE
        let decision = self.classifier.classify(&history, user_text).await?;

        let (reply, success) = match self.resolve(decision.intent) {
            (_, Some(tool)) => {
                let args = extract_args(&decision.args, tool.required_args());
                let result = tool.execute(args).await?;
                (result.output, result.success)
            }
            (Route::Clarify, None) => (pass_through(&decision, CLARIFY_MESSAGE), true),
            (_, None) => (pass_through(&decision, FALLBACK_MESSAGE), true),
        };

        info!(intent = %decision.intent, success, "Turn complete");

        history.push(Message::user(user_text));
        history.push(Message::assistant(reply.clone()));

        Ok(TurnOutcome {
            reply,
            history,
            intent: decision.intent,
        })
    }

    /// The route for `intent` and, for tool routes, the tool itself.
    ///
    /// A tool route with nothing registered degrades to `Unsupported`.
    fn resolve(&self, intent: Intent) -> (Route, Option<&dyn Tool>) {
        match route(intent) {
            Route::Tool(intent) => match self.tools.for_intent(intent) {
                Some(tool) => (Route::Tool(intent), Some(tool)),
                None => {
                    debug!(%intent, "No tool registered");
                    (Route::Unsupported, None)
                }
            },
            other => (other, None),
        }
    }
}

/// Only the declared keys, and only those present and non-null.
fn extract_args(args: &Args, keys: &[&str]) -> Args {
    keys.iter()
        .filter_map(|&key| {
            args.get(key)
                .filter(|v| !v.is_null())
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect()
}

fn pass_through(decision: &RouterDecision, default: &str) -> String {
    decision.reply_text().unwrap_or(default).to_string()
}
