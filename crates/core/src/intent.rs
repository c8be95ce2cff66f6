//! Intents and router decisions.
//!
//! The classifier turns free text into a [`RouterDecision`]: one intent out
//! of a closed set plus a loose argument map. Decoding is strict; anything
//! the decoder rejects becomes a [`DecisionError`] and the caller substitutes
//! [`RouterDecision::fallback`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reply used whenever the model output cannot be trusted.
pub const FALLBACK_MESSAGE: &str = "I can't help with that.";

/// Default reply for the clarify state when the model gave none.
pub const CLARIFY_MESSAGE: &str = "Could you provide the missing details?";

/// The closed set of things a user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AddUser,
    CreateTicket,
    ViewTicket,
    UpdateStatus,
    ListTickets,
    ShowUsers,
    DeleteUser,
    DeleteTicket,
    ResetDatabase,
    Clarify,
    Unsupported,
}

impl Intent {
    /// Every intent, in prompt order.
    pub const ALL: [Intent; 11] = [
        Intent::AddUser,
        Intent::CreateTicket,
        Intent::ViewTicket,
        Intent::UpdateStatus,
        Intent::ListTickets,
        Intent::ShowUsers,
        Intent::DeleteUser,
        Intent::DeleteTicket,
        Intent::ResetDatabase,
        Intent::Clarify,
        Intent::Unsupported,
    ];

    /// Wire name, identical to the name of the tool that serves it.
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::AddUser => "add_user",
            Intent::CreateTicket => "create_ticket",
            Intent::ViewTicket => "view_ticket",
            Intent::UpdateStatus => "update_status",
            Intent::ListTickets => "list_tickets",
            Intent::ShowUsers => "show_users",
            Intent::DeleteUser => "delete_user",
            Intent::DeleteTicket => "delete_ticket",
            Intent::ResetDatabase => "reset_database",
            Intent::Clarify => "clarify",
            Intent::Unsupported => "unsupported",
        }
    }

    /// Whether this intent is served by a domain tool (as opposed to a
    /// pass-through reply).
    pub fn is_tool(self) -> bool {
        !matches!(self, Intent::Clarify | Intent::Unsupported)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| DecisionError::UnknownIntent(s.to_string()))
    }
}

/// Arguments extracted by the classifier, keyed by field name.
pub type Args = serde_json::Map<String, serde_json::Value>;

/// The classifier's verdict for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterDecision {
    pub intent: Intent,

    #[serde(default, deserialize_with = "args_or_null")]
    pub args: Args,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn args_or_null<'de, D>(deserializer: D) -> Result<Args, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Args>::deserialize(deserializer)?.unwrap_or_default())
}

impl RouterDecision {
    pub fn new(intent: Intent, args: Args) -> Self {
        Self {
            intent,
            args,
            message: None,
        }
    }

    /// The safe default used whenever model output cannot be trusted.
    pub fn fallback() -> Self {
        let mut args = Args::new();
        args.insert("message".into(), FALLBACK_MESSAGE.into());
        Self {
            intent: Intent::Unsupported,
            args,
            message: Some(FALLBACK_MESSAGE.to_string()),
        }
    }

    /// Strictly decode a raw model reply.
    ///
    /// The reply must be exactly one JSON object with a known `intent`.
    /// Surrounding whitespace is ignored; nothing else is.
    pub fn decode(raw: &str) -> Result<Self, DecisionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DecisionError::Empty);
        }
        let value: serde_json::Value =
            serde_json::from_str(trimmed).map_err(|e| DecisionError::Syntax(e.to_string()))?;
        // serde accepts arrays for structs; a decision must be an object.
        if !value.is_object() {
            return Err(DecisionError::Schema("expected a JSON object".into()));
        }
        serde_json::from_value(value).map_err(|e| DecisionError::Schema(e.to_string()))
    }

    /// The reply text for a pass-through state: `message`, then a string
    /// `args.message`, then nothing.
    pub fn reply_text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or_else(|| self.args.get("message").and_then(|v| v.as_str()))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Why a model reply could not be decoded into a [`RouterDecision`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("model reply was empty")]
    Empty,

    #[error("model reply is not a JSON document: {0}")]
    Syntax(String),

    #[error("model reply has the wrong shape: {0}")]
    Schema(String),

    #[error("unknown intent: {0}")]
    UnknownIntent(String),

    #[error("model did not answer within {0}s")]
    TimedOut(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_reply() {
        let d = RouterDecision::decode(
            r#"{"intent":"add_user","args":{"user_id":1,"name":"Alice"}}"#,
        )
        .unwrap();
        assert_eq!(d.intent, Intent::AddUser);
        assert_eq!(d.args["user_id"], 1);
        assert_eq!(d.args["name"], "Alice");
        assert!(d.message.is_none());
    }

    #[test]
    fn decodes_clarify_without_args() {
        let d = RouterDecision::decode(
            r#"  {"intent":"clarify","message":"Which user id?"}  "#,
        )
        .unwrap();
        assert_eq!(d.intent, Intent::Clarify);
        assert!(d.args.is_empty());
        assert_eq!(d.reply_text(), Some("Which user id?"));
    }

    #[test]
    fn null_args_are_empty() {
        let d = RouterDecision::decode(r#"{"intent":"reset_database","args":null}"#).unwrap();
        assert!(d.args.is_empty());
    }

    #[test]
    fn prose_is_a_syntax_error() {
        let err = RouterDecision::decode("Sure! Here is the JSON you asked for").unwrap_err();
        assert!(matches!(err, DecisionError::Syntax(_)));
    }

    #[test]
    fn truncated_output_is_a_syntax_error() {
        let err = RouterDecision::decode(r#"{"intent":"add_user","args":{"user_id":"#).unwrap_err();
        assert!(matches!(err, DecisionError::Syntax(_)));
    }

    #[test]
    fn unknown_intent_is_a_schema_error() {
        let err = RouterDecision::decode(r#"{"intent":"launch_rocket","args":{}}"#).unwrap_err();
        assert!(matches!(err, DecisionError::Schema(_)));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        for raw in [r#"["add_user"]"#, r#"{"args":{}}"#, r#"{"intent":"add_user","args":[1]}"#, "42"] {
            assert!(RouterDecision::decode(raw).is_err(), "accepted {raw}");
        }
        assert_eq!(RouterDecision::decode("   "), Err(DecisionError::Empty));
    }

    #[test]
    fn fenced_json_is_not_accepted() {
        let raw = "```json\n{\"intent\":\"show_users\",\"args\":{}}\n```";
        assert!(RouterDecision::decode(raw).is_err());
    }

    #[test]
    fn fallback_is_unsupported_with_message() {
        let d = RouterDecision::fallback();
        assert_eq!(d.intent, Intent::Unsupported);
        assert_eq!(d.args["message"], FALLBACK_MESSAGE);
        assert_eq!(d.reply_text(), Some(FALLBACK_MESSAGE));
    }

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
            let json = serde_json::to_value(intent).unwrap();
            assert_eq!(json, intent.as_str());
        }
        assert!("ADD_USER".parse::<Intent>().is_err());
    }

    #[test]
    fn only_pass_through_states_are_not_tools() {
        let non_tools: Vec<_> = Intent::ALL.into_iter().filter(|i| !i.is_tool()).collect();
        assert_eq!(non_tools, vec![Intent::Clarify, Intent::Unsupported]);
    }
}
