//! The router prompt.

use minijira_core::message::{Conversation, Message};

/// System instruction for the intent router.
pub const ROUTER_SYSTEM_PROMPT: &str = r#"You are a STRICT intent router for a Mini-Jira Admin Agent.
ALWAYS output ONLY a single JSON object, no prose, no code fences.

Keys:
- "intent": one of ["add_user","create_ticket","view_ticket","update_status","list_tickets","show_users","delete_user","delete_ticket","reset_database","clarify","unsupported"]
- "args": an object with exactly the fields required for the chosen intent (see below)
- "message": only for "clarify" and "unsupported", the reply shown to the user

INTENT → REQUIRED ARGS
- add_user       → {"user_id": <integer>, "name": <string>}
- create_ticket  → {"title": <string>, "assignee_name": <string>}
- view_ticket    → {"user_id": <integer>}
- update_status  → {"user_id": <integer>, "status": <"OPEN"|"IN_PROGRESS"|"CLOSED">}
- list_tickets   → {"kind": <"all"|"OPEN"|"IN_PROGRESS"|"CLOSED">}
- show_users     → {}
- delete_user    → {"user_id": <integer>}
- delete_ticket  → {"user_id": <integer>}
- reset_database → {}

RULES
- user_id MUST be an integer (e.g., "1" → 1).
- status: accept variants ("in-progress", "in progress", "done"→"CLOSED") but output OPEN, IN_PROGRESS or CLOSED.
- kind: if the user just says "list tickets", use {"kind": "all"}.
- show_users: "show users", "list users", "who is in the system" and similar all map to show_users.
- reset_database: "reset database", "clear all data", "wipe everything" and similar all map to reset_database.
- If you cannot confidently extract ALL required args, use
  {"intent":"clarify","message":"<ask for the missing pieces here>"}
- If the request has nothing to do with users or tickets, use "unsupported".

EXAMPLES (follow the output format exactly)
User: add user 1 Alice
{"intent":"add_user","args":{"user_id":1,"name":"Alice"}}

User: create ticket "Login bug" for Alice
{"intent":"create_ticket","args":{"title":"Login bug","assignee_name":"Alice"}}

User: view ticket for user 7
{"intent":"view_ticket","args":{"user_id":7}}

User: set status in-progress for user 7
{"intent":"update_status","args":{"user_id":7,"status":"IN_PROGRESS"}}

User: list tickets
{"intent":"list_tickets","args":{"kind":"all"}}

User: list open tickets
{"intent":"list_tickets","args":{"kind":"OPEN"}}

User: who are the users?
{"intent":"show_users","args":{}}

User: delete user 5
{"intent":"delete_user","args":{"user_id":5}}

User: delete ticket for user 12
{"intent":"delete_ticket","args":{"user_id":12}}

User: reset database
{"intent":"reset_database","args":{}}

User: add user Alice
{"intent":"clarify","message":"Please provide both user_id (integer) and name, e.g., 'add user 1 Alice'."}

User: what's the weather like?
{"intent":"unsupported","message":"Please provide a valid request, e.g., 'add user 1 Alice', 'create ticket Login bug for Alice', etc."}
"#;

/// Closing instruction appended after the new user message.
pub const JSON_ONLY_REMINDER: &str = "Return ONLY a JSON object for the latest user message.";

/// Assemble the model input: instruction, prior turns, the new message.
pub fn router_messages(history: &Conversation, user_text: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(Message::system(ROUTER_SYSTEM_PROMPT));
    messages.extend(history.messages().iter().cloned());
    messages.push(Message::user(user_text));
    messages.push(Message::user(JSON_ONLY_REMINDER));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijira_core::intent::{Intent, RouterDecision};
    use minijira_core::message::Role;
    use std::collections::HashSet;

    #[test]
    fn prompt_names_every_intent() {
        for intent in Intent::ALL {
            assert!(
                ROUTER_SYSTEM_PROMPT.contains(&format!("\"{}\"", intent.as_str())),
                "{intent} missing from prompt"
            );
        }
    }

    #[test]
    fn every_example_decodes_and_covers_all_intents() {
        let examples: Vec<RouterDecision> = ROUTER_SYSTEM_PROMPT
            .lines()
            .filter(|l| l.starts_with("{\"intent\""))
            .map(|l| RouterDecision::decode(l).unwrap())
            .collect();

        let covered: HashSet<Intent> = examples.iter().map(|d| d.intent).collect();
        assert_eq!(covered.len(), Intent::ALL.len());
    }

    #[test]
    fn messages_are_ordered() {
        let history: Conversation =
            vec![Message::user("add user 1 Alice"), Message::assistant("The user is added.")].into();
        let messages = router_messages(&history, "show users");

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::System, Role::User, Role::Assistant, Role::User, Role::User]
        );
        assert_eq!(messages[3].content, "show users");
        assert_eq!(messages[4].content, JSON_ONLY_REMINDER);
    }
}
